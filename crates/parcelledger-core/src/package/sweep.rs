//! Past-due promotion of out-for-delivery packages.
//!
//! A package that was out for delivery and whose estimate has passed is
//! almost certainly delivered even if no confirmation email arrived. In-transit
//! estimates are too unreliable for this, so only `OutForDelivery` is promoted.

use chrono::{DateTime, NaiveDate, Utc};

use super::model::PackageRecord;
use crate::status::PackageStatus;

/// Tracking numbers of records that should be promoted to delivered on `today`.
#[must_use]
pub fn sweep(records: &[PackageRecord], today: NaiveDate) -> Vec<String> {
    records
        .iter()
        .filter(|record| is_past_due(record, today))
        .map(|record| record.tracking_number.clone())
        .collect()
}

/// Out for delivery with an estimate strictly before `today`.
#[must_use]
pub fn is_past_due(record: &PackageRecord, today: NaiveDate) -> bool {
    record.status == PackageStatus::OutForDelivery
        && record.estimated_delivery.is_some_and(|date| date < today)
}

/// Mark `record` delivered at `now`.
///
/// The delivery time is the sweep time, not the estimate: the actual handover
/// time is unknown. An existing `delivered_at` is kept.
#[must_use]
pub fn promote_delivered(record: &PackageRecord, now: DateTime<Utc>) -> PackageRecord {
    PackageRecord {
        status: PackageStatus::Delivered,
        delivered_at: record.delivered_at.or(Some(now)),
        updated_at: now,
        ..record.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, Days, TimeZone};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn record(tracking_number: &str, status: PackageStatus, estimate: Option<NaiveDate>) -> PackageRecord {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        PackageRecord {
            id: Some(1),
            tracking_number: tracking_number.into(),
            carrier: "Toll".into(),
            status,
            estimated_delivery: estimate,
            item_description: "Parcel".into(),
            email_subject: "Update".into(),
            email_date: DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap(),
            tracking_url: None,
            source_account: None,
            delivered_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_out_for_delivery_yesterday_is_promoted() {
        let yesterday = today().checked_sub_days(Days::new(1));
        let records = vec![
            record("OFD0000001", PackageStatus::OutForDelivery, yesterday),
            record("TRANSIT0001", PackageStatus::InTransit, yesterday),
        ];
        assert_eq!(sweep(&records, today()), vec!["OFD0000001".to_string()]);
    }

    #[test]
    fn test_estimate_today_is_not_past_due() {
        let r = record("OFD0000001", PackageStatus::OutForDelivery, Some(today()));
        assert!(!is_past_due(&r, today()));
    }

    #[test]
    fn test_missing_estimate_is_not_past_due() {
        let r = record("OFD0000001", PackageStatus::OutForDelivery, None);
        assert!(!is_past_due(&r, today()));
    }

    #[test]
    fn test_other_statuses_are_ignored() {
        let long_ago = NaiveDate::from_ymd_opt(2023, 6, 1);
        for status in [
            PackageStatus::InTransit,
            PackageStatus::Delayed,
            PackageStatus::Delivered,
            PackageStatus::Cancelled,
        ] {
            assert!(!is_past_due(&record("X00000001", status, long_ago), today()));
        }
    }

    #[test]
    fn test_promote_delivered_stamps_now() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 6, 0, 0).unwrap();
        let before = record("OFD0000001", PackageStatus::OutForDelivery, today().checked_sub_days(Days::new(2)));
        let after = promote_delivered(&before, now);

        assert_eq!(after.status, PackageStatus::Delivered);
        assert_eq!(after.delivered_at, Some(now));
        assert_eq!(after.updated_at, now);
        assert_eq!(after.estimated_delivery, before.estimated_delivery);
        assert_eq!(after.created_at, before.created_at);
    }
}
