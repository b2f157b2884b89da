//! Merging a fresh extraction into stored package state.
//!
//! The merge is a pure function of its inputs. Status never regresses: when a
//! later email repeats stale "in transit" language for a package that is
//! already out for delivery, the stored status and its delivery estimate are
//! kept, since the earlier and more specific update is the authoritative one.

use chrono::{DateTime, Utc};

use super::model::PackageRecord;
use crate::extract::ExtractionResult;
use crate::status::{PackageStatus, resolve_status};

/// Combine `extraction` with the stored record for its tracking number.
///
/// Returns `None` when the extraction has no carrier or tracking number.
/// `now` stamps `created_at`/`updated_at`; for a fixed `now` the merge is
/// idempotent.
#[must_use]
pub fn reconcile(
    extraction: &ExtractionResult,
    source_account: Option<&str>,
    existing: Option<&PackageRecord>,
    now: DateTime<Utc>,
) -> Option<PackageRecord> {
    let (carrier, tracking_number) = extraction.key()?;

    let candidate = extraction.status();
    // An out-for-delivery message without a date means today.
    let candidate_date = extraction.estimated_delivery.or_else(|| {
        (candidate == PackageStatus::OutForDelivery).then(|| extraction.sent_at.date_naive())
    });
    let sent_at = extraction.sent_at.with_timezone(&Utc);
    let confirmed_at = (candidate == PackageStatus::Delivered).then_some(sent_at);

    let Some(existing) = existing else {
        return Some(PackageRecord {
            id: None,
            tracking_number: tracking_number.to_string(),
            carrier: carrier.to_string(),
            status: candidate,
            estimated_delivery: candidate_date,
            item_description: extraction.item_description.clone(),
            email_subject: extraction.subject.clone(),
            email_date: extraction.sent_at,
            tracking_url: extraction.tracking_url.clone(),
            source_account: source_account.map(ToString::to_string),
            delivered_at: confirmed_at,
            created_at: now,
            updated_at: now,
        });
    };

    let status = resolve_status(existing.status, candidate);
    let estimated_delivery = if candidate.rank() < existing.status.rank() {
        existing.estimated_delivery
    } else if existing.status == PackageStatus::Delivered {
        // Once delivered the estimate is history.
        existing.estimated_delivery.or(candidate_date)
    } else {
        candidate_date
    };

    Some(PackageRecord {
        id: existing.id,
        tracking_number: existing.tracking_number.clone(),
        carrier: carrier.to_string(),
        status,
        estimated_delivery,
        item_description: extraction.item_description.clone(),
        email_subject: extraction.subject.clone(),
        email_date: extraction.sent_at,
        tracking_url: extraction.tracking_url.clone(),
        source_account: existing
            .source_account
            .clone()
            .or_else(|| source_account.map(ToString::to_string)),
        delivered_at: existing.delivered_at.or(confirmed_at),
        created_at: existing.created_at,
        updated_at: now,
    })
}
