//! Per-message extraction pipeline.
//!
//! Carrier identification, tracking-number matching, date resolution and
//! status classification run in that order over one message. Everything here
//! is pure: no I/O, no clock, no shared state.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::carrier::CarrierRegistry;
use crate::date::resolve_with_rule;
use crate::status::{PackageStatus, StatusSignals, classify};

/// Longest item description kept before truncation.
const MAX_DESCRIPTION_CHARS: usize = 100;

static RE_NOISE_WORDS: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)tracking|shipment|delivery|notification|confirmation|delivered").ok()
});

static RE_PUNCTUATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").ok());

/// A message as handed over by the email source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Provider message id.
    pub id: String,
    /// Subject line.
    pub subject: String,
    /// Body text. May be a short snippet when the full body was not fetched.
    pub body: String,
    /// `From` address, possibly with a display name.
    pub sender: String,
    /// When the message was sent, in the sender's offset.
    pub sent_at: DateTime<FixedOffset>,
    /// Mailbox the message was found in.
    pub account: String,
}

impl RawMessage {
    /// Calendar date the message was sent, used as the anchor for relative dates.
    #[must_use]
    pub fn sent_date(&self) -> NaiveDate {
        self.sent_at.date_naive()
    }

    /// Subject and body joined the way the patterns expect.
    #[must_use]
    pub fn combined_text(&self) -> String {
        format!("{}\n{}", self.subject, self.body)
    }
}

/// Facts extracted from one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Identified carrier name.
    pub carrier: Option<String>,
    /// Accepted tracking number.
    pub tracking_number: Option<String>,
    /// Resolved delivery estimate.
    pub estimated_delivery: Option<NaiveDate>,
    /// Carrier tracking page for this number.
    pub tracking_url: Option<String>,
    /// Message says the package was delivered.
    pub is_delivered: bool,
    /// Message says the package is out for delivery.
    pub is_out_for_delivery: bool,
    /// Subject of the source message.
    pub subject: String,
    /// Sent time of the source message.
    pub sent_at: DateTime<FixedOffset>,
    /// Short human description derived from the subject.
    pub item_description: String,
}

impl ExtractionResult {
    /// Result for a message that matched no carrier.
    fn empty(message: &RawMessage) -> Self {
        Self {
            carrier: None,
            tracking_number: None,
            estimated_delivery: None,
            tracking_url: None,
            is_delivered: false,
            is_out_for_delivery: false,
            subject: message.subject.clone(),
            sent_at: message.sent_at,
            item_description: String::new(),
        }
    }

    /// Carrier and tracking number, when both were found.
    #[must_use]
    pub fn key(&self) -> Option<(&str, &str)> {
        Some((self.carrier.as_deref()?, self.tracking_number.as_deref()?))
    }

    /// Status implied by this message alone.
    #[must_use]
    pub const fn status(&self) -> PackageStatus {
        PackageStatus::from_signals(StatusSignals {
            is_delivered: self.is_delivered,
            is_out_for_delivery: self.is_out_for_delivery,
        })
    }
}

/// Extract shipment facts from a message using the built-in carriers.
#[must_use]
pub fn extract(message: &RawMessage) -> ExtractionResult {
    extract_with(CarrierRegistry::builtin(), message)
}

/// Extract shipment facts from a message using `registry`.
#[must_use]
pub fn extract_with(registry: &CarrierRegistry, message: &RawMessage) -> ExtractionResult {
    let mut result = ExtractionResult::empty(message);

    let Some(carrier) = registry.identify(&message.sender, &message.subject) else {
        return result;
    };
    result.carrier = Some(carrier.name.to_string());
    result.item_description = describe_item(&message.subject, carrier.name);

    let text = message.combined_text();
    let Some(tracking_number) = carrier.find_tracking_number(&text) else {
        tracing::debug!(carrier = carrier.name, "No tracking number in {:?}", message.subject);
        return result;
    };

    if let Some((rule, date)) = resolve_with_rule(&text, message.sent_date()) {
        tracing::debug!(rule, %date, "Resolved delivery date for {tracking_number}");
        result.estimated_delivery = Some(date);
    }

    let signals = classify(&message.subject, &message.body);
    result.is_delivered = signals.is_delivered;
    result.is_out_for_delivery = signals.is_out_for_delivery;
    result.tracking_url = Some(carrier.tracking_url_for(&tracking_number));
    result.tracking_number = Some(tracking_number);
    result
}

/// Derive a short description from a notification subject.
///
/// Boilerplate words and punctuation are stripped; an empty remainder falls
/// back to naming the carrier.
#[must_use]
pub fn describe_item(subject: &str, carrier: &str) -> String {
    let without_words = RE_NOISE_WORDS
        .as_ref()
        .map_or_else(|| subject.to_string(), |re| re.replace_all(subject, "").into_owned());
    let cleaned = RE_PUNCTUATION
        .as_ref()
        .map_or_else(
            || without_words.clone(),
            |re| re.replace_all(&without_words, "").into_owned(),
        );
    let trimmed = cleaned.trim();

    if trimmed.is_empty() {
        return format!("Package from {carrier}");
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_CHARS {
        let head: String = trimmed.chars().take(MAX_DESCRIPTION_CHARS).collect();
        return format!("{head}...");
    }
    trimmed.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::carrier::CarrierDefinition;

    fn message(sender: &str, subject: &str, body: &str, sent: &str) -> RawMessage {
        RawMessage {
            id: "m1".into(),
            subject: subject.into(),
            body: body.into(),
            sender: sender.into(),
            sent_at: DateTime::parse_from_rfc3339(sent).unwrap(),
            account: "me@example.com".into(),
        }
    }

    #[test]
    fn test_amazon_weekday_scenario() {
        let msg = message(
            "shipment-tracking@amazon.com.au",
            "Your package has shipped",
            "Order # 123-4567890-1234567, arriving Friday",
            "2024-01-01T09:00:00+11:00",
        );
        let result = extract(&msg);

        assert_eq!(result.carrier.as_deref(), Some("Amazon"));
        assert_eq!(result.tracking_number.as_deref(), Some("123-4567890-1234567"));
        assert_eq!(result.estimated_delivery, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(result.status(), PackageStatus::InTransit);
        assert_eq!(
            result.tracking_url.as_deref(),
            Some("https://www.amazon.com.au/progress-tracker/package/123-4567890-1234567")
        );
    }

    #[test]
    fn test_bare_amazon_sender_is_identified() {
        let msg = message(
            "shipment-tracking@amazon",
            "Your package has shipped",
            "Order # 123-4567890-1234567, arriving Friday",
            "2024-01-01T09:00:00+00:00",
        );
        assert_eq!(extract(&msg).carrier.as_deref(), Some("Amazon"));
    }

    #[test]
    fn test_no_carrier_short_circuits() {
        let msg = message(
            "friend@example.com",
            "Delivered today!",
            "Tracking number: ABCDEFGHIJKLMNOP",
            "2024-01-01T09:00:00+00:00",
        );
        let result = extract(&msg);
        assert_eq!(result.carrier, None);
        assert_eq!(result.tracking_number, None);
        assert_eq!(result.estimated_delivery, None);
        assert!(!result.is_delivered);
        assert!(result.key().is_none());
    }

    #[test]
    fn test_carrier_without_tracking_number() {
        let msg = message(
            "news@fedex.com",
            "Shipping tips",
            "Ship smarter this season",
            "2024-01-01T09:00:00+00:00",
        );
        let result = extract(&msg);
        assert_eq!(result.carrier.as_deref(), Some("FedEx"));
        assert_eq!(result.tracking_number, None);
        assert_eq!(result.tracking_url, None);
        assert!(result.key().is_none());
    }

    #[test]
    fn test_delivered_message() {
        let msg = message(
            "noreply@auspost.com.au",
            "Your parcel has been delivered",
            "Tracking number: 33ABC123456789AU\nSigned for by: J SMITH",
            "2024-03-04T15:30:00+11:00",
        );
        let result = extract(&msg);
        assert_eq!(result.tracking_number.as_deref(), Some("33ABC123456789AU"));
        assert!(result.is_delivered);
        assert_eq!(result.status(), PackageStatus::Delivered);
    }

    #[test]
    fn test_sent_date_uses_sender_offset() {
        // 23:30 UTC on the 1st is already the 2nd in Sydney.
        let msg = message(
            "noreply@auspost.com.au",
            "Arriving today",
            "Tracking number: 33ABC123456789AU",
            "2024-01-02T10:30:00+11:00",
        );
        assert_eq!(
            extract(&msg).estimated_delivery,
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
    }

    #[test]
    fn test_extract_with_custom_registry() {
        let registry = CarrierRegistry::new(vec![CarrierDefinition::new(
            "Local Courier",
            &["localcourier.test"],
            &[r"LC-\d{8}"],
            "https://localcourier.test/t/",
        )]);
        let msg = message(
            "bot@localcourier.test",
            "On its way",
            "Ref LC-12345678 is on its way to you",
            "2024-05-06T08:00:00+00:00",
        );
        let result = extract_with(&registry, &msg);
        assert_eq!(result.tracking_number.as_deref(), Some("LC-12345678"));
        assert!(result.is_out_for_delivery);
        assert_eq!(result.status(), PackageStatus::OutForDelivery);
    }

    #[test]
    fn test_describe_item_strips_boilerplate() {
        assert_eq!(
            describe_item("Shipment confirmation: Blue Kettle!", "Amazon"),
            "Blue Kettle"
        );
    }

    #[test]
    fn test_describe_item_falls_back_to_carrier() {
        assert_eq!(
            describe_item("Delivery Notification", "Toll"),
            "Package from Toll"
        );
    }

    #[test]
    fn test_describe_item_truncates() {
        let subject = "a".repeat(150);
        let description = describe_item(&subject, "eBay");
        assert_eq!(description.chars().count(), MAX_DESCRIPTION_CHARS + 3);
        assert!(description.ends_with("..."));
    }
}
