//! Package data models.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::status::PackageStatus;

/// A tracked package, keyed by tracking number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Database id, `None` until persisted.
    pub id: Option<i64>,
    /// Carrier-assigned tracking number (unique).
    pub tracking_number: String,
    /// Carrier name.
    pub carrier: String,
    /// Current status. Never moves to a lower rank through reconciliation.
    pub status: PackageStatus,
    /// Latest accepted delivery estimate.
    pub estimated_delivery: Option<NaiveDate>,
    /// Short description derived from the latest subject.
    pub item_description: String,
    /// Subject of the latest message for this package.
    pub email_subject: String,
    /// Sent time of the latest message for this package.
    pub email_date: DateTime<FixedOffset>,
    /// Carrier tracking page.
    pub tracking_url: Option<String>,
    /// Mailbox the package was first seen in.
    pub source_account: Option<String>,
    /// When the package was first known to be delivered.
    pub delivered_at: Option<DateTime<Utc>>,
    /// First reconciliation time.
    pub created_at: DateTime<Utc>,
    /// Last reconciliation or status change.
    pub updated_at: DateTime<Utc>,
}

impl PackageRecord {
    /// Whether the package is neither delivered nor cancelled.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Aggregate counts over stored packages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageStats {
    /// All packages.
    pub total: u32,
    /// Packages not delivered or cancelled.
    pub active: u32,
    /// Delivered packages.
    pub delivered: u32,
}
