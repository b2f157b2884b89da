//! Record store seam.

use crate::Result;
use crate::package::{PackageRecord, PackageRepository};

/// Keyed storage for package records.
///
/// The scanner performs get, reconcile and upsert for one tracking number
/// before touching the next message, so an implementation sees at most one
/// writer per key during a cycle.
#[allow(async_fn_in_trait)]
pub trait PackageStore {
    /// Look up the record for a tracking number.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn get_record(&self, tracking_number: &str) -> Result<Option<PackageRecord>>;

    /// Insert or replace the record with this tracking number.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn upsert_record(&self, record: &PackageRecord) -> Result<PackageRecord>;

    /// Records that are neither delivered nor cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn list_active(&self) -> Result<Vec<PackageRecord>>;
}

impl PackageStore for PackageRepository {
    async fn get_record(&self, tracking_number: &str) -> Result<Option<PackageRecord>> {
        self.get(tracking_number).await
    }

    async fn upsert_record(&self, record: &PackageRecord) -> Result<PackageRecord> {
        self.upsert(record).await
    }

    async fn list_active(&self) -> Result<Vec<PackageRecord>> {
        Self::list_active(self).await
    }
}
