//! Tracked packages: model, reconciliation, past-due sweep and storage.
//!
//! A package record is created the first time a message yields both a
//! carrier and a tracking number, and every later message for the same
//! tracking number is merged into it with [`reconcile`]. The engine never
//! deletes records.

mod model;
mod reconcile;
mod repository;
mod sweep;

pub use model::{PackageRecord, PackageStats};
pub use reconcile::reconcile;
pub use repository::PackageRepository;
pub use sweep::{is_past_due, promote_delivered, sweep};
