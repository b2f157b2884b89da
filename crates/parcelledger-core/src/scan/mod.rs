//! Scan cycles over email accounts.
//!
//! A [`Scanner`] pulls candidate messages from a [`MessageSource`], extracts
//! shipment facts, reconciles them into a [`PackageStore`] and finishes with
//! the past-due sweep.

mod scanner;
mod source;
mod store;

pub use scanner::{ScanClock, ScanSummary, Scanner};
pub use source::{CandidateMessage, MessageSource, SearchQuery};
pub use store::PackageStore;
