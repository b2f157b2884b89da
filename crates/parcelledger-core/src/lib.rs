//! # parcelledger-core
//!
//! Shipment extraction and reconciliation engine for `ParcelLedger`.
//!
//! This crate provides:
//! - Carrier identification from sender and subject
//! - Tracking number, delivery date and status extraction from email text
//! - Reconciliation of fresh extractions with stored package state
//! - A past-due sweep for out-for-delivery packages
//! - Local storage (`SQLite`)
//! - Scan cycles over one or more email accounts

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod carrier;
pub mod config;
pub mod date;
mod error;
pub mod extract;
pub mod package;
pub mod scan;
pub mod status;

pub use carrier::{CarrierDefinition, CarrierRegistry};
pub use config::ScanConfig;
pub use date::resolve_delivery_date;
pub use error::{Error, Result};
pub use extract::{ExtractionResult, RawMessage, extract, extract_with};
pub use package::{
    PackageRecord, PackageRepository, PackageStats, promote_delivered, reconcile, sweep,
};
pub use scan::{
    CandidateMessage, MessageSource, PackageStore, ScanClock, ScanSummary, Scanner, SearchQuery,
};
pub use status::{PackageStatus, resolve_status};
