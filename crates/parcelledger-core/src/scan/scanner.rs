//! One scan cycle: search, extract, reconcile, store, sweep.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::source::{MessageSource, SearchQuery};
use super::store::PackageStore;
use crate::Result;
use crate::carrier::CarrierRegistry;
use crate::extract::{ExtractionResult, extract_with};
use crate::package::{promote_delivered, reconcile, sweep};
use crate::status::PackageStatus;

/// Time reference for a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanClock {
    /// Stamp for created/updated/delivered times.
    pub now: DateTime<Utc>,
    /// Calendar day used for the past-due sweep.
    pub today: NaiveDate,
}

impl ScanClock {
    /// Wall clock, with `today` taken in the local timezone.
    #[must_use]
    pub fn system() -> Self {
        let now = Utc::now();
        Self {
            now,
            today: now.with_timezone(&Local).date_naive(),
        }
    }

    /// A fixed instant, with `today` as its UTC date.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            today: now.date_naive(),
        }
    }
}

/// What a cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Accounts searched successfully.
    pub accounts_scanned: u32,
    /// Candidate messages looked at.
    pub messages_scanned: u32,
    /// Messages from no known carrier.
    pub skipped_no_carrier: u32,
    /// Carrier messages without a usable tracking number.
    pub skipped_no_tracking: u32,
    /// New package records.
    pub records_created: u32,
    /// Existing package records merged with a newer message.
    pub records_updated: u32,
    /// Records that became delivered because a message said so.
    pub delivered_from_messages: u32,
    /// Out-for-delivery records promoted by the past-due sweep.
    pub auto_promoted: u32,
    /// Accounts whose search failed.
    pub failed_accounts: Vec<String>,
    /// Tracking numbers whose store read or write failed.
    pub failed_writes: Vec<String>,
}

impl ScanSummary {
    /// Whether any account or write failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed_accounts.is_empty() || !self.failed_writes.is_empty()
    }
}

/// Runs scan cycles against a message source and a package store.
pub struct Scanner<'a, S, P> {
    source: &'a S,
    store: &'a P,
    registry: &'a CarrierRegistry,
    query: SearchQuery,
}

impl<'a, S: MessageSource, P: PackageStore> Scanner<'a, S, P> {
    /// Create a scanner using the built-in carriers.
    #[must_use]
    pub fn new(source: &'a S, store: &'a P, query: SearchQuery) -> Self {
        Self::with_registry(source, store, CarrierRegistry::builtin(), query)
    }

    /// Create a scanner using a custom carrier registry.
    #[must_use]
    pub const fn with_registry(
        source: &'a S,
        store: &'a P,
        registry: &'a CarrierRegistry,
        query: SearchQuery,
    ) -> Self {
        Self {
            source,
            store,
            registry,
            query,
        }
    }

    /// Scan every account, then promote past-due out-for-delivery records.
    ///
    /// A failing account is logged and skipped. A failing store write skips
    /// that one message. Messages are handled one at a time, so each
    /// tracking number's read, merge and write finish before the next begins.
    pub async fn run_cycle(&self, accounts: &[String], clock: ScanClock) -> ScanSummary {
        let mut summary = ScanSummary::default();

        for account in accounts {
            match self.scan_account(account, clock, &mut summary).await {
                Ok(()) => summary.accounts_scanned += 1,
                Err(e) => {
                    warn!("Scanning {account} failed: {e}");
                    summary.failed_accounts.push(account.clone());
                }
            }
        }

        self.sweep_past_due(clock, &mut summary).await;

        info!(
            accounts = summary.accounts_scanned,
            messages = summary.messages_scanned,
            created = summary.records_created,
            updated = summary.records_updated,
            delivered = summary.delivered_from_messages,
            promoted = summary.auto_promoted,
            "Scan cycle complete"
        );
        summary
    }

    async fn scan_account(
        &self,
        account: &str,
        clock: ScanClock,
        summary: &mut ScanSummary,
    ) -> Result<()> {
        info!("Searching {account}: {}", self.query.query_string());
        let candidates = self
            .source
            .fetch_candidate_messages(account, &self.query)
            .await?;
        info!("Found {} candidate messages in {account}", candidates.len());

        for candidate in candidates {
            summary.messages_scanned += 1;

            let body = if self
                .registry
                .identify(&candidate.sender, &candidate.subject)
                .is_some()
            {
                match self.source.fetch_full_body(&candidate.id, account).await {
                    Ok(body) => Some(body),
                    Err(e) => {
                        warn!("Using snippet for {}: {e}", candidate.id);
                        None
                    }
                }
            } else {
                None
            };

            let message = candidate.into_raw(account, body);
            let extraction = extract_with(self.registry, &message);

            if extraction.carrier.is_none() {
                summary.skipped_no_carrier += 1;
                continue;
            }
            if extraction.tracking_number.is_none() {
                debug!("No tracking number in {}", message.id);
                summary.skipped_no_tracking += 1;
                continue;
            }

            self.record(&extraction, account, clock, summary).await;
        }

        Ok(())
    }

    async fn record(
        &self,
        extraction: &ExtractionResult,
        account: &str,
        clock: ScanClock,
        summary: &mut ScanSummary,
    ) {
        let Some((_, tracking_number)) = extraction.key() else {
            return;
        };

        let existing = match self.store.get_record(tracking_number).await {
            Ok(existing) => existing,
            Err(e) => {
                warn!("Reading {tracking_number} failed: {e}");
                summary.failed_writes.push(tracking_number.to_string());
                return;
            }
        };

        let Some(merged) = reconcile(extraction, Some(account), existing.as_ref(), clock.now)
        else {
            return;
        };

        if let Err(e) = self.store.upsert_record(&merged).await {
            warn!("Saving {tracking_number} failed: {e}");
            summary.failed_writes.push(tracking_number.to_string());
            return;
        }

        let was_delivered = existing
            .as_ref()
            .is_some_and(|r| r.status == PackageStatus::Delivered);
        if merged.status == PackageStatus::Delivered && !was_delivered {
            summary.delivered_from_messages += 1;
        }
        if existing.is_some() {
            summary.records_updated += 1;
        } else {
            summary.records_created += 1;
        }
        info!(
            carrier = merged.carrier,
            status = %merged.status,
            "Saved package {tracking_number}"
        );
    }

    async fn sweep_past_due(&self, clock: ScanClock, summary: &mut ScanSummary) {
        let active = match self.store.list_active().await {
            Ok(active) => active,
            Err(e) => {
                warn!("Listing active packages failed, skipping sweep: {e}");
                return;
            }
        };

        for tracking_number in sweep(&active, clock.today) {
            let Some(record) = active.iter().find(|r| r.tracking_number == tracking_number)
            else {
                continue;
            };
            let promoted = promote_delivered(record, clock.now);
            match self.store.upsert_record(&promoted).await {
                Ok(_) => {
                    info!("Auto-marked {tracking_number} as delivered");
                    summary.auto_promoted += 1;
                }
                Err(e) => {
                    warn!("Promoting {tracking_number} failed: {e}");
                    summary.failed_writes.push(tracking_number);
                }
            }
        }
    }
}
