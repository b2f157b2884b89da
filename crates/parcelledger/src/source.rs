//! Message source backed by a JSON mailbox export.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use parcelledger_core::{CandidateMessage, Error, MessageSource, SearchQuery};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Export {
    accounts: BTreeMap<String, Vec<ExportedMessage>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ExportedMessage {
    #[serde(flatten)]
    candidate: CandidateMessage,
    #[serde(default)]
    body: Option<String>,
}

/// Accounts and their messages, read from
/// `{"accounts": {"<account>": [{"id", "subject", "from", "date", "snippet", "body"}]}}`.
#[derive(Debug)]
pub struct JsonMessageSource {
    accounts: BTreeMap<String, Vec<ExportedMessage>>,
}

impl JsonMessageSource {
    /// Parse an export from a JSON string.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let export: Export = serde_json::from_str(json)?;
        Ok(Self {
            accounts: export.accounts,
        })
    }

    /// Read an export file.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    /// Account names in the export, sorted.
    pub fn account_names(&self) -> Vec<String> {
        self.accounts.keys().cloned().collect()
    }
}

impl MessageSource for JsonMessageSource {
    async fn fetch_candidate_messages(
        &self,
        account: &str,
        query: &SearchQuery,
    ) -> parcelledger_core::Result<Vec<CandidateMessage>> {
        let messages = self
            .accounts
            .get(account)
            .ok_or_else(|| Error::Source(format!("account {account} not in export")))?;

        Ok(messages
            .iter()
            .take(query.max_results as usize)
            .map(|m| m.candidate.clone())
            .collect())
    }

    async fn fetch_full_body(
        &self,
        message_id: &str,
        account: &str,
    ) -> parcelledger_core::Result<String> {
        self.accounts
            .get(account)
            .and_then(|messages| messages.iter().find(|m| m.candidate.id == message_id))
            .and_then(|m| m.body.clone())
            .ok_or_else(|| Error::Source(format!("no body for message {message_id}")))
    }
}
