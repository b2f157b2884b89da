//! Email source seam.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::extract::RawMessage;

/// Provider search terms that catch shipping notifications.
const SEARCH_TERMS: &str = "(tracking OR delivery OR shipped OR shipment OR delivered)";

/// Which messages to ask the source for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Only messages newer than this many days.
    pub days_back: u32,
    /// Upper bound on messages returned per account.
    pub max_results: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            days_back: 90,
            max_results: 50,
        }
    }
}

impl SearchQuery {
    /// Provider query string, in Gmail search syntax.
    #[must_use]
    pub fn query_string(&self) -> String {
        format!("newer_than:{}d {SEARCH_TERMS}", self.days_back)
    }
}

/// A message listing entry. Headers are cheap; the body may be a snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMessage {
    /// Provider message id, used to fetch the full body.
    pub id: String,
    /// Subject line.
    pub subject: String,
    /// `From` address.
    #[serde(rename = "from")]
    pub sender: String,
    /// Sent time.
    #[serde(rename = "date")]
    pub sent_at: DateTime<FixedOffset>,
    /// Short body preview.
    #[serde(default)]
    pub snippet: String,
}

impl CandidateMessage {
    /// Turn the listing entry into a raw message with `body` (or the snippet if empty).
    #[must_use]
    pub fn into_raw(self, account: &str, body: Option<String>) -> RawMessage {
        let body = body.filter(|b| !b.trim().is_empty()).unwrap_or(self.snippet);
        RawMessage {
            id: self.id,
            subject: self.subject,
            body,
            sender: self.sender,
            sent_at: self.sent_at,
            account: account.to_string(),
        }
    }
}

/// Where candidate messages come from.
///
/// Failures are per account: the scanner logs them and moves on.
#[allow(async_fn_in_trait)]
pub trait MessageSource {
    /// List messages in `account` matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be searched.
    async fn fetch_candidate_messages(
        &self,
        account: &str,
        query: &SearchQuery,
    ) -> Result<Vec<CandidateMessage>>;

    /// Fetch the full body of one message.
    ///
    /// Only called for messages whose sender or subject matched a carrier.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be fetched.
    async fn fetch_full_body(&self, message_id: &str, account: &str) -> Result<String>;
}
