//! Carrier definition model.

use regex::Regex;

/// Words that over-eager patterns capture from surrounding prose.
const STOP_WORDS: [&str; 4] = ["tracking", "shipment", "delivery", "notification"];

/// Shortest string accepted as a tracking number.
pub const MIN_TRACKING_LEN: usize = 8;

/// A carrier known to the registry.
///
/// Patterns are tried in order; the first accepted candidate wins.
#[derive(Debug, Clone)]
pub struct CarrierDefinition {
    /// Display name, unique within a registry.
    pub name: &'static str,
    /// Sender-address substrings, matched case-insensitively.
    pub domains: &'static [&'static str],
    /// Tracking-number patterns. Capture group 1 is used when present.
    pub patterns: Vec<Regex>,
    /// Tracking page URL; the tracking number is appended.
    pub tracking_url: &'static str,
}

impl CarrierDefinition {
    /// Build a definition, skipping any pattern that fails to compile.
    #[must_use]
    pub fn new(
        name: &'static str,
        domains: &'static [&'static str],
        patterns: &[&str],
        tracking_url: &'static str,
    ) -> Self {
        let compiled = patterns
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!("Skipping invalid pattern for {name}: {e}");
                    None
                }
            })
            .collect();

        Self {
            name,
            domains,
            patterns: compiled,
            tracking_url,
        }
    }

    /// Whether a message from `sender` with `subject` belongs to this carrier.
    #[must_use]
    pub fn matches(&self, sender: &str, subject: &str) -> bool {
        let sender = sender.to_lowercase();
        if self
            .domains
            .iter()
            .any(|d| sender.contains(&d.to_lowercase()))
        {
            return true;
        }
        subject
            .to_lowercase()
            .contains(&self.name.to_lowercase())
    }

    /// Find the tracking number in `text`, if any pattern yields an acceptable one.
    #[must_use]
    pub fn find_tracking_number(&self, text: &str) -> Option<String> {
        self.patterns.iter().find_map(|re| {
            let caps = re.captures(text)?;
            let candidate = caps.get(1).or_else(|| caps.get(0))?.as_str();
            is_plausible_tracking_number(candidate).then(|| candidate.to_string())
        })
    }

    /// Tracking page for a tracking number.
    #[must_use]
    pub fn tracking_url_for(&self, tracking_number: &str) -> String {
        format!("{}{tracking_number}", self.tracking_url)
    }
}

/// Reject short candidates and prose words caught by catch-all patterns.
#[must_use]
pub fn is_plausible_tracking_number(candidate: &str) -> bool {
    candidate.chars().count() >= MIN_TRACKING_LEN
        && !STOP_WORDS
            .iter()
            .any(|w| candidate.eq_ignore_ascii_case(w))
}
