//! Delivery status model and phrase classifier.

use serde::{Deserialize, Serialize};

/// Phrases that mean a package has already been delivered.
///
/// Kept strict so that "out for delivery" or "delivery estimate" never match.
const DELIVERED_PHRASES: [&str; 12] = [
    "has been delivered",
    "was delivered",
    "successfully delivered",
    "package delivered",
    "your package has arrived",
    "delivery complete",
    "parcel delivered",
    "order delivered",
    "your order has been delivered",
    "your parcel has been delivered",
    "item delivered",
    "signed for by",
];

/// Phrases that mean a package is with the driver today.
const OUT_FOR_DELIVERY_PHRASES: [&str; 8] = [
    "out for delivery",
    "arriving today",
    "on its way to you",
    "with our driver",
    "with the driver",
    "onboard for delivery",
    "on board for delivery",
    "will be delivered today",
];

/// Lifecycle status of a tracked package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PackageStatus {
    /// Shipped, not yet with the local driver.
    #[default]
    #[serde(rename = "In Transit")]
    InTransit,
    /// With the driver for delivery today.
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    /// Handed over.
    #[serde(rename = "Delivered")]
    Delivered,
    /// Carrier reported a delay.
    #[serde(rename = "Delayed")]
    Delayed,
    /// Shipment cancelled.
    #[serde(rename = "Cancelled")]
    Cancelled,
}

impl PackageStatus {
    /// All statuses, in display order.
    pub const ALL: [Self; 5] = [
        Self::InTransit,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Delayed,
        Self::Cancelled,
    ];

    /// Parse from database string representation.
    ///
    /// Matching is case-insensitive; anything unrecognised is `InTransit`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "out for delivery" | "out_for_delivery" => Self::OutForDelivery,
            "delivered" => Self::Delivered,
            "delayed" => Self::Delayed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::InTransit,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InTransit => "In Transit",
            Self::OutForDelivery => "Out for Delivery",
            Self::Delivered => "Delivered",
            Self::Delayed => "Delayed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Progress rank. A stored status is never replaced by a lower rank.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Cancelled => 0,
            Self::Delayed | Self::InTransit => 1,
            Self::OutForDelivery => 2,
            Self::Delivered => 3,
        }
    }

    /// Whether no further progress is expected.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Status implied by the two classifier flags. Delivered wins.
    #[must_use]
    pub const fn from_signals(signals: StatusSignals) -> Self {
        if signals.is_delivered {
            Self::Delivered
        } else if signals.is_out_for_delivery {
            Self::OutForDelivery
        } else {
            Self::InTransit
        }
    }
}

impl std::fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PackageStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Resolve the status to store when `candidate` arrives for a record at `existing`.
///
/// Equal ranks adopt the candidate, so `Delayed` and `InTransit` replace each other.
#[must_use]
pub const fn resolve_status(existing: PackageStatus, candidate: PackageStatus) -> PackageStatus {
    if candidate.rank() < existing.rank() {
        existing
    } else {
        candidate
    }
}

/// Delivery signals found in a message.
///
/// Both flags false means the status is unknown; downstream treats that as in transit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSignals {
    /// Message says the package was delivered.
    pub is_delivered: bool,
    /// Message says the package is out for delivery.
    pub is_out_for_delivery: bool,
}

/// Classify subject and body against the fixed phrase sets.
#[must_use]
pub fn classify(subject: &str, body: &str) -> StatusSignals {
    let text = format!("{subject} {body}").to_lowercase();
    StatusSignals {
        is_delivered: DELIVERED_PHRASES.iter().any(|p| text.contains(p)),
        is_out_for_delivery: OUT_FOR_DELIVERY_PHRASES.iter().any(|p| text.contains(p)),
    }
}
