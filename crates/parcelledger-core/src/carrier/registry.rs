//! Built-in carrier table and sender/subject identification.

use std::sync::LazyLock;

use super::model::CarrierDefinition;

static BUILTIN: LazyLock<CarrierRegistry> = LazyLock::new(|| CarrierRegistry::new(builtin_carriers()));

/// Ordered set of carriers.
///
/// Order is a disambiguation priority: identification returns the first match,
/// so carriers whose name is a common word sit at the end.
#[derive(Debug, Clone)]
pub struct CarrierRegistry {
    carriers: Vec<CarrierDefinition>,
}

impl CarrierRegistry {
    /// Create a registry from carriers in priority order.
    #[must_use]
    pub const fn new(carriers: Vec<CarrierDefinition>) -> Self {
        Self { carriers }
    }

    /// The process-wide built-in registry, compiled on first use.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// First carrier whose domains match `sender` or whose name appears in `subject`.
    #[must_use]
    pub fn identify(&self, sender: &str, subject: &str) -> Option<&CarrierDefinition> {
        self.carriers.iter().find(|c| c.matches(sender, subject))
    }

    /// Look up a carrier by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CarrierDefinition> {
        self.carriers.iter().find(|c| c.name == name)
    }

    /// Iterate carriers in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &CarrierDefinition> {
        self.carriers.iter()
    }

    /// Number of carriers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.carriers.len()
    }

    /// Whether the registry has no carriers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.carriers.is_empty()
    }
}

fn builtin_carriers() -> Vec<CarrierDefinition> {
    vec![
        CarrierDefinition::new(
            "Australia Post",
            &["auspost.com.au", "australiapost.com.au"],
            &[
                r"(?i)tracking\s*(?:number|#|id)?[:\s]+([A-Z0-9]{13,})",
                r"(?i)shipment\s*(?:id|number)[:\s]+([A-Z0-9]{13,})",
                r"([A-Z]{2}\d{9}AU)",
            ],
            "https://auspost.com.au/mypost/track/#/details/",
        ),
        CarrierDefinition::new(
            "StarTrack",
            &["startrack.com.au"],
            &[
                r"(?i)(?:consignment|tracking).*?([A-Z0-9]{10,20})",
                r"(?i)(?:reference|shipment).*?(\d{10,})",
            ],
            "https://startrack.com.au/track-trace/#/",
        ),
        CarrierDefinition::new(
            "Aramex",
            &["aramex.com"],
            &[
                r"(?i)Tracking\s*number:\s*([A-Z]{2}\d+)",
                r"(?i)(?:waybill|awb|tracking).*?([A-Z]{2}\d{10,})",
                r"(?i)(?:waybill|awb|tracking).*?(\d{11,})",
            ],
            "https://www.aramex.com/au/track/results?mode=0&ShipmentNumber=",
        ),
        CarrierDefinition::new(
            "Shippit",
            &["shippit.com"],
            &[
                r"(?i)app\.shippit\.com/tracking/([a-z0-9]+)",
                r"(?i)Tracking\s*number:\s*([A-Z0-9]+)",
            ],
            "https://app.shippit.com/tracking/",
        ),
        CarrierDefinition::new(
            "CouriersPlease",
            &["couriersplease.com.au"],
            &[r"(?i)(?:consignment|tracking).*?([A-Z0-9]{10,})"],
            "https://www.couriersplease.com.au/tools-track-trace-item/",
        ),
        CarrierDefinition::new(
            "DHL Express",
            &["dhl.com", "dhl.com.au"],
            &[r"(?i)(?:waybill|tracking).*?(\d{10,11})", r"([A-Z0-9]{10})"],
            "https://www.dhl.com/au-en/home/tracking/tracking-express.html?submit=1&tracking-id=",
        ),
        CarrierDefinition::new(
            "FedEx",
            &["fedex.com"],
            &[r"(?i)(?:tracking|shipment).*?(\d{12,14})"],
            "https://www.fedex.com/fedextrack/?trknbr=",
        ),
        CarrierDefinition::new(
            "TNT",
            &["tnt.com"],
            &[
                r"(?i)consignment.*?(\d{9,})",
                r"(?i)(?:tracking|reference).*?([A-Z0-9]{9,})",
            ],
            "https://www.tnt.com/express/en_au/site/shipping-tools/tracking.html?searchType=con&cons=",
        ),
        CarrierDefinition::new(
            "Sendle",
            &["sendle.com"],
            &[r"(?i)(?:reference|tracking).*?([A-Z0-9]{20,})"],
            "https://track.sendle.com/tracking?ref=",
        ),
        CarrierDefinition::new(
            "Amazon",
            &["amazon.com", "amazon.com.au", "shipment-tracking@amazon"],
            &[
                r"(?i)Order\s*#\s*(\d{3}-\d{7}-\d{7})",
                r"(?i)orderIdP(\d-\d{7}-\d{7})",
                r"TBA\d{12}",
                r"1Z[A-Z0-9]{16}",
                r"(?i)tracking\s*(?:id|number)[:\s]+([A-Z0-9]{10,})",
            ],
            "https://www.amazon.com.au/progress-tracker/package/",
        ),
        CarrierDefinition::new(
            "AliExpress",
            &["aliexpress.com"],
            &[
                r"(?i)tracking\s*(?:number|code)[:\s]+([A-Z]{2}\d{9}[A-Z]{2})",
                r"([A-Z]{2}\d{9}[A-Z]{2})",
            ],
            "https://track.aliexpress.com/logisticsdetail.htm?tradeId=",
        ),
        CarrierDefinition::new(
            "eBay",
            &["ebay.com", "ebay.com.au"],
            &[
                r"(?i)tracking\s*(?:number|#)?[:\s]+([A-Z0-9]{10,})",
                r"(?i)shipment.*?([A-Z0-9]{10,})",
                r"(?i)item\s*#(\d{12})",
            ],
            "https://www.ebay.com.au/sh/track?tn=",
        ),
        // "toll" shows up in ordinary subjects, keep it last.
        CarrierDefinition::new(
            "Toll",
            &["toll.com.au", "tollgroup.com"],
            &[
                r"(?i)consignment\s*(?:number|#)?[:\s]+([A-Z0-9]{10,})",
                r"(?i)tracking.*?(\d{10,})",
            ],
            "https://www.toll.com.au/track-n-trace?id=",
        ),
    ]
}
