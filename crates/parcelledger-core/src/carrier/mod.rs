//! Carrier registry and identification.
//!
//! A message is attributed to the first carrier in registry order whose
//! sender domains match the `From` address, or whose name appears in the
//! subject. Tracking-number patterns are carrier-specific, so nothing else is
//! extracted from a message without a carrier.

mod model;
mod registry;

pub use model::{CarrierDefinition, MIN_TRACKING_LEN, is_plausible_tracking_number};
pub use registry::CarrierRegistry;
