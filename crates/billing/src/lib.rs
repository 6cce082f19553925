//! Subscription pricing for AppDesk.
//!
//! Computes stacked-discount prices from a plan plus add-on features,
//! normalizes them across billing cycles, and snapshots the feature set a
//! new subscription is entitled to.

pub mod pricing;
pub mod quote;

pub use pricing::{PriceBreakdown, PricingInput};
pub use quote::SubscriptionQuote;
