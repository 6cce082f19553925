//! Third-party integrations for AppDesk.
//!
//! The only integration today is the feature-code lookup: apps that publish
//! a feature catalogue can be queried for `{code, name}` pairs to attach to
//! local features. The lookup is optional enrichment and never fails a
//! caller.

pub mod feature_codes;
pub mod session;

pub use feature_codes::{
    FeatureCode, FeatureCodeLookup, FeatureCodeSource, HttpFeatureCodeSource, LookupOutcome,
    LookupWarning,
};
pub use session::LookupSession;
