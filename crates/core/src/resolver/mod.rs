//! Name resolution for inbound object keys.
//!
//! An ordered list of (pattern, template) rules decides whether an inbound
//! key is acceptable and what output key a converted artifact is delivered
//! under. The first matching rule wins. Directory sharding schemes are
//! expressed as ordinary templates that place capture groups into their own
//! path segments; no collection name is special-cased.

mod error;
mod rules;

pub use error::ResolverError;
pub use rules::{NameRule, RuleSet};
