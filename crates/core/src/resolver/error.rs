//! Error types for the resolver module.

use thiserror::Error;

/// Errors that can occur while resolving object names.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The key's stem matched none of the configured patterns.
    #[error("Input name is invalid: {key}")]
    InvalidName { key: String },

    /// Output derivation found no matching rule. Distinct from
    /// `InvalidName`: a key that passed validation must always derive, so
    /// hitting this is a logic error to surface, never to default away.
    #[error("No rule matched while deriving an output name for: {key}")]
    NoRuleMatched { key: String },

    /// A configured pattern is not a valid regular expression.
    #[error("Invalid name pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A template references a capture group the pattern does not have.
    #[error(
        "Template '{template}' references group {group} but pattern '{pattern}' captures only {available}"
    )]
    BadPlaceholder {
        template: String,
        pattern: String,
        group: usize,
        available: usize,
    },
}
