//! Construction-time errors.
//!
//! Runtime combat logic has no error paths: gated triggers, absent
//! collaborators and redundant operations are no-ops. Only building an
//! object from bad configuration fails.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CombatError {
    /// A required configuration object was not supplied.
    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Configuration present but violates an invariant.
    #[error("invalid {what} configuration: {reason}")]
    InvalidConfig { what: &'static str, reason: String },

    #[error("failed to parse combat config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),
}

impl CombatError {
    pub(crate) fn invalid(what: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            what,
            reason: reason.into(),
        }
    }
}
