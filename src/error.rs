//! Error taxonomy for ingestion, analysis and generation.
//!
//! Every failure is local to one invocation and carries a message meant
//! to be shown to the user verbatim.

use thiserror::Error;

/// Errors produced by the ANOVA pipeline and the synthetic data generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnovaError {
    /// Malformed or unreadable input table.
    #[error("Input error: {0}")]
    Input(String),
    /// Input was readable but does not support an analysis.
    #[error("{0}")]
    Validation(String),
    /// The computation is undefined for the given data.
    #[error("Computation error: {0}")]
    Computation(String),
    /// Generator parameters were rejected before sampling.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AnovaError {
    pub(crate) fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn computation(msg: impl Into<String>) -> Self {
        Self::Computation(msg.into())
    }

    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

/// Result alias used across the library.
pub type Result<T, E = AnovaError> = std::result::Result<T, E>;
