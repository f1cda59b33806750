//! Error taxonomy for the visibility pipeline

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkyError {
    /// An ephemeris or catalog dataset could not be loaded; fatal for the run
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// A single body or catalog row could not be positioned
    #[error("lookup failed for {name}: {reason}")]
    LookupFailed { name: String, reason: String },

    /// Malformed or unsupported ephemeris kernel content
    #[error("ephemeris error: {0}")]
    Ephemeris(String),

    /// Description endpoint could not be reached
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Description endpoint answered without a usable summary
    #[error("no summary found for {0}")]
    NotFound(String),
}

impl SkyError {
    pub fn lookup(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        SkyError::LookupFailed {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type SkyResult<T> = Result<T, SkyError>;
