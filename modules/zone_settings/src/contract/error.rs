//! Contract error types for zone settings overrides
//!
//! These errors are transport-agnostic and used for inter-module communication.

use std::fmt;

/// Step of a reconciliation cycle in which an error surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial read (read-only collection, baseline capture, refresh)
    Read,
    /// Writing the computed write-set
    Dispatch,
    /// Read after dispatch
    Reread,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Dispatch => "dispatch",
            Self::Reread => "re-read",
        })
    }
}

/// Remote endpoint family a call went to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubProtocol {
    /// Batch settings endpoint
    Bulk,
    /// Dedicated per-setting endpoint
    Single,
    /// Separate feature-status endpoint
    Toggle,
    /// Zone details endpoint
    Target,
}

impl fmt::Display for SubProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bulk => "bulk settings",
            Self::Single => "single setting",
            Self::Toggle => "feature toggle",
            Self::Target => "zone details",
        })
    }
}

/// Failure reported by a gateway implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The addressed resource does not exist
    #[error("{resource} not found")]
    NotFound {
        /// Resource description (zone, setting)
        resource: String,
    },
    /// The API answered with an error
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// First API error code, if any
        code: Option<i64>,
        /// API error messages
        message: String,
    },
    /// The request never got an answer
    #[error("transport error: {message}")]
    Transport {
        /// Underlying error
        message: String,
    },
    /// The answer could not be understood
    #[error("unexpected response: {message}")]
    Decode {
        /// Decoding failure details
        message: String,
    },
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether a retry may succeed (rate limiting, server errors, transport)
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Transport { .. } => true,
            Self::NotFound { .. } | Self::Decode { .. } => false,
        }
    }
}

/// Zone settings domain errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZoneSettingsError {
    /// Setting name absent from the registry
    #[error("unknown zone setting '{name}'")]
    UnknownSetting {
        /// Offending name
        name: String,
    },
    /// Apply attempted to change a setting the zone reports as non-editable
    #[error("zone setting '{name}' (value: {value}) cannot be set as it is read only")]
    ReadOnlyViolation {
        /// Setting name
        name: String,
        /// Requested value
        value: String,
    },
    /// Value does not fit the setting's declared shape
    #[error("invalid value for zone setting '{name}': {reason}")]
    Encoding {
        /// Setting name
        name: String,
        /// What is wrong with it
        reason: String,
    },
    /// A gateway call failed; earlier writes of the cycle are kept
    #[error("{protocol} call failed during {phase}{}: {source}", describe_setting(.setting))]
    RemoteCall {
        /// Cycle step
        phase: Phase,
        /// Endpoint family
        protocol: SubProtocol,
        /// Setting(s) involved, if any
        setting: Option<String>,
        /// Gateway failure
        source: GatewayError,
    },
    /// The managed zone no longer exists
    #[error("zone '{target}' not found")]
    TargetNotFound {
        /// Zone identifier
        target: String,
    },
    /// Zone is already under management
    #[error("zone '{target}' is already managed")]
    AlreadyManaged {
        /// Zone identifier
        target: String,
    },
    /// Zone has no bookkeeping record
    #[error("zone '{target}' is not managed")]
    NotManaged {
        /// Zone identifier
        target: String,
    },
    /// Bookkeeping storage failed
    #[error("storage error: {message}")]
    Storage {
        /// Error details
        message: String,
    },
}

fn describe_setting(setting: &Option<String>) -> String {
    match setting {
        Some(name) => format!(" for '{}'", name),
        None => String::new(),
    }
}

impl ZoneSettingsError {
    pub(crate) fn encoding(name: &str, reason: impl Into<String>) -> Self {
        Self::Encoding {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown(name: &str) -> Self {
        Self::UnknownSetting {
            name: name.to_string(),
        }
    }
}
