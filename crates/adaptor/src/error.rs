//! Adaptor error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::host::HostType;

/// Adaptor errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The host style cannot perform this operation at all.
    #[error("{operation} is not supported in this host ({host})")]
    Unsupported {
        operation: &'static str,
        host: HostType,
    },

    /// The environment does not provide the declared host.
    #[error("{0} host is not available in this environment")]
    HostUnavailable(HostType),

    /// A direct-call host method failed.
    #[error("host call failed: {0}")]
    Host(String),

    /// The host answered with something we could not read.
    #[error("invalid host response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Bridge(#[from] bridge::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
