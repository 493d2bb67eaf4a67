use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types produced by observatory operations helpers.
///
/// Collaborator clients (device readers, broker clients, HTTP callers) are
/// expected to map their protocol errors into these variants at the boundary
/// so that retry policies can filter on [`ErrorKind`].
#[derive(Debug, Error)]
pub enum OpsError {
    /// Failed to reach a device or remote service
    #[error("Connection error: {0}")]
    Connection(String),
    /// A device produced an invalid reading or rejected a request
    #[error("Device error: {0}")]
    Device(String),
    /// A remote command was delivered but reported failure
    #[error("Command failed: {0}")]
    CommandFailed(String),
    /// A value failed validation or parsing
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// An operation exceeded its allotted time
    #[error("Timed out after {after:?}")]
    Timeout { after: Duration },
    /// A user-supplied callback failed
    #[error("Callback error: {0}")]
    Callback(String),
    /// Generic error
    #[error("Generic error: {0}")]
    Generic(String),
}

/// Discriminator for [`OpsError`] variants.
///
/// Retry policies match failures by exact kind; there is no kind hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Connection,
    Device,
    CommandFailed,
    InvalidValue,
    Timeout,
    Callback,
    Generic,
}

impl OpsError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OpsError::Connection(_) => ErrorKind::Connection,
            OpsError::Device(_) => ErrorKind::Device,
            OpsError::CommandFailed(_) => ErrorKind::CommandFailed,
            OpsError::InvalidValue(_) => ErrorKind::InvalidValue,
            OpsError::Timeout { .. } => ErrorKind::Timeout,
            OpsError::Callback(_) => ErrorKind::Callback,
            OpsError::Generic(_) => ErrorKind::Generic,
        }
    }
}

/// Converts socket-level failures from wrapped I/O callables
impl From<std::io::Error> for OpsError {
    fn from(err: std::io::Error) -> Self {
        OpsError::Connection(err.to_string())
    }
}
