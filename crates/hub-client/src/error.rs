use thiserror::Error;
use tonic::Code;

use crate::config::ConfigError;

/// Every way a hub call can fail.
///
/// Construction failures (`InvalidAddress`, `Connect`, `Config`) are only ever
/// returned while building a facade. The remaining variants are per call and
/// carry the logical operation (`op`) that produced them; remote statuses are
/// passed through untouched.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid hub address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: &'static str },

    #[error("failed to set up hub transport: {0}")]
    Connect(#[from] tonic::transport::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{op}: deadline exceeded")]
    DeadlineExceeded { op: &'static str },

    #[error("{op}: cancelled by caller")]
    Cancelled { op: &'static str },

    #[error("{op}: {status}")]
    Remote {
        op: &'static str,
        #[source]
        status: Box<tonic::Status>,
    },
}

impl ClientError {
    pub(crate) fn remote(op: &'static str, status: tonic::Status) -> Self {
        ClientError::Remote {
            op,
            status: Box::new(status),
        }
    }

    /// gRPC code equivalent of this error.
    pub fn code(&self) -> Code {
        match self {
            ClientError::InvalidAddress { .. } | ClientError::Config(_) => Code::InvalidArgument,
            ClientError::Connect(_) => Code::Unavailable,
            ClientError::DeadlineExceeded { .. } => Code::DeadlineExceeded,
            ClientError::Cancelled { .. } => Code::Cancelled,
            ClientError::Remote { status, .. } => status.code(),
        }
    }

    /// Operation that failed, `None` for construction errors.
    pub fn op(&self) -> Option<&'static str> {
        match self {
            ClientError::DeadlineExceeded { op }
            | ClientError::Cancelled { op }
            | ClientError::Remote { op, .. } => Some(op),
            _ => None,
        }
    }

    /// Status returned by the hub, if the failure came from the remote side.
    pub fn status(&self) -> Option<&tonic::Status> {
        match self {
            ClientError::Remote { status, .. } => Some(&**status),
            _ => None,
        }
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, ClientError::DeadlineExceeded { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled { .. })
    }
}
