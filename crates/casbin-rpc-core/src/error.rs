//! Shared error type across casbin-rpc crates.

use thiserror::Error;

use crate::handle::AdapterHandle;

/// Caller-facing error kinds (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Channel unavailable or lost.
    Connection,
    /// Malformed arguments, detected locally or rejected by the server as such.
    Request,
    /// The server rejected the request.
    Remote,
    /// The caller canceled the call.
    Canceled,
    /// The call deadline elapsed.
    DeadlineExceeded,
    /// Reply did not match the wire schema.
    Protocol,
    /// Invalid configuration.
    Config,
    /// Client-side invariant violated.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs and test vectors.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Connection => "CONNECTION",
            ErrorKind::Request => "REQUEST",
            ErrorKind::Remote => "REMOTE",
            ErrorKind::Canceled => "CANCELED",
            ErrorKind::DeadlineExceeded => "DEADLINE_EXCEEDED",
            ErrorKind::Protocol => "PROTOCOL",
            ErrorKind::Config => "CONFIG",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Status codes a server attaches to a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCode {
    /// Malformed request, e.g. wrong enforcement arity.
    InvalidArgument,
    /// Unknown adapter or enforcer handle.
    NotFound,
    /// Server state rejects the call (bad model text, unusable adapter).
    FailedPrecondition,
    /// Server-side failure.
    Internal,
    /// Server not serving.
    Unavailable,
    /// Any status this client does not recognize.
    Unknown,
}

impl RemoteCode {
    pub fn as_str(self) -> &'static str {
        match self {
            RemoteCode::InvalidArgument => "INVALID_ARGUMENT",
            RemoteCode::NotFound => "NOT_FOUND",
            RemoteCode::FailedPrecondition => "FAILED_PRECONDITION",
            RemoteCode::Internal => "INTERNAL",
            RemoteCode::Unavailable => "UNAVAILABLE",
            RemoteCode::Unknown => "UNKNOWN",
        }
    }

    /// Parse a wire status string. Unrecognized codes map to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "INVALID_ARGUMENT" => RemoteCode::InvalidArgument,
            "NOT_FOUND" => RemoteCode::NotFound,
            "FAILED_PRECONDITION" => RemoteCode::FailedPrecondition,
            "INTERNAL" => RemoteCode::Internal,
            "UNAVAILABLE" => RemoteCode::Unavailable,
            _ => RemoteCode::Unknown,
        }
    }
}

impl std::fmt::Display for RemoteCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CasbinRpcError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum CasbinRpcError {
    #[error("connection: {0}")]
    Connection(String),
    #[error("bad request: {0}")]
    Request(String),
    #[error("remote error ({code}): {message}")]
    Remote { code: RemoteCode, message: String },
    #[error("call canceled")]
    Canceled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("handle {handle} was issued by channel {issued_by}, not channel {used_with}")]
    HandleMismatch {
        handle: i32,
        issued_by: u64,
        used_with: u64,
    },
    /// Enforcer creation failed. When an adapter had already been allocated
    /// for it, that adapter is still live on the server and is reported here.
    /// The handle can be passed back to `EnforcerBuilder::with_adapter` on the
    /// same channel to retry.
    #[error("enforcer creation failed (orphaned adapter: {orphaned_adapter:?}): {source}")]
    EnforcerCreation {
        orphaned_adapter: Option<AdapterHandle>,
        #[source]
        source: Box<CasbinRpcError>,
    },
    #[error("protocol: {0}")]
    Protocol(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl CasbinRpcError {
    /// Map an error to its stable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CasbinRpcError::Connection(_) => ErrorKind::Connection,
            CasbinRpcError::Request(_) => ErrorKind::Request,
            CasbinRpcError::Remote { .. } => ErrorKind::Remote,
            CasbinRpcError::Canceled => ErrorKind::Canceled,
            CasbinRpcError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            CasbinRpcError::HandleMismatch { .. } => ErrorKind::Request,
            CasbinRpcError::EnforcerCreation { source, .. } => source.kind(),
            CasbinRpcError::Protocol(_) => ErrorKind::Protocol,
            CasbinRpcError::Config(_) => ErrorKind::Config,
            CasbinRpcError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True for malformed requests, whether caught locally or rejected by the
    /// server with `INVALID_ARGUMENT` (e.g. wrong enforcement arity).
    pub fn is_request_error(&self) -> bool {
        match self {
            CasbinRpcError::Remote { code, .. } => *code == RemoteCode::InvalidArgument,
            other => other.kind() == ErrorKind::Request,
        }
    }

    pub fn remote(code: RemoteCode, message: impl Into<String>) -> Self {
        CasbinRpcError::Remote {
            code,
            message: message.into(),
        }
    }
}
