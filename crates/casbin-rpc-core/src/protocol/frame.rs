//! Request/reply envelopes.
//!
//! Every request carries a caller-chosen `id`; the reply echoes it so one
//! connection can multiplex many in-flight calls. A reply carries exactly one
//! of `ok` (the reply body) or `err` (a remote status).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CasbinRpcError, RemoteCode, Result};
use crate::protocol::wire::Method;

/// Request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestFrame {
    /// Correlation id, unique per connection while in flight.
    pub id: u64,
    /// Operation name (`Method::as_str`).
    pub method: String,
    /// Operation-specific request body.
    #[serde(default)]
    pub body: Value,
}

impl RequestFrame {
    pub fn new(id: u64, method: Method, body: Value) -> Self {
        Self {
            id,
            method: method.as_str().to_string(),
            body,
        }
    }

    /// Resolve the operation name.
    pub fn method(&self) -> Result<Method> {
        Method::parse(&self.method)
            .ok_or_else(|| CasbinRpcError::Request(format!("unknown method: {}", self.method)))
    }
}

/// Status attached to a rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStatus {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl RemoteStatus {
    pub fn new(code: RemoteCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_str().to_string(),
            message: message.into(),
        }
    }

    /// Build a status from a client-side error, for servers reusing this crate.
    pub fn from_error(err: &CasbinRpcError) -> Self {
        match err {
            CasbinRpcError::Remote { code, message } => Self::new(*code, message.clone()),
            CasbinRpcError::Request(m) => Self::new(RemoteCode::InvalidArgument, m.clone()),
            other => Self::new(RemoteCode::Internal, other.to_string()),
        }
    }

    pub fn into_error(self) -> CasbinRpcError {
        CasbinRpcError::Remote {
            code: RemoteCode::parse(&self.code),
            message: self.message,
        }
    }
}

/// Reply envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplyFrame {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<RemoteStatus>,
}

impl ReplyFrame {
    pub fn ok(id: u64, body: Value) -> Self {
        Self {
            id,
            ok: Some(body),
            err: None,
        }
    }

    pub fn err(id: u64, status: RemoteStatus) -> Self {
        Self {
            id,
            ok: None,
            err: Some(status),
        }
    }

    /// Collapse the envelope into the call outcome.
    ///
    /// A frame with both or neither of `ok`/`err` is a protocol violation.
    pub fn into_result(self) -> Result<Value> {
        match (self.ok, self.err) {
            (Some(body), None) => Ok(body),
            (None, Some(status)) => Err(status.into_error()),
            (Some(_), Some(_)) => Err(CasbinRpcError::Protocol(format!(
                "reply {} carries both ok and err",
                self.id
            ))),
            (None, None) => Err(CasbinRpcError::Protocol(format!(
                "reply {} carries neither ok nor err",
                self.id
            ))),
        }
    }
}

/// Decode one reply line.
pub fn decode_reply_frame(line: &str) -> Result<ReplyFrame> {
    serde_json::from_str(line)
        .map_err(|e| CasbinRpcError::Protocol(format!("invalid reply frame: {e}")))
}

/// Decode one request line.
pub fn decode_request_frame(line: &str) -> Result<RequestFrame> {
    serde_json::from_str(line)
        .map_err(|e| CasbinRpcError::Request(format!("invalid request frame: {e}")))
}

/// Encode a frame as a single JSON line (without the trailing newline).
pub fn encode_frame<T: Serialize>(frame: &T) -> Result<String> {
    serde_json::to_string(frame)
        .map_err(|e| CasbinRpcError::Internal(format!("frame encode failed: {e}")))
}
