//! Channel: one logical connection to the policy service, shared by every
//! handle issued through it.
//!
//! The channel owns the transport and stamps each issued handle with its
//! `ChannelId`. It is cheap to clone and safe to use from many tasks at once;
//! it holds no client-side policy state.

mod context;
pub mod tcp;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use casbin_rpc_core::error::{CasbinRpcError, Result};
use casbin_rpc_core::handle::ChannelId;
use casbin_rpc_core::protocol::Method;

use crate::config::ChannelSection;

pub use context::CallContext;
pub use tcp::TcpTransport;
pub use transport::Transport;

/// Connection options.
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    pub connect_timeout: Duration,
    /// Applied when a call's context has no deadline.
    pub request_timeout: Option<Duration>,
    pub max_frame_bytes: usize,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self::from(&ChannelSection::default())
    }
}

impl From<&ChannelSection> for ChannelOptions {
    fn from(s: &ChannelSection) -> Self {
        Self {
            connect_timeout: Duration::from_millis(s.connect_timeout_ms),
            request_timeout: (s.request_timeout_ms > 0)
                .then(|| Duration::from_millis(s.request_timeout_ms)),
            max_frame_bytes: s.max_frame_bytes,
        }
    }
}

#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.inner.id)
            .field("opts", &self.inner.opts)
            .finish_non_exhaustive()
    }
}

struct ChannelInner {
    id: ChannelId,
    transport: Arc<dyn Transport>,
    opts: ChannelOptions,
}

impl Channel {
    /// Connect to `address` (`host:port`). Fails with `Connection` when the
    /// address is malformed or unreachable; no retry is attempted.
    pub async fn open(address: &str, opts: ChannelOptions) -> Result<Self> {
        let transport =
            TcpTransport::connect(address, opts.connect_timeout, opts.max_frame_bytes).await?;
        Ok(Self::from_transport(Arc::new(transport), opts))
    }

    /// Connect using a config section.
    pub async fn open_with_config(section: &ChannelSection) -> Result<Self> {
        Self::open(&section.address, ChannelOptions::from(section)).await
    }

    /// Wrap an already-established transport.
    pub fn from_transport(transport: Arc<dyn Transport>, opts: ChannelOptions) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                id: ChannelId::next(),
                transport,
                opts,
            }),
        }
    }

    pub fn id(&self) -> ChannelId {
        self.inner.id
    }

    pub fn options(&self) -> &ChannelOptions {
        &self.inner.opts
    }

    pub fn is_connected(&self) -> bool {
        self.inner.transport.is_connected()
    }

    /// Tear down the connection. Handles issued through this channel become
    /// unusable; server-side state is untouched.
    pub async fn close(&self) {
        tracing::info!(channel = %self.inner.id, "closing channel");
        self.inner.transport.close().await;
    }

    /// One request/response exchange under `ctx`.
    pub(crate) async fn invoke<Req, Rep>(
        &self,
        ctx: &CallContext,
        method: Method,
        req: &Req,
    ) -> Result<Rep>
    where
        Req: Serialize,
        Rep: DeserializeOwned,
    {
        let body = serde_json::to_value(req)
            .map_err(|e| CasbinRpcError::Internal(format!("{method} request encode failed: {e}")))?;

        tracing::debug!(channel = %self.inner.id, %method, "remote call");
        let reply = ctx
            .run(self.inner.transport.call(method, body), self.inner.opts.request_timeout)
            .await
            .inspect_err(|e| {
                tracing::debug!(
                    channel = %self.inner.id,
                    %method,
                    kind = e.kind().as_str(),
                    error = %e,
                    "remote call failed"
                );
            })?;

        serde_json::from_value(reply)
            .map_err(|e| CasbinRpcError::Protocol(format!("{method} reply malformed: {e}")))
    }
}
