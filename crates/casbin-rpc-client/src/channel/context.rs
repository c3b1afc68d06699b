//! Per-call deadline and cancellation.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use casbin_rpc_core::error::{CasbinRpcError, Result};

/// Caller-supplied context threaded through every remote call.
///
/// A canceled call fails with `Canceled`, an expired one with
/// `DeadlineExceeded`; neither is ever reported as a `false` result.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl CallContext {
    /// No deadline, no cancellation. The channel's default request timeout applies.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Drive `fut` under this context. `fallback` is used when no deadline was set.
    pub(crate) async fn run<F, T>(&self, fut: F, fallback: Option<Duration>) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_canceled() {
            return Err(CasbinRpcError::Canceled);
        }

        let deadline = self
            .deadline
            .or_else(|| fallback.map(|d| Instant::now() + d));
        if deadline.is_some_and(|d| d <= Instant::now()) {
            return Err(CasbinRpcError::DeadlineExceeded);
        }

        let timed = async {
            match deadline {
                Some(d) => tokio::time::timeout_at(d, fut)
                    .await
                    .unwrap_or(Err(CasbinRpcError::DeadlineExceeded)),
                None => fut.await,
            }
        };

        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(CasbinRpcError::Canceled),
                    res = timed => res,
                }
            }
            None => timed.await,
        }
    }
}
