//! Line-delimited JSON transport over TCP.
//!
//! One connection carries many in-flight calls:
//! - callers push encoded request frames into an outbound queue
//! - a single I/O task writes them and reads reply frames
//! - replies are routed back by `id` to the waiting caller
//!
//! When the connection drops, every pending call fails with `Connection`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{Framed, LinesCodec};
use tokio_util::sync::CancellationToken;

use casbin_rpc_core::error::{CasbinRpcError, Result};
use casbin_rpc_core::protocol::frame::{decode_reply_frame, encode_frame};
use casbin_rpc_core::protocol::{Method, RequestFrame};

use super::transport::Transport;

type Pending = DashMap<u64, oneshot::Sender<Result<Value>>>;

const OUTBOUND_QUEUE: usize = 1024;

pub struct TcpTransport {
    peer: String,
    out_tx: mpsc::Sender<String>,
    pending: Arc<Pending>,
    next_id: AtomicU64,
    connected: Arc<AtomicBool>,
    shutdown: CancellationToken,
    max_frame_bytes: usize,
}

/// Check `host:port` shape without touching the network.
pub fn validate_address(address: &str) -> Result<()> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| CasbinRpcError::Connection(format!("malformed address: {address}")))?;
    if host.is_empty() {
        return Err(CasbinRpcError::Connection(format!("malformed address: {address}")));
    }
    port.parse::<u16>()
        .map_err(|_| CasbinRpcError::Connection(format!("malformed port in address: {address}")))?;
    Ok(())
}

impl TcpTransport {
    /// Connect once. No retry: callers own their retry policy.
    pub async fn connect(
        address: &str,
        connect_timeout: Duration,
        max_frame_bytes: usize,
    ) -> Result<Self> {
        validate_address(address)?;

        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| CasbinRpcError::Connection(format!("connect to {address} timed out")))?
            .map_err(|e| CasbinRpcError::Connection(format!("connect to {address} failed: {e}")))?;
        let _ = stream.set_nodelay(true);

        let (out_tx, out_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE);
        let pending: Arc<Pending> = Arc::new(DashMap::new());
        let connected = Arc::new(AtomicBool::new(true));
        let shutdown = CancellationToken::new();

        let framed = Framed::new(stream, LinesCodec::new_with_max_length(max_frame_bytes));
        tokio::spawn(run_io(
            address.to_string(),
            framed,
            out_rx,
            Arc::clone(&pending),
            Arc::clone(&connected),
            shutdown.clone(),
        ));

        tracing::info!(peer = %address, "channel connected");

        Ok(Self {
            peer: address.to_string(),
            out_tx,
            pending,
            next_id: AtomicU64::new(1),
            connected,
            shutdown,
            max_frame_bytes,
        })
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Number of calls awaiting a reply.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

/// Removes a pending slot when its caller stops waiting (reply, cancel, timeout).
struct PendingGuard<'a> {
    id: u64,
    pending: &'a Pending,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn call(&self, method: Method, body: Value) -> Result<Value> {
        if !self.is_connected() {
            return Err(CasbinRpcError::Connection(format!("channel to {} is closed", self.peer)));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = encode_frame(&RequestFrame::new(id, method, body))?;
        if line.len() > self.max_frame_bytes {
            return Err(CasbinRpcError::Request(format!(
                "{method} request is {} bytes, above max_frame_bytes {}",
                line.len(),
                self.max_frame_bytes
            )));
        }

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        let _guard = PendingGuard {
            id,
            pending: self.pending.as_ref(),
        };

        tracing::debug!(peer = %self.peer, %method, id, "send request");
        self.out_tx
            .send(line)
            .await
            .map_err(|_| {
                CasbinRpcError::Connection(format!("channel to {} is closed", self.peer))
            })?;

        rx.await.map_err(|_| {
            CasbinRpcError::Connection(format!("connection to {} closed before reply", self.peer))
        })?
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn close(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_io(
    peer: String,
    framed: Framed<TcpStream, LinesCodec>,
    mut out_rx: mpsc::Receiver<String>,
    pending: Arc<Pending>,
    connected: Arc<AtomicBool>,
    shutdown: CancellationToken,
) {
    let (mut sink, mut stream) = framed.split();

    let reason = loop {
        tokio::select! {
            _ = shutdown.cancelled() => break "closed by client",

            // outbound writer
            maybe_out = out_rx.recv() => {
                let Some(line) = maybe_out else { break "closed by client" };
                if let Err(e) = sink.send(line).await {
                    tracing::warn!(peer = %peer, error = %e, "write failed");
                    break "write failed";
                }
            }

            // inbound reader
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(line)) => route_reply(&peer, &pending, &line),
                    Some(Err(e)) => {
                        tracing::warn!(peer = %peer, error = %e, "read failed");
                        break "read failed";
                    }
                    None => break "closed by peer",
                }
            }
        }
    };

    // Refuse new sends before draining so no caller can slip in behind the drain.
    connected.store(false, Ordering::Release);
    out_rx.close();

    let ids: Vec<u64> = pending.iter().map(|e| *e.key()).collect();
    if !ids.is_empty() {
        tracing::warn!(peer = %peer, pending = ids.len(), reason, "failing in-flight calls");
    }
    for id in ids {
        if let Some((_, tx)) = pending.remove(&id) {
            let _ = tx.send(Err(CasbinRpcError::Connection(format!(
                "connection to {peer} lost: {reason}"
            ))));
        }
    }
    let _ = sink.close().await;
    tracing::info!(peer = %peer, reason, "channel closed");
}

fn route_reply(peer: &str, pending: &Pending, line: &str) {
    let frame = match decode_reply_frame(line) {
        Ok(f) => f,
        Err(e) => return fail_undecodable(peer, pending, line, e),
    };

    match pending.remove(&frame.id) {
        Some((_, tx)) => {
            let _ = tx.send(frame.into_result());
        }
        // caller already gave up (canceled or timed out)
        None => tracing::debug!(peer = %peer, id = frame.id, "reply for abandoned call"),
    }
}

/// A reply that fails full decoding still goes to its caller when the `id`
/// can be recovered, so the call ends with `Protocol` rather than waiting.
fn fail_undecodable(peer: &str, pending: &Pending, line: &str, err: CasbinRpcError) {
    let id = serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|v| v.get("id").and_then(Value::as_u64));

    match id.and_then(|id| pending.remove(&id)) {
        Some((id, tx)) => {
            tracing::warn!(peer = %peer, id, error = %err, "undecodable reply");
            let _ = tx.send(Err(err));
        }
        None => tracing::warn!(peer = %peer, error = %err, "dropping undecodable reply"),
    }
}
