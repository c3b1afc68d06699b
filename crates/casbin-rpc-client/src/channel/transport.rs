use async_trait::async_trait;
use serde_json::Value;

use casbin_rpc_core::error::Result;
use casbin_rpc_core::protocol::Method;

/// Byte-level carrier of remote calls.
///
/// Implementations must allow concurrent `call`s from many tasks; the channel
/// adds deadlines and cancellation on top by dropping the returned future.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request body and wait for the matching reply body.
    async fn call(&self, method: Method, body: Value) -> Result<Value>;

    fn is_connected(&self) -> bool {
        true
    }

    async fn close(&self) {}
}
