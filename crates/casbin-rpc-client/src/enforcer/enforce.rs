use casbin_rpc_core::error::{CasbinRpcError, Result};
use casbin_rpc_core::protocol::wire::EnforceRequest;
use casbin_rpc_core::protocol::{flatten_params, Method, Param};

use crate::channel::CallContext;

use super::Enforcer;

impl Enforcer {
    /// Decide whether a request is allowed. Parameters are usually
    /// `(sub, obj, act)`; attribute records are sent as canonical tokens.
    ///
    /// A parameter count the model does not accept is a request error, never
    /// a `false` decision. With `request_arity` set it is caught locally;
    /// otherwise the server's `INVALID_ARGUMENT` rejection is returned.
    pub async fn enforce<I, P>(&self, ctx: &CallContext, params: I) -> Result<bool>
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        let params = flatten_params(params.into_iter().map(Into::into).collect())?;
        if let Some(expected) = self.request_arity {
            if params.len() != expected {
                return Err(CasbinRpcError::Request(format!(
                    "invalid request size: expected {expected} parameters, got {}",
                    params.len()
                )));
            }
        }

        let req = EnforceRequest {
            enforcer_handler: self.handle.id(),
            params,
        };
        self.call_bool(ctx, Method::Enforce, &req).await
    }

    /// Reload the policy from the enforcer's storage.
    pub async fn load_policy(&self, ctx: &CallContext) -> Result<()> {
        self.call_empty(ctx, Method::LoadPolicy, &self.empty_request()).await
    }

    /// Persist the current policy to the enforcer's storage.
    pub async fn save_policy(&self, ctx: &CallContext) -> Result<()> {
        self.call_empty(ctx, Method::SavePolicy, &self.empty_request()).await
    }
}
