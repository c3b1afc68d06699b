//! Enforcer facade: per-handle enforcement and policy management.
//!
//! An `Enforcer` holds only its handle and the channel that issued it. Every
//! operation is one request/response exchange; nothing is cached, so every
//! read re-fetches from the server. Mutations return `true` when the policy
//! changed and `false` when the request was valid but had no effect.
//!
//! Rule tables come back in server iteration order. Repeated reads with no
//! intervening mutation return the same rules; the order is whatever the
//! server guarantees, so callers comparing tables across servers should
//! compare them as sets.

mod enforce;
mod management;
mod rbac;

use serde::Serialize;

use casbin_rpc_core::error::Result;
use casbin_rpc_core::handle::EnforcerHandle;
use casbin_rpc_core::protocol::table::{reply_to_table, FieldFilter, Rule};
use casbin_rpc_core::protocol::wire::{
    ArrayReply, Array2DReply, BoolReply, EmptyReply, EmptyRequest, FilteredPolicyRequest,
    PolicyRequest, SimpleGetRequest,
};
use casbin_rpc_core::protocol::{flatten_params, Method, Param};

use crate::channel::{CallContext, Channel};

/// Policy type of permission rules.
pub const PTYPE_POLICY: &str = "p";
/// Policy type of role/grouping rules.
pub const PTYPE_GROUPING: &str = "g";

#[derive(Clone)]
pub struct Enforcer {
    handle: EnforcerHandle,
    channel: Channel,
    request_arity: Option<usize>,
}

impl std::fmt::Debug for Enforcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enforcer")
            .field("handle", &self.handle)
            .field("request_arity", &self.request_arity)
            .finish()
    }
}

impl Enforcer {
    pub(crate) fn new(
        handle: EnforcerHandle,
        channel: Channel,
        request_arity: Option<usize>,
    ) -> Self {
        Self {
            handle,
            channel,
            request_arity,
        }
    }

    pub fn handle(&self) -> EnforcerHandle {
        self.handle
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Enable or disable the local parameter-count check for `enforce`.
    pub fn with_request_arity(mut self, arity: Option<usize>) -> Self {
        self.request_arity = arity;
        self
    }

    // --------------------
    // Request builders
    // --------------------

    fn empty_request(&self) -> EmptyRequest {
        EmptyRequest {
            handler: self.handle.id(),
        }
    }

    fn simple_get_request(&self, ptype: &str) -> SimpleGetRequest {
        SimpleGetRequest {
            enforcer_handler: self.handle.id(),
            p_type: ptype.to_string(),
        }
    }

    fn rule_request<I, P>(&self, ptype: &str, params: I) -> Result<PolicyRequest>
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        let params = flatten_params(params.into_iter().map(Into::into).collect())?;
        Ok(PolicyRequest {
            enforcer_handler: self.handle.id(),
            p_type: ptype.to_string(),
            params,
        })
    }

    fn filtered_request<I, S>(
        &self,
        ptype: &str,
        field_index: usize,
        field_values: I,
    ) -> Result<FilteredPolicyRequest>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let filter = FieldFilter::new(field_index, field_values);
        Ok(FilteredPolicyRequest {
            enforcer_handler: self.handle.id(),
            p_type: ptype.to_string(),
            field_index: filter.wire_index()?,
            field_values: filter.field_values,
        })
    }

    // --------------------
    // Reply shapes
    // --------------------

    async fn call_bool<Req: Serialize>(
        &self,
        ctx: &CallContext,
        method: Method,
        req: &Req,
    ) -> Result<bool> {
        tracing::trace!(enforcer = %self.handle, %method, "bool call");
        let reply: BoolReply = self.channel.invoke(ctx, method, req).await?;
        Ok(reply.res)
    }

    async fn call_array<Req: Serialize>(
        &self,
        ctx: &CallContext,
        method: Method,
        req: &Req,
    ) -> Result<Vec<String>> {
        tracing::trace!(enforcer = %self.handle, %method, "array call");
        let reply: ArrayReply = self.channel.invoke(ctx, method, req).await?;
        Ok(reply.array)
    }

    async fn call_table<Req: Serialize>(
        &self,
        ctx: &CallContext,
        method: Method,
        req: &Req,
    ) -> Result<Vec<Rule>> {
        tracing::trace!(enforcer = %self.handle, %method, "table call");
        let reply: Array2DReply = self.channel.invoke(ctx, method, req).await?;
        Ok(reply_to_table(reply))
    }

    async fn call_empty<Req: Serialize>(
        &self,
        ctx: &CallContext,
        method: Method,
        req: &Req,
    ) -> Result<()> {
        tracing::trace!(enforcer = %self.handle, %method, "empty call");
        let _: EmptyReply = self.channel.invoke(ctx, method, req).await?;
        Ok(())
    }
}
