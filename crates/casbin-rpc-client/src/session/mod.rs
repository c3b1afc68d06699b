//! Session handle management: allocating adapters and enforcers on the server
//! and re-attaching previously issued handles.
//!
//! Creation is two-phase (adapter, then enforcer) and not transactional. No
//! release operation exists in the protocol, so an adapter whose enforcer
//! failed to materialize stays allocated server-side; it is reported to the
//! caller instead of being hidden.

mod builder;

use casbin_rpc_core::error::Result;
use casbin_rpc_core::handle::{adapter_wire_id, AdapterHandle, EnforcerHandle};
use casbin_rpc_core::protocol::wire::{
    NewAdapterReply, NewAdapterRequest, NewEnforcerReply, NewEnforcerRequest,
};
use casbin_rpc_core::protocol::Method;

use crate::channel::{CallContext, Channel};
use crate::config::EnforcerConfig;
use crate::enforcer::Enforcer;

pub use builder::{EnforcerBuilder, Stage};

impl Channel {
    /// Allocate a policy-storage binding on the server.
    pub async fn create_adapter(
        &self,
        ctx: &CallContext,
        driver_name: &str,
        connect_string: &str,
        db_specified: bool,
    ) -> Result<AdapterHandle> {
        let req = NewAdapterRequest {
            driver_name: driver_name.to_string(),
            connect_string: connect_string.to_string(),
            db_specified,
        };
        let reply: NewAdapterReply = self.invoke(ctx, Method::NewAdapter, &req).await?;
        let handle = AdapterHandle::new(reply.handler, self.id());
        tracing::debug!(adapter = %handle, driver = %driver_name, "adapter created");
        Ok(handle)
    }

    /// Allocate an enforcer from model text and an optional adapter.
    ///
    /// A foreign adapter handle is rejected before any request is sent.
    pub async fn create_enforcer(
        &self,
        ctx: &CallContext,
        model_text: &str,
        adapter: Option<&AdapterHandle>,
    ) -> Result<EnforcerHandle> {
        self.allocate_enforcer(ctx, model_text, adapter, false).await
    }

    pub(crate) async fn allocate_enforcer(
        &self,
        ctx: &CallContext,
        model_text: &str,
        adapter: Option<&AdapterHandle>,
        accept_json: bool,
    ) -> Result<EnforcerHandle> {
        if let Some(a) = adapter {
            a.ensure_issued_by(self.id())?;
        }
        let req = NewEnforcerRequest {
            model_text: model_text.to_string(),
            adapter_handle: adapter_wire_id(adapter),
            enable_accept_json_request: accept_json,
        };
        let reply: NewEnforcerReply = self.invoke(ctx, Method::NewEnforcer, &req).await?;
        let handle = EnforcerHandle::new(reply.handler, self.id());
        tracing::debug!(enforcer = %handle, adapter = adapter_wire_id(adapter), "enforcer created");
        Ok(handle)
    }

    /// Run both creation phases for `config`, skipping the adapter phase when
    /// the config does not name both a driver and a connection string.
    pub async fn new_enforcer(
        &self,
        ctx: &CallContext,
        config: &EnforcerConfig,
    ) -> Result<Enforcer> {
        EnforcerBuilder::new(self.clone(), config.clone()).build(ctx).await
    }

    /// Re-attach a handle previously issued by this channel.
    pub fn enforcer(&self, handle: EnforcerHandle) -> Result<Enforcer> {
        handle.ensure_issued_by(self.id())?;
        Ok(Enforcer::new(handle, self.clone(), None))
    }
}
