use casbin_rpc_core::error::{CasbinRpcError, Result};
use casbin_rpc_core::handle::AdapterHandle;

use crate::channel::{CallContext, Channel};
use crate::config::EnforcerConfig;
use crate::enforcer::Enforcer;

/// Allocation progress of one enforcer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing allocated yet.
    Pending,
    /// Adapter live on the server, enforcer not yet created.
    AdapterAllocated(AdapterHandle),
}

/// Two-phase enforcer creation that records what it has allocated.
///
/// Phases can be driven one at a time (`allocate_adapter`, then `build`) so a
/// caller can observe the partial state; `build` runs whatever is left.
pub struct EnforcerBuilder {
    channel: Channel,
    config: EnforcerConfig,
    stage: Stage,
    // adapter created by this builder (not attached by the caller)
    owns_adapter: bool,
}

impl EnforcerBuilder {
    pub fn new(channel: Channel, config: EnforcerConfig) -> Self {
        Self {
            channel,
            config,
            stage: Stage::Pending,
            owns_adapter: false,
        }
    }

    /// Reuse an adapter allocated earlier; the adapter phase is skipped.
    pub fn with_adapter(mut self, adapter: AdapterHandle) -> Self {
        self.stage = Stage::AdapterAllocated(adapter);
        self.owns_adapter = false;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn config(&self) -> &EnforcerConfig {
        &self.config
    }

    /// Adapter attached so far, if any.
    pub fn adapter(&self) -> Option<AdapterHandle> {
        match self.stage {
            Stage::AdapterAllocated(a) => Some(a),
            Stage::Pending => None,
        }
    }

    /// Run the adapter phase if the config asks for one and none is attached.
    ///
    /// Skipping costs no round trip. Failure here allocates nothing.
    pub async fn allocate_adapter(&mut self, ctx: &CallContext) -> Result<Option<AdapterHandle>> {
        if let Stage::AdapterAllocated(a) = self.stage {
            return Ok(Some(a));
        }
        if !self.config.wants_adapter() {
            return Ok(None);
        }

        let adapter = self
            .channel
            .create_adapter(
                ctx,
                &self.config.driver_name,
                &self.config.connect_string,
                self.config.db_specified,
            )
            .await?;
        self.stage = Stage::AdapterAllocated(adapter);
        self.owns_adapter = true;
        Ok(Some(adapter))
    }

    /// Finish creation.
    ///
    /// If the enforcer phase fails after this builder allocated an adapter, the
    /// error is `EnforcerCreation` naming the orphaned adapter.
    pub async fn build(mut self, ctx: &CallContext) -> Result<Enforcer> {
        let adapter = self.allocate_adapter(ctx).await?;

        let created = self
            .channel
            .allocate_enforcer(
                ctx,
                &self.config.model_text,
                adapter.as_ref(),
                self.config.enable_accept_json_request,
            )
            .await;

        match created {
            Ok(handle) => Ok(Enforcer::new(handle, self.channel, self.config.request_arity)),
            Err(e) => match adapter {
                Some(a) if self.owns_adapter => {
                    tracing::warn!(
                        enforcer = %self.config.name,
                        adapter = %a,
                        error = %e,
                        "enforcer creation failed; adapter left allocated on server"
                    );
                    Err(CasbinRpcError::EnforcerCreation {
                        orphaned_adapter: Some(a),
                        source: Box::new(e),
                    })
                }
                _ => Err(e),
            },
        }
    }
}
