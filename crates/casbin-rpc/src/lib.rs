//! Top-level facade crate for casbin-rpc.
//!
//! Re-exports the protocol core and the client runtime so users can depend on a single crate.

pub mod core {
    pub use casbin_rpc_core::*;
}

pub mod client {
    pub use casbin_rpc_client::*;
}

pub use casbin_rpc_client::{CallContext, Channel, ChannelOptions, Enforcer, EnforcerConfig};
pub use casbin_rpc_core::{params, CasbinRpcError, ErrorKind, Result};
