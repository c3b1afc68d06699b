//! casbin-rpc client runtime.
//!
//! This crate wires a multiplexed channel, the session handle manager, and the
//! enforcer facade into a client for a remote policy evaluation service. The
//! server owns every adapter and enforcer; the client holds only handles and
//! never caches policy state.
//!
//! ```no_run
//! # async fn demo() -> casbin_rpc_core::Result<()> {
//! use casbin_rpc_client::{CallContext, Channel, ChannelOptions, EnforcerConfig};
//!
//! let channel = Channel::open("127.0.0.1:50051", ChannelOptions::default()).await?;
//! let ctx = CallContext::background();
//! let e = channel.new_enforcer(&ctx, &EnforcerConfig::new("")).await?;
//! e.add_policy(&ctx, ["alice", "data1", "read"]).await?;
//! assert!(e.enforce(&ctx, ["alice", "data1", "read"]).await?);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod channel;
pub mod config;
pub mod enforcer;
pub mod session;

pub use channel::{CallContext, Channel, ChannelOptions, TcpTransport, Transport};
pub use config::{ChannelSection, ClientConfig, EnforcerConfig};
pub use enforcer::{Enforcer, PTYPE_GROUPING, PTYPE_POLICY};
pub use session::{EnforcerBuilder, Stage};

pub use tokio_util::sync::CancellationToken;
