//! casbin-rpc core: transport-agnostic protocol primitives and error types.
//!
//! This crate defines the wire-level contracts shared by the client runtime and
//! any reference server: handle types, request/reply schemas, the parameter and
//! attribute codecs, and rule-table decoding. It carries no transport or runtime
//! dependencies so it can be reused on either side of the wire.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `CasbinRpcError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod handle;
pub mod protocol;

/// Shared result type.
pub use error::{CasbinRpcError, ErrorKind, RemoteCode, Result};
pub use handle::{AdapterHandle, ChannelId, EnforcerHandle, NO_ADAPTER};
