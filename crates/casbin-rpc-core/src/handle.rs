//! Server-issued handles, stamped with the channel that obtained them.
//!
//! A handle is only meaningful on the channel that created it. Handles carry
//! the issuing `ChannelId` so a client can reject cross-channel use before any
//! request is sent.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{CasbinRpcError, Result};

/// Wire sentinel for "no adapter".
pub const NO_ADAPTER: i32 = -1;

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one logical channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Allocate a fresh id. Never returns the same value twice in a process.
    pub fn next() -> Self {
        Self(NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch-{}", self.0)
    }
}

/// Names a server-side policy-storage binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdapterHandle {
    id: i32,
    channel: ChannelId,
}

/// Names a server-side enforcer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnforcerHandle {
    id: i32,
    channel: ChannelId,
}

macro_rules! impl_handle {
    ($ty:ident) => {
        impl $ty {
            pub fn new(id: i32, channel: ChannelId) -> Self {
                Self { id, channel }
            }

            /// Raw wire id.
            pub fn id(&self) -> i32 {
                self.id
            }

            /// Channel that issued this handle.
            pub fn channel(&self) -> ChannelId {
                self.channel
            }

            /// Reject use of this handle on any channel other than its issuer.
            pub fn ensure_issued_by(&self, channel: ChannelId) -> Result<()> {
                if self.channel == channel {
                    return Ok(());
                }
                Err(CasbinRpcError::HandleMismatch {
                    handle: self.id,
                    issued_by: self.channel.get(),
                    used_with: channel.get(),
                })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}@{}", self.id, self.channel)
            }
        }
    };
}

impl_handle!(AdapterHandle);
impl_handle!(EnforcerHandle);

/// Wire encoding of an optional adapter.
pub fn adapter_wire_id(adapter: Option<&AdapterHandle>) -> i32 {
    adapter.map(AdapterHandle::id).unwrap_or(NO_ADAPTER)
}
