//! Shared building blocks
//!
//! This module contains the types every component speaks:
//! - Addresses (20-byte identities for accounts and components)
//! - Events (append-only audit log)
//! - Downstream failures (errors reported by forwarded calls)

pub mod address;
pub mod downstream;
pub mod events;
pub mod hex_bytes;

pub use address::{Address, AddressError, ADDRESS_LENGTH};
pub use downstream::DownstreamError;
pub use events::{Event, EventClock, EventKind, EventLog};

/// Unsigned 256-bit integer, the width of on-chain token ids
pub use alloy_primitives::U256;
