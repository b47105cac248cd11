// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # stakepair Protocol: Shared Primitives
//!
//! The boring-but-load-bearing layer underneath the ledger and the staking
//! vault. Nothing in here moves money on its own; it just makes sure that
//! everything which does move money agrees on what an address is, how wide
//! an amount is, what time it is, and what gets announced afterwards.
//!
//! ## Modules
//!
//! - **address**: 20-byte account and contract addresses, zero address included.
//! - **amount**: `u128` amounts, the infinite-allowance sentinel, and
//!   overflow-free `mul_div` for price conversions.
//! - **clock**: host-supplied time. Contracts never read the wall clock.
//! - **events**: the notifications contracts emit for indexers.
//! - **config**: protocol constants and deploy-time parameter sets.
//! - **logging**: `tracing` subscriber setup for hosts and tests.
//!
//! ## Ground Rules
//!
//! 1. Contracts are deterministic state machines: `(state, caller, args, now)`
//!    in, `(state', result, events)` out. No I/O, no hidden clocks.
//! 2. Money arithmetic is checked. Wrapping is a bug, clamping is a lie.
//! 3. Every public type is serde-serializable so hosts can persist it.

pub mod address;
pub mod amount;
pub mod clock;
pub mod config;
pub mod events;
pub mod logging;

pub use address::Address;
pub use amount::{Amount, INFINITE_ALLOWANCE};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use events::{Event, EventLog};
