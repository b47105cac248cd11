//! # Contract Events
//!
//! Every successful state change announces itself with an [`Event`]. Events
//! are appended to the emitting contract's [`EventLog`] in the same call that
//! changes state, so an observer that drains the log after each operation
//! sees exactly what happened, in order. A failed operation appends nothing.
//!
//! There is no delivery guarantee beyond that. Indexers pull, the contracts
//! never wait for anyone to acknowledge anything.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::amount::Amount;

/// A notification emitted by a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Tokens moved between accounts. Mints come `from` the zero address,
    /// burns go `to` it.
    Transfer {
        from: Address,
        to: Address,
        amount: Amount,
    },
    /// An allowance was set.
    Approval {
        owner: Address,
        spender: Address,
        amount: Amount,
    },
    /// Single-owner authority changed hands.
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    /// An account was added to a role.
    RoleGranted {
        role: String,
        account: Address,
        sender: Address,
    },
    /// An account was removed from a role.
    RoleRevoked {
        role: String,
        account: Address,
        sender: Address,
    },
    /// Liquidity tokens were locked in the vault.
    Staked { amount: Amount, staker: Address },
    /// Reward tokens were paid out.
    Claimed { amount: Amount, staker: Address },
    /// A position was closed and its liquidity tokens returned.
    Unstaked { amount: Amount, staker: Address },
    /// Vault configuration was replaced or adjusted.
    ConfigChanged {
        liquidity_token: Address,
        reward_token: Address,
        reward_interval_secs: u64,
        reward_share_percent: u128,
        freeze_secs: u64,
    },
}

impl Event {
    /// Short name of the event, mainly for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Transfer { .. } => "Transfer",
            Event::Approval { .. } => "Approval",
            Event::OwnershipTransferred { .. } => "OwnershipTransferred",
            Event::RoleGranted { .. } => "RoleGranted",
            Event::RoleRevoked { .. } => "RoleRevoked",
            Event::Staked { .. } => "Staked",
            Event::Claimed { .. } => "Claimed",
            Event::Unstaked { .. } => "Unstaked",
            Event::ConfigChanged { .. } => "ConfigChanged",
        }
    }
}

/// Append-only list of events emitted by one contract instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<Event>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn emit(&mut self, event: Event) {
        tracing::trace!(event = event.name(), "event emitted");
        self.entries.push(event);
    }

    /// All events not yet drained, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.entries
    }

    /// The most recent event, if any.
    pub fn last(&self) -> Option<&Event> {
        self.entries.last()
    }

    /// Removes and returns everything in the log.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.entries)
    }

    /// Number of undrained events.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there is nothing to drain.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
