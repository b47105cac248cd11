//! # Access Control
//!
//! Two deliberately separate authorization models:
//!
//! - [`Ownable`]: exactly one owner. The token ledger uses it to gate
//!   minting. Failures read `Ownable: caller is not the owner`.
//! - [`RoleSet`]: named roles with any number of members. The staking vault
//!   uses [`ADMIN_ROLE`] to gate configuration. Failures read
//!   `AccessControl: account <addr> is missing role <role>`.
//!
//! They are not unified behind one trait. Callers and indexers tell them
//! apart by the error text, and that distinction is worth more than the
//! dozen lines a shared abstraction would save.
//!
//! Neither type owns an event log. Mutations take the host contract's
//! [`EventLog`] so that ownership and role changes land in the same stream
//! as everything else the contract emits.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use stakepair_protocol::{Address, Event, EventLog};
use thiserror::Error;
use tracing::{info, warn};

/// The administrative role. Its members may grant and revoke every role,
/// itself included.
pub const ADMIN_ROLE: &str = "DEFAULT_ADMIN_ROLE";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Authorization failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The caller is not the single owner.
    #[error("Ownable: caller is not the owner")]
    NotOwner {
        /// Who tried.
        caller: Address,
    },

    /// Ownership cannot be handed to the zero address. Use
    /// [`Ownable::renounce_ownership`] if that is really what you want.
    #[error("Ownable: new owner is the zero address")]
    ZeroOwner,

    /// The account lacks the role required for the operation.
    #[error("AccessControl: account {account} is missing role {role}")]
    MissingRole {
        /// Who tried.
        account: Address,
        /// The role they needed.
        role: String,
    },

    /// Roles can only be renounced by their holder.
    #[error("AccessControl: can only renounce roles for self")]
    RenounceForOther,

    /// The deploying account's admin role cannot be taken away.
    #[error("AccessControl: admin role of deployer {0} is permanent")]
    PermanentAdmin(Address),
}

// ---------------------------------------------------------------------------
// Ownable
// ---------------------------------------------------------------------------

/// Single-owner authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownable {
    owner: Address,
}

impl Ownable {
    /// Creates the authority with `owner` in charge and records the initial
    /// `OwnershipTransferred(0x0 -> owner)`.
    pub fn new(owner: Address, events: &mut EventLog) -> Self {
        events.emit(Event::OwnershipTransferred {
            previous_owner: Address::ZERO,
            new_owner: owner,
        });
        Self { owner }
    }

    /// The current owner. The zero address after a renounce.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Fails unless `caller` is the owner.
    pub fn only_owner(&self, caller: Address) -> Result<(), AccessError> {
        if caller != self.owner || caller.is_zero() {
            warn!(%caller, owner = %self.owner, "owner check failed");
            return Err(AccessError::NotOwner { caller });
        }
        Ok(())
    }

    /// Hands ownership to `new_owner`.
    ///
    /// # Errors
    ///
    /// [`AccessError::NotOwner`] if `caller` is not the owner,
    /// [`AccessError::ZeroOwner`] if `new_owner` is the zero address.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
        events: &mut EventLog,
    ) -> Result<(), AccessError> {
        self.only_owner(caller)?;
        if new_owner.is_zero() {
            return Err(AccessError::ZeroOwner);
        }
        self.set_owner(new_owner, events);
        Ok(())
    }

    /// Gives up ownership for good. Everything gated by [`only_owner`]
    /// becomes unreachable afterwards.
    ///
    /// [`only_owner`]: Self::only_owner
    pub fn renounce_ownership(
        &mut self,
        caller: Address,
        events: &mut EventLog,
    ) -> Result<(), AccessError> {
        self.only_owner(caller)?;
        self.set_owner(Address::ZERO, events);
        Ok(())
    }

    fn set_owner(&mut self, new_owner: Address, events: &mut EventLog) {
        let previous_owner = std::mem::replace(&mut self.owner, new_owner);
        info!(%previous_owner, %new_owner, "ownership transferred");
        events.emit(Event::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
    }
}

// ---------------------------------------------------------------------------
// RoleSet
// ---------------------------------------------------------------------------

/// Role-based authority.
///
/// Every role is administered by [`ADMIN_ROLE`]. The deploying account holds
/// the admin role from construction and can never lose it, so the admin set
/// is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    deployer: Address,
    members: BTreeMap<String, BTreeSet<Address>>,
}

impl RoleSet {
    /// Creates the role set with `deployer` as the first admin.
    pub fn new(deployer: Address, events: &mut EventLog) -> Self {
        let mut admins = BTreeSet::new();
        admins.insert(deployer);
        let mut members = BTreeMap::new();
        members.insert(ADMIN_ROLE.to_string(), admins);
        events.emit(Event::RoleGranted {
            role: ADMIN_ROLE.to_string(),
            account: deployer,
            sender: deployer,
        });
        Self { deployer, members }
    }

    /// Returns `true` if `account` holds `role`.
    pub fn has_role(&self, role: &str, account: Address) -> bool {
        self.members
            .get(role)
            .is_some_and(|set| set.contains(&account))
    }

    /// Fails with [`AccessError::MissingRole`] unless `account` holds `role`.
    pub fn check_role(&self, role: &str, account: Address) -> Result<(), AccessError> {
        if !self.has_role(role, account) {
            warn!(%account, role, "role check failed");
            return Err(AccessError::MissingRole {
                account,
                role: role.to_string(),
            });
        }
        Ok(())
    }

    /// Members of `role`, in address order.
    pub fn members(&self, role: &str) -> Vec<Address> {
        self.members
            .get(role)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Adds `account` to `role`. Admin only. Granting a role the account
    /// already holds is a silent no-op.
    pub fn grant_role(
        &mut self,
        caller: Address,
        role: &str,
        account: Address,
        events: &mut EventLog,
    ) -> Result<(), AccessError> {
        self.check_role(ADMIN_ROLE, caller)?;
        if self
            .members
            .entry(role.to_string())
            .or_default()
            .insert(account)
        {
            info!(%account, role, sender = %caller, "role granted");
            events.emit(Event::RoleGranted {
                role: role.to_string(),
                account,
                sender: caller,
            });
        }
        Ok(())
    }

    /// Removes `account` from `role`. Admin only. Revoking a role the account
    /// doesn't hold is a silent no-op.
    pub fn revoke_role(
        &mut self,
        caller: Address,
        role: &str,
        account: Address,
        events: &mut EventLog,
    ) -> Result<(), AccessError> {
        self.check_role(ADMIN_ROLE, caller)?;
        self.remove(caller, role, account, events)
    }

    /// Lets `caller` drop one of its own roles.
    pub fn renounce_role(
        &mut self,
        caller: Address,
        role: &str,
        account: Address,
        events: &mut EventLog,
    ) -> Result<(), AccessError> {
        if caller != account {
            return Err(AccessError::RenounceForOther);
        }
        self.remove(caller, role, account, events)
    }

    fn remove(
        &mut self,
        caller: Address,
        role: &str,
        account: Address,
        events: &mut EventLog,
    ) -> Result<(), AccessError> {
        if role == ADMIN_ROLE && account == self.deployer {
            return Err(AccessError::PermanentAdmin(account));
        }
        let removed = self
            .members
            .get_mut(role)
            .is_some_and(|set| set.remove(&account));
        if removed {
            info!(%account, role, sender = %caller, "role revoked");
            events.emit(Event::RoleRevoked {
                role: role.to_string(),
                account,
                sender: caller,
            });
        }
        Ok(())
    }
}
