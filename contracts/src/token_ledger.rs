//! # Token Ledger Contract
//!
//! Balances, allowances and total supply for one fungible token. The shape
//! will be familiar to anyone who has read an ERC-20: `transfer`, `approve`,
//! `transfer_from`, plus owner-gated `mint` and holder-initiated `burn`.
//!
//! ## Invariants
//!
//! - `total_supply == Σ balances` after every operation, successful or not.
//! - Nothing underflows. An operation that would take a balance or an
//!   allowance below zero fails instead.
//! - An allowance of [`INFINITE_ALLOWANCE`] is never decremented.
//! - The zero address never owns, spends, or receives. It only appears as the
//!   counterparty in mint and burn `Transfer` events.
//!
//! ## Atomicity
//!
//! Every operation validates fully before it writes anything, so a returned
//! error means the ledger (events included) is exactly as it was.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use stakepair_protocol::config::{ConfigError, TokenParams};
use stakepair_protocol::{Address, Amount, Event, EventLog, INFINITE_ALLOWANCE};
use thiserror::Error;
use tracing::debug;

use crate::access_control::{AccessError, Ownable};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The debited account holds less than the requested amount.
    #[error("insufficient balance: account has {available}, requested {requested}")]
    InsufficientBalance {
        /// Current balance.
        available: Amount,
        /// Amount the operation needed.
        requested: Amount,
    },

    /// The spender's allowance is smaller than the requested amount.
    #[error("insufficient allowance: approved {available}, requested {requested}")]
    InsufficientAllowance {
        /// Current allowance.
        available: Amount,
        /// Amount the operation needed.
        requested: Amount,
    },

    /// Tokens cannot be sent or minted to the zero address.
    #[error("invalid recipient: the zero address")]
    InvalidRecipient,

    /// The zero address cannot own, approve, or burn.
    #[error("invalid owner: the zero address")]
    InvalidOwner,

    /// The zero address cannot be approved as a spender.
    #[error("invalid spender: the zero address")]
    InvalidSpender,

    /// The caller lacks mint authority.
    #[error(transparent)]
    Unauthorized(#[from] AccessError),

    /// Minting would push total supply past `u128::MAX`.
    #[error("supply overflow: minting {amount} would exceed u128::MAX")]
    SupplyOverflow {
        /// The amount that was attempted.
        amount: Amount,
    },

    /// Increasing an allowance would overflow. Approve
    /// [`INFINITE_ALLOWANCE`] directly if unlimited is the goal.
    #[error("allowance overflow")]
    AllowanceOverflow,

    /// Stored balances and supply disagree, so the books can't be updated.
    #[error("arithmetic overflow: balances inconsistent with total supply")]
    ArithmeticOverflow,

    /// Deployment parameters failed validation.
    #[error("invalid token params: {0}")]
    InvalidParams(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// TokenLedger
// ---------------------------------------------------------------------------

/// One fungible token: metadata, supply, balances, allowances, and the
/// events describing how they got that way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLedger {
    /// Where this ledger lives. Derived from deployer and nonce.
    address: Address,
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: Amount,
    /// Mint authority.
    ownership: Ownable,
    balances: HashMap<Address, Amount>,
    /// `owner -> (spender -> amount)`.
    allowances: HashMap<Address, HashMap<Address, Amount>>,
    events: EventLog,
}

impl TokenLedger {
    /// Deploys a ledger, crediting `params.initial_supply` to `holder`.
    ///
    /// The deployer becomes the owner (the only account that may mint). The
    /// ledger's address is derived from `(deployer, nonce)` the way contract
    /// addresses are on account-based chains, so redeploying with the same
    /// pair reproduces the same address.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidParams`] if `params` fail validation and
    /// [`LedgerError::InvalidRecipient`] if `holder` is the zero address.
    pub fn deploy(
        deployer: Address,
        nonce: u64,
        params: &TokenParams,
        holder: Address,
    ) -> Result<Self, LedgerError> {
        params.validate()?;
        if holder.is_zero() {
            return Err(LedgerError::InvalidRecipient);
        }

        let address = Address::derive(
            "stakepair/ledger",
            &[deployer.as_bytes(), &nonce.to_be_bytes()],
        );

        let mut events = EventLog::new();
        let ownership = Ownable::new(deployer, &mut events);

        let mut balances = HashMap::new();
        balances.insert(holder, params.initial_supply);
        events.emit(Event::Transfer {
            from: Address::ZERO,
            to: holder,
            amount: params.initial_supply,
        });

        debug!(
            %address,
            symbol = %params.symbol,
            initial_supply = params.initial_supply,
            %holder,
            "ledger deployed"
        );

        Ok(Self {
            address,
            name: params.name.clone(),
            symbol: params.symbol.clone(),
            decimals: params.decimals,
            total_supply: params.initial_supply,
            ownership,
            balances,
            allowances: HashMap::new(),
            events,
        })
    }

    // -- Queries --------------------------------------------------------------

    /// This ledger's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Human-readable token name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Decimal places of the smallest unit.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// The mint authority. Zero after a renounce.
    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    /// Balance of `account`, zero if it never held anything.
    pub fn balance_of(&self, account: Address) -> Amount {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    /// What `spender` may still move out of `owner`'s balance.
    pub fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.allowances
            .get(&owner)
            .and_then(|m| m.get(&spender))
            .copied()
            .unwrap_or(0)
    }

    /// Every account with a recorded balance. Order is unspecified.
    pub fn balances(&self) -> impl Iterator<Item = (Address, Amount)> + '_ {
        self.balances.iter().map(|(a, b)| (*a, *b))
    }

    /// Undrained events, oldest first.
    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    /// Hands the accumulated events to an observer.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    // -- Transfers ------------------------------------------------------------

    /// Moves `amount` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidOwner`] if `from` is zero,
    /// [`LedgerError::InvalidRecipient`] if `to` is zero,
    /// [`LedgerError::InsufficientBalance`] if `from` can't cover it.
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let (debited, credited) = self.plan_move(from, to, amount)?;
        self.apply_move(from, debited, to, credited, amount);
        Ok(())
    }

    /// Sets `owner`'s allowance for `spender` to exactly `amount`.
    ///
    /// Overwrites, does not add. Approving the same amount twice is
    /// indistinguishable from approving it once (apart from the second
    /// `Approval` event).
    pub fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if owner.is_zero() {
            return Err(LedgerError::InvalidOwner);
        }
        if spender.is_zero() {
            return Err(LedgerError::InvalidSpender);
        }
        self.set_allowance(owner, spender, amount);
        Ok(())
    }

    /// `spender` moves `amount` from `from` to `to` against its allowance.
    ///
    /// A finite allowance is reduced by exactly `amount` and the new value is
    /// announced with an `Approval` ahead of the `Transfer`. An
    /// [`INFINITE_ALLOWANCE`] stays infinite and silent. The allowance is
    /// checked before the balance, so asking for more than both reports the
    /// allowance.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                available: allowed,
                requested: amount,
            });
        }
        let (debited, credited) = self.plan_move(from, to, amount)?;

        if allowed != INFINITE_ALLOWANCE {
            // Underflow ruled out by the check above.
            self.set_allowance(from, spender, allowed - amount);
        }
        self.apply_move(from, debited, to, credited, amount);
        Ok(())
    }

    /// Raises an allowance by `added`.
    pub fn increase_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        added: Amount,
    ) -> Result<(), LedgerError> {
        let raised = self
            .allowance(owner, spender)
            .checked_add(added)
            .ok_or(LedgerError::AllowanceOverflow)?;
        self.approve(owner, spender, raised)
    }

    /// Lowers an allowance by `subtracted`. Going below zero is an error, not
    /// a clamp.
    pub fn decrease_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        subtracted: Amount,
    ) -> Result<(), LedgerError> {
        let current = self.allowance(owner, spender);
        let lowered = current
            .checked_sub(subtracted)
            .ok_or(LedgerError::InsufficientAllowance {
                available: current,
                requested: subtracted,
            })?;
        self.approve(owner, spender, lowered)
    }

    // -- Supply ---------------------------------------------------------------

    /// Creates `amount` new tokens in `to`'s balance. Owner only.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Unauthorized`] unless `caller` is the owner,
    /// [`LedgerError::InvalidRecipient`] if `to` is zero,
    /// [`LedgerError::SupplyOverflow`] if supply would exceed `u128::MAX`.
    pub fn mint(
        &mut self,
        caller: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.ownership.only_owner(caller)?;
        if to.is_zero() {
            return Err(LedgerError::InvalidRecipient);
        }
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow { amount })?;
        let new_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        self.total_supply = new_supply;
        self.balances.insert(to, new_balance);
        self.events.emit(Event::Transfer {
            from: Address::ZERO,
            to,
            amount,
        });
        debug!(ledger = %self.address, %to, amount, total_supply = new_supply, "minted");
        Ok(())
    }

    /// Destroys `amount` of `caller`'s own tokens.
    pub fn burn(&mut self, caller: Address, amount: Amount) -> Result<(), LedgerError> {
        if caller.is_zero() {
            return Err(LedgerError::InvalidOwner);
        }
        let available = self.balance_of(caller);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        let new_supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        self.balances.insert(caller, available - amount);
        self.total_supply = new_supply;
        self.events.emit(Event::Transfer {
            from: caller,
            to: Address::ZERO,
            amount,
        });
        debug!(
            ledger = %self.address,
            %caller,
            amount,
            total_supply = self.total_supply,
            "burned"
        );
        Ok(())
    }

    // -- Ownership ------------------------------------------------------------

    /// Hands mint authority to `new_owner`.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), LedgerError> {
        Ok(self
            .ownership
            .transfer_ownership(caller, new_owner, &mut self.events)?)
    }

    /// Gives up mint authority permanently.
    pub fn renounce_ownership(&mut self, caller: Address) -> Result<(), LedgerError> {
        Ok(self.ownership.renounce_ownership(caller, &mut self.events)?)
    }

    // -- Internals ------------------------------------------------------------

    /// Validates a balance move and returns the post-move balances of `from`
    /// and `to` without touching state.
    fn plan_move(
        &self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(Amount, Amount), LedgerError> {
        if from.is_zero() {
            return Err(LedgerError::InvalidOwner);
        }
        if to.is_zero() {
            return Err(LedgerError::InvalidRecipient);
        }
        let available = self.balance_of(from);
        let debited = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            })?;
        // Self-transfers credit the already-debited balance.
        let credited = if from == to {
            available
        } else {
            self.balance_of(to)
                .checked_add(amount)
                .ok_or(LedgerError::ArithmeticOverflow)?
        };
        Ok((debited, credited))
    }

    fn apply_move(
        &mut self,
        from: Address,
        debited: Amount,
        to: Address,
        credited: Amount,
        amount: Amount,
    ) {
        self.balances.insert(from, debited);
        self.balances.insert(to, credited);
        self.events.emit(Event::Transfer { from, to, amount });
        debug!(ledger = %self.address, %from, %to, amount, "transfer");
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, amount: Amount) {
        self.allowances
            .entry(owner)
            .or_default()
            .insert(spender, amount);
        self.events.emit(Event::Approval {
            owner,
            spender,
            amount,
        });
        debug!(ledger = %self.address, %owner, %spender, amount, "approval");
    }
}
