//! # Price Oracle Adapter
//!
//! The vault pays rewards in a token it prices against an external
//! constant-product pool. This module is the read-only seam to that pool.
//!
//! The pool is modelled as a capability ([`LiquidityPool`]) rather than a
//! concrete AMM. The vault only ever asks three questions: which liquidity
//! token is this, how many of them exist, and how much of asset X sits in the
//! reserves. Anything that can answer those can back the vault, including the
//! in-memory [`PoolSnapshot`] used by hosts and tests.
//!
//! ## Pricing
//!
//! Holding `L` of `S` outstanding liquidity tokens is a claim on `L / S` of
//! every reserve, so `L` liquidity tokens are worth
//!
//! ```text
//! floor(L * R / S)
//! ```
//!
//! units of an asset with reserve `R`. The answer is as fresh as the pool
//! state at the moment of the call. Ask again after a swap and you get a
//! different number, and the vault is fine with that.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stakepair_protocol::amount::{mul_div_floor, AmountError};
use stakepair_protocol::{Address, Amount};
use thiserror::Error;

/// Errors that can occur while pricing liquidity tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The pool has no liquidity tokens outstanding, so there is no price.
    #[error("stale pool: total liquidity supply is zero")]
    StalePool,

    /// The pool holds no reserve of the requested asset.
    #[error("pool has no reserve of asset {0}")]
    UnknownAsset(Address),

    /// The priced amount does not fit in `u128`.
    #[error("price overflow")]
    Overflow,
}

/// Read-only view of an external liquidity pool.
pub trait LiquidityPool {
    /// Address of the pool's liquidity token.
    fn liquidity_token(&self) -> Address;

    /// Total liquidity tokens outstanding.
    fn total_liquidity_supply(&self) -> Amount;

    /// Current reserve of `asset`, or `None` if the pool doesn't hold it.
    fn reserve_of(&self, asset: &Address) -> Option<Amount>;
}

/// Prices liquidity tokens in units of one reserve asset.
#[derive(Clone, Copy)]
pub struct PriceOracle<'a> {
    pool: &'a dyn LiquidityPool,
    asset: Address,
}

impl<'a> PriceOracle<'a> {
    /// Creates an adapter pricing against `pool`'s reserve of `asset`.
    pub fn new(pool: &'a dyn LiquidityPool, asset: Address) -> Self {
        Self { pool, asset }
    }

    /// The asset prices are quoted in.
    pub fn asset(&self) -> Address {
        self.asset
    }

    /// Converts `liquidity_amount` liquidity tokens into the equivalent
    /// amount of the reserve asset: `floor(liquidity_amount * R / S)`.
    ///
    /// # Errors
    ///
    /// [`OracleError::StalePool`] if `S == 0`,
    /// [`OracleError::UnknownAsset`] if the pool has no such reserve,
    /// [`OracleError::Overflow`] if the result exceeds `u128`.
    pub fn price_in_reserve(&self, liquidity_amount: Amount) -> Result<Amount, OracleError> {
        let supply = self.pool.total_liquidity_supply();
        if supply == 0 {
            return Err(OracleError::StalePool);
        }
        let reserve = self
            .pool
            .reserve_of(&self.asset)
            .ok_or(OracleError::UnknownAsset(self.asset))?;
        mul_div_floor(liquidity_amount, reserve, supply).map_err(|e| match e {
            AmountError::DivisionByZero => OracleError::StalePool,
            AmountError::Overflow => OracleError::Overflow,
        })
    }
}

/// A frozen picture of a pool's state.
///
/// Hosts fill this from whatever AMM they talk to right before an operation
/// and hand it to the vault. Tests use it directly and move the price by
/// editing reserves between calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    liquidity_token: Address,
    total_supply: Amount,
    reserves: BTreeMap<Address, Amount>,
}

impl PoolSnapshot {
    /// A two-asset pool with the given reserves and liquidity-token supply.
    pub fn new(
        liquidity_token: Address,
        total_supply: Amount,
        (asset_a, reserve_a): (Address, Amount),
        (asset_b, reserve_b): (Address, Amount),
    ) -> Self {
        let mut reserves = BTreeMap::new();
        reserves.insert(asset_a, reserve_a);
        reserves.insert(asset_b, reserve_b);
        Self {
            liquidity_token,
            total_supply,
            reserves,
        }
    }

    /// Overwrites the reserve of `asset`.
    pub fn set_reserve(&mut self, asset: Address, reserve: Amount) {
        self.reserves.insert(asset, reserve);
    }

    /// Overwrites the liquidity-token supply.
    pub fn set_total_supply(&mut self, total_supply: Amount) {
        self.total_supply = total_supply;
    }
}

impl LiquidityPool for PoolSnapshot {
    fn liquidity_token(&self) -> Address {
        self.liquidity_token
    }

    fn total_liquidity_supply(&self) -> Amount {
        self.total_supply
    }

    fn reserve_of(&self, asset: &Address) -> Option<Amount> {
        self.reserves.get(asset).copied()
    }
}
