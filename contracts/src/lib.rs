//! # Stakepair Contracts
//!
//! The contract layer: a fungible token ledger and a vault that pays rewards
//! for parking pool liquidity tokens. Nothing here knows about blocks,
//! transactions, or gas. Every operation is a plain method taking the caller,
//! the arguments, and (where time matters) `now`, and returning a `Result`:
//!
//! - **Token Ledger**: balances, allowances with an infinite sentinel,
//!   owner-gated minting, and burn.
//! - **Access Control**: single-owner and role-based gates shared by the
//!   other two.
//! - **Price Oracle**: turns an amount of pool liquidity tokens into its
//!   share of one reserve.
//! - **Staking Vault**: stake, claim re-priced rewards, unstake after a
//!   freeze.
//!
//! ## Design Principles
//!
//! 1. Validate everything, then mutate. A returned error means no balance,
//!    allowance, position, or event changed anywhere.
//! 2. Money is `u128` and all of it is checked. Pricing goes through a 256-bit
//!    intermediate so `amount * reserve` can't overflow before the divide.
//! 3. The vault never owns a ledger. Ledgers and the pool are passed in per
//!    call, and the vault is just another account holder in them.
//! 4. Every public state type is serializable (serde), so a host can persist
//!    whole contracts between calls.

pub mod access_control;
pub mod price_oracle;
pub mod staking_vault;
pub mod token_ledger;

pub use access_control::{AccessError, Ownable, RoleSet, ADMIN_ROLE};
pub use price_oracle::{LiquidityPool, OracleError, PoolSnapshot, PriceOracle};
pub use staking_vault::{StakePosition, StakingConfig, StakingVault, VaultError};
pub use token_ledger::{LedgerError, TokenLedger};
