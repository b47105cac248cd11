//! # LP Staking Vault Contract
//!
//! Stakers lock a pool's liquidity token here and earn rewards in a second
//! token. The lifecycle of one position is:
//!
//! 1. **Stake**: liquidity tokens move from the staker to the vault against
//!    a prior approval. The first stake starts the accrual clock.
//! 2. **Claim**: any number of times, once at least one reward interval has
//!    passed. Each claim re-prices the *entire* entitlement at the current
//!    pool price and pays the difference to what was already paid.
//! 3. **Unstake**: after the freeze period, the whole position is returned
//!    and the position is wiped.
//!
//! ## Reward Formula
//!
//! With `n = floor((now - stake_timestamp) / reward_interval)`:
//!
//! ```text
//! cumulative_lp     = staked * reward_share / 100 * n       (truncating)
//! cumulative_tokens = floor(cumulative_lp * R_reward / S_lp)
//! payout            = cumulative_tokens - claimed_tokens
//! ```
//!
//! After a successful claim `claimed_tokens = cumulative_tokens`. Note what
//! that means: `claimed_tokens` is the last fully-priced cumulative
//! entitlement, not a running sum of nominal payouts. If the reward token
//! gets cheaper relative to LP between claims, intervals already paid for are
//! retroactively worth more reward tokens and the next payout includes the
//! difference. If it gets more expensive, `payout` can hit zero or go
//! negative, which is reported as [`VaultError::NothingToClaim`]. There are
//! no refunds.
//!
//! ## Collaborators
//!
//! The vault owns positions and config, nothing else. Token ledgers and the
//! pool are passed into each operation, and the vault holds tokens in them
//! as an ordinary account at [`StakingVault::address`]. Every check runs
//! before the first write, so a failed operation leaves the vault, both
//! ledgers, and every event log untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use stakepair_protocol::amount::percent_of;
use stakepair_protocol::config::StakingParams;
use stakepair_protocol::{Address, Amount, Event, EventLog, Timestamp};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::access_control::{AccessError, RoleSet, ADMIN_ROLE};
use crate::price_oracle::{LiquidityPool, OracleError, PriceOracle};
use crate::token_ledger::{LedgerError, TokenLedger};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during vault operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// The caller lacks the admin role.
    #[error(transparent)]
    Unauthorized(#[from] AccessError),

    /// No configuration has been set up yet.
    #[error("vault is not configured")]
    NotConfigured,

    /// The requested configuration is unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A ledger or pool was passed in that is not the configured one.
    #[error("token mismatch: expected {expected}, got {got}")]
    TokenMismatch {
        /// The configured address.
        expected: Address,
        /// The address that was supplied.
        got: Address,
    },

    /// Staking zero is not staking.
    #[error("zero stake")]
    ZeroAmount,

    /// The caller has no open position.
    #[error("nothing staked")]
    NothingToStake,

    /// Not even one reward interval has elapsed since the stake.
    #[error("rewards are not available yet")]
    RewardsNotAvailable,

    /// The re-priced entitlement does not exceed what was already paid.
    #[error("nothing to claim")]
    NothingToClaim,

    /// The freeze period has not elapsed.
    #[error("unstake is not available until {unlocks_at}")]
    UnstakeNotAvailable {
        /// First timestamp at which unstaking succeeds.
        unlocks_at: Timestamp,
    },

    /// A ledger refused a token movement.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The pool could not price the entitlement.
    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Position or reward arithmetic overflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which tokens the vault deals in and how rewards accrue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingConfig {
    /// The pool liquidity token that gets staked.
    pub liquidity_token: Address,
    /// The token rewards are paid in. Must be one of the pool's reserves.
    pub reward_token: Address,
    /// Seconds per reward interval. Always non-zero.
    pub reward_interval_secs: u64,
    /// Percent of the staked amount accrued per interval, in LP units.
    pub reward_share_percent: u128,
    /// Seconds a position stays locked after its first stake.
    pub freeze_secs: u64,
}

impl StakingConfig {
    fn changed_event(&self) -> Event {
        Event::ConfigChanged {
            liquidity_token: self.liquidity_token,
            reward_token: self.reward_token,
            reward_interval_secs: self.reward_interval_secs,
            reward_share_percent: self.reward_share_percent,
            freeze_secs: self.freeze_secs,
        }
    }
}

/// One staker's position. All-zero means "not staked".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePosition {
    /// Liquidity tokens locked in the vault.
    pub staked_amount: Amount,
    /// When the position was opened. Later stakes don't move it.
    pub stake_timestamp: Timestamp,
    /// Cumulative entitlement, in reward tokens, as priced at the last claim.
    pub claimed_tokens: Amount,
}

impl StakePosition {
    /// Returns `true` if nothing is staked.
    pub fn is_empty(&self) -> bool {
        self.staked_amount == 0
    }

    /// Whole reward intervals elapsed at `now`.
    fn intervals(&self, interval_secs: u64, now: Timestamp) -> u64 {
        now.saturating_sub(self.stake_timestamp) / interval_secs
    }
}

/// The reward a claim at a given moment would produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RewardQuote {
    intervals: u64,
    cumulative_tokens: Amount,
}

/// The LP staking vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingVault {
    address: Address,
    roles: RoleSet,
    config: Option<StakingConfig>,
    positions: HashMap<Address, StakePosition>,
    total_staked: Amount,
    events: EventLog,
}

impl StakingVault {
    /// Deploys an unconfigured vault with `deployer` as its first admin.
    ///
    /// The address is derived from `(deployer, nonce)`. Everything except
    /// role management fails with [`VaultError::NotConfigured`] until an
    /// admin calls [`set_up_config`](Self::set_up_config).
    pub fn deploy(deployer: Address, nonce: u64) -> Self {
        let address = Address::derive(
            "stakepair/vault",
            &[deployer.as_bytes(), &nonce.to_be_bytes()],
        );
        let mut events = EventLog::new();
        let roles = RoleSet::new(deployer, &mut events);
        debug!(%address, %deployer, "vault deployed");
        Self {
            address,
            roles,
            config: None,
            positions: HashMap::new(),
            total_staked: 0,
            events,
        }
    }

    // -- Queries --------------------------------------------------------------

    /// The vault's own account address in both ledgers.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Current configuration, if any.
    pub fn config(&self) -> Option<&StakingConfig> {
        self.config.as_ref()
    }

    /// Reward share in percent, zero while unconfigured.
    pub fn reward_share(&self) -> u128 {
        self.config.map_or(0, |c| c.reward_share_percent)
    }

    /// Freeze period in seconds, zero while unconfigured.
    pub fn freeze_time(&self) -> u64 {
        self.config.map_or(0, |c| c.freeze_secs)
    }

    /// Reward interval in seconds, zero while unconfigured.
    pub fn reward_interval(&self) -> u64 {
        self.config.map_or(0, |c| c.reward_interval_secs)
    }

    /// `staker`'s position. All zeros if they never staked or have unstaked.
    pub fn position_of(&self, staker: Address) -> StakePosition {
        self.positions.get(&staker).copied().unwrap_or_default()
    }

    /// Liquidity tokens held on behalf of all stakers.
    pub fn total_staked(&self) -> Amount {
        self.total_staked
    }

    /// Returns `true` if `account` holds `role`.
    pub fn has_role(&self, role: &str, account: Address) -> bool {
        self.roles.has_role(role, account)
    }

    /// What [`claim`](Self::claim) would pay `staker` at `now` against
    /// `pool`. Zero wherever `claim` would fail for position reasons
    /// (nothing staked, no full interval, nothing new to claim).
    pub fn pending_reward(
        &self,
        staker: Address,
        pool: &dyn LiquidityPool,
        now: Timestamp,
    ) -> Result<Amount, VaultError> {
        let config = self.configured()?;
        check_token(config.liquidity_token, pool.liquidity_token())?;
        let position = self.position_of(staker);
        if position.is_empty() {
            return Ok(0);
        }
        let quote = quote(&position, config, pool, now)?;
        Ok(quote
            .cumulative_tokens
            .saturating_sub(position.claimed_tokens))
    }

    /// Undrained events, oldest first.
    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    /// Hands the accumulated events to an observer.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    // -- Administration -------------------------------------------------------

    /// Replaces the whole configuration. Admin only.
    ///
    /// Open positions keep their timestamps and claimed amounts. Swapping
    /// tokens under live positions is allowed but logged loudly.
    ///
    /// # Errors
    ///
    /// [`VaultError::Unauthorized`] for non-admins,
    /// [`VaultError::InvalidConfig`] for a zero reward interval or a reward
    /// token equal to the liquidity token.
    pub fn set_up_config(
        &mut self,
        caller: Address,
        liquidity_token: Address,
        reward_token: Address,
        reward_interval_secs: u64,
        reward_share_percent: u128,
        freeze_secs: u64,
    ) -> Result<(), VaultError> {
        self.roles.check_role(ADMIN_ROLE, caller)?;
        if reward_interval_secs == 0 {
            return Err(VaultError::InvalidConfig(
                "reward interval must be greater than zero".into(),
            ));
        }
        // Rewards would be paid out of staked principal.
        if reward_token == liquidity_token {
            return Err(VaultError::InvalidConfig(
                "reward token must differ from the liquidity token".into(),
            ));
        }

        if self.total_staked > 0 {
            if let Some(old) = self.config {
                if old.liquidity_token != liquidity_token || old.reward_token != reward_token {
                    warn!(
                        vault = %self.address,
                        total_staked = self.total_staked,
                        "token addresses replaced while positions are open"
                    );
                }
            }
        }

        let config = StakingConfig {
            liquidity_token,
            reward_token,
            reward_interval_secs,
            reward_share_percent,
            freeze_secs,
        };
        self.config = Some(config);
        self.events.emit(config.changed_event());
        info!(
            vault = %self.address,
            %liquidity_token,
            %reward_token,
            reward_interval_secs,
            reward_share_percent,
            freeze_secs,
            "config set up"
        );
        Ok(())
    }

    /// [`set_up_config`](Self::set_up_config) with the economics taken from
    /// a loaded [`StakingParams`].
    pub fn set_up_config_from_params(
        &mut self,
        caller: Address,
        liquidity_token: Address,
        reward_token: Address,
        params: &StakingParams,
    ) -> Result<(), VaultError> {
        self.set_up_config(
            caller,
            liquidity_token,
            reward_token,
            params.reward_interval_secs,
            params.reward_share_percent,
            params.freeze_secs,
        )
    }

    /// Overwrites the reward share. Admin only.
    pub fn setup_reward_share(
        &mut self,
        caller: Address,
        reward_share_percent: u128,
    ) -> Result<(), VaultError> {
        self.roles.check_role(ADMIN_ROLE, caller)?;
        let mut config = *self.configured()?;
        config.reward_share_percent = reward_share_percent;
        self.replace_config(config);
        info!(vault = %self.address, reward_share_percent, "reward share updated");
        Ok(())
    }

    /// Overwrites the freeze period. Admin only.
    pub fn setup_freeze_time(
        &mut self,
        caller: Address,
        freeze_secs: u64,
    ) -> Result<(), VaultError> {
        self.roles.check_role(ADMIN_ROLE, caller)?;
        let mut config = *self.configured()?;
        config.freeze_secs = freeze_secs;
        self.replace_config(config);
        info!(vault = %self.address, freeze_secs, "freeze time updated");
        Ok(())
    }

    /// Adds `account` to `role`. Admin only.
    pub fn grant_role(
        &mut self,
        caller: Address,
        role: &str,
        account: Address,
    ) -> Result<(), VaultError> {
        Ok(self
            .roles
            .grant_role(caller, role, account, &mut self.events)?)
    }

    /// Removes `account` from `role`. Admin only.
    pub fn revoke_role(
        &mut self,
        caller: Address,
        role: &str,
        account: Address,
    ) -> Result<(), VaultError> {
        Ok(self
            .roles
            .revoke_role(caller, role, account, &mut self.events)?)
    }

    /// Lets `caller` drop one of its own roles.
    pub fn renounce_role(
        &mut self,
        caller: Address,
        role: &str,
        account: Address,
    ) -> Result<(), VaultError> {
        Ok(self
            .roles
            .renounce_role(caller, role, account, &mut self.events)?)
    }

    // -- Staking --------------------------------------------------------------

    /// Locks `amount` liquidity tokens from `caller` in the vault.
    ///
    /// `caller` must have approved the vault for at least `amount` on the
    /// liquidity ledger beforehand. The first stake of a position sets its
    /// timestamp. Topping up an open position leaves both the timestamp and
    /// `claimed_tokens` alone.
    ///
    /// # Errors
    ///
    /// [`VaultError::ZeroAmount`], [`VaultError::NotConfigured`],
    /// [`VaultError::TokenMismatch`], or a wrapped
    /// [`LedgerError::InsufficientAllowance`] /
    /// [`LedgerError::InsufficientBalance`] from the liquidity ledger.
    pub fn stake(
        &mut self,
        caller: Address,
        amount: Amount,
        liquidity: &mut TokenLedger,
        now: Timestamp,
    ) -> Result<(), VaultError> {
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }
        let config = *self.configured()?;
        check_token(config.liquidity_token, liquidity.address())?;

        let mut position = self.position_of(caller);
        let staked_amount = position
            .staked_amount
            .checked_add(amount)
            .ok_or(VaultError::ArithmeticOverflow)?;
        let total_staked = self
            .total_staked
            .checked_add(amount)
            .ok_or(VaultError::ArithmeticOverflow)?;

        liquidity.transfer_from(self.address, caller, self.address, amount)?;

        if position.is_empty() {
            position.stake_timestamp = now;
        }
        position.staked_amount = staked_amount;
        self.positions.insert(caller, position);
        self.total_staked = total_staked;
        self.events.emit(Event::Staked {
            amount,
            staker: caller,
        });
        debug!(vault = %self.address, staker = %caller, amount, staked_amount, "staked");
        Ok(())
    }

    /// Pays `caller` whatever their re-priced cumulative entitlement exceeds
    /// the previous one by. Returns the amount paid.
    ///
    /// # Errors
    ///
    /// [`VaultError::NothingToStake`] with no open position,
    /// [`VaultError::RewardsNotAvailable`] before one full interval,
    /// [`VaultError::NothingToClaim`] if the re-priced entitlement is not
    /// above what was already paid, a wrapped [`OracleError`] if the pool
    /// can't price, or a wrapped [`LedgerError::InsufficientBalance`] if the
    /// vault holds too few reward tokens.
    pub fn claim(
        &mut self,
        caller: Address,
        reward: &mut TokenLedger,
        pool: &dyn LiquidityPool,
        now: Timestamp,
    ) -> Result<Amount, VaultError> {
        let config = *self.configured()?;
        check_token(config.reward_token, reward.address())?;
        check_token(config.liquidity_token, pool.liquidity_token())?;

        let mut position = self.position_of(caller);
        if position.is_empty() {
            return Err(VaultError::NothingToStake);
        }
        let quote = quote(&position, &config, pool, now)?;
        if quote.intervals == 0 {
            return Err(VaultError::RewardsNotAvailable);
        }
        let payout = quote
            .cumulative_tokens
            .checked_sub(position.claimed_tokens)
            .filter(|p| *p > 0)
            .ok_or(VaultError::NothingToClaim)?;

        reward.transfer(self.address, caller, payout)?;

        position.claimed_tokens = quote.cumulative_tokens;
        self.positions.insert(caller, position);
        self.events.emit(Event::Claimed {
            amount: payout,
            staker: caller,
        });
        debug!(
            vault = %self.address,
            staker = %caller,
            intervals = quote.intervals,
            cumulative = quote.cumulative_tokens,
            payout,
            "claimed"
        );
        Ok(payout)
    }

    /// Returns `caller`'s entire stake once the freeze period is over, and
    /// closes the position. Returns the amount unstaked.
    ///
    /// Closing wipes `stake_timestamp` and `claimed_tokens` along with the
    /// stake. Entitlement that was never claimed is forfeited; claim first.
    ///
    /// # Errors
    ///
    /// [`VaultError::NothingToStake`] with no open position,
    /// [`VaultError::UnstakeNotAvailable`] inside the freeze period.
    pub fn unstake(
        &mut self,
        caller: Address,
        liquidity: &mut TokenLedger,
        now: Timestamp,
    ) -> Result<Amount, VaultError> {
        let config = *self.configured()?;
        check_token(config.liquidity_token, liquidity.address())?;

        let position = self.position_of(caller);
        if position.is_empty() {
            return Err(VaultError::NothingToStake);
        }
        if now.saturating_sub(position.stake_timestamp) < config.freeze_secs {
            return Err(VaultError::UnstakeNotAvailable {
                unlocks_at: position.stake_timestamp.saturating_add(config.freeze_secs),
            });
        }
        let amount = position.staked_amount;
        let total_staked = self
            .total_staked
            .checked_sub(amount)
            .ok_or(VaultError::ArithmeticOverflow)?;

        liquidity.transfer(self.address, caller, amount)?;

        self.positions.remove(&caller);
        self.total_staked = total_staked;
        self.events.emit(Event::Unstaked {
            amount,
            staker: caller,
        });
        debug!(vault = %self.address, staker = %caller, amount, "unstaked");
        Ok(amount)
    }

    // -- Internals ------------------------------------------------------------

    fn configured(&self) -> Result<&StakingConfig, VaultError> {
        self.config.as_ref().ok_or(VaultError::NotConfigured)
    }

    fn replace_config(&mut self, config: StakingConfig) {
        self.config = Some(config);
        self.events.emit(config.changed_event());
    }
}

fn check_token(expected: Address, got: Address) -> Result<(), VaultError> {
    if expected != got {
        return Err(VaultError::TokenMismatch { expected, got });
    }
    Ok(())
}

/// Prices `position`'s full cumulative entitlement at `now`.
fn quote(
    position: &StakePosition,
    config: &StakingConfig,
    pool: &dyn LiquidityPool,
    now: Timestamp,
) -> Result<RewardQuote, VaultError> {
    let intervals = position.intervals(config.reward_interval_secs, now);
    if intervals == 0 {
        return Ok(RewardQuote {
            intervals,
            cumulative_tokens: 0,
        });
    }
    let per_interval = percent_of(position.staked_amount, config.reward_share_percent)
        .map_err(|_| VaultError::ArithmeticOverflow)?;
    let cumulative_lp = per_interval
        .checked_mul(u128::from(intervals))
        .ok_or(VaultError::ArithmeticOverflow)?;
    let cumulative_tokens =
        PriceOracle::new(pool, config.reward_token).price_in_reserve(cumulative_lp)?;
    Ok(RewardQuote {
        intervals,
        cumulative_tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_oracle::PoolSnapshot;
    use stakepair_protocol::config::TokenParams;

    const INTERVAL: u64 = 1_200;
    const FREEZE: u64 = 86_400;
    const START: Timestamp = 1_700_000_000;

    struct Fixture {
        admin: Address,
        user: Address,
        lp: TokenLedger,
        reward: TokenLedger,
        pool: PoolSnapshot,
        vault: StakingVault,
    }

    fn fixture() -> Fixture {
        let admin = Address::account("admin");
        let user = Address::account("user");
        let lp = TokenLedger::deploy(admin, 0, &TokenParams::named("Pair", "LP"), user).unwrap();
        let mut reward =
            TokenLedger::deploy(admin, 1, &TokenParams::named("Reward", "RWD"), admin).unwrap();
        let other = Address::account("other-reserve");
        // 1 LP is worth 2 reward tokens.
        let pool = PoolSnapshot::new(
            lp.address(),
            1_000,
            (reward.address(), 2_000),
            (other, 1_000),
        );
        let mut vault = StakingVault::deploy(admin, 2);
        vault
            .set_up_config(admin, lp.address(), reward.address(), INTERVAL, 10, FREEZE)
            .unwrap();
        reward.mint(admin, vault.address(), 1_000_000).unwrap();
        Fixture {
            admin,
            user,
            lp,
            reward,
            pool,
            vault,
        }
    }

    fn stake(f: &mut Fixture, amount: Amount, now: Timestamp) -> Result<(), VaultError> {
        f.lp.approve(f.user, f.vault.address(), amount).unwrap();
        f.vault.stake(f.user, amount, &mut f.lp, now)
    }

    #[test]
    fn unconfigured_vault_rejects_everything() {
        let admin = Address::account("admin");
        let mut lp =
            TokenLedger::deploy(admin, 0, &TokenParams::named("Pair", "LP"), admin).unwrap();
        let mut vault = StakingVault::deploy(admin, 1);
        assert_eq!(
            vault.stake(admin, 1, &mut lp, START),
            Err(VaultError::NotConfigured)
        );
        assert_eq!(
            vault.setup_reward_share(admin, 5),
            Err(VaultError::NotConfigured)
        );
        assert_eq!(vault.reward_share(), 0);
        assert_eq!(vault.freeze_time(), 0);
    }

    #[test]
    fn zero_interval_rejected() {
        let mut f = fixture();
        let (lp, reward) = (f.lp.address(), f.reward.address());
        assert!(matches!(
            f.vault.set_up_config(f.admin, lp, reward, 0, 10, FREEZE),
            Err(VaultError::InvalidConfig(_))
        ));
        assert_eq!(f.vault.reward_interval(), INTERVAL);
    }

    #[test]
    fn reward_token_must_differ_from_liquidity_token() {
        let mut f = fixture();
        let lp = f.lp.address();
        let events = f.vault.events().len();
        assert!(matches!(
            f.vault.set_up_config(f.admin, lp, lp, INTERVAL, 10, FREEZE),
            Err(VaultError::InvalidConfig(_))
        ));
        assert_eq!(f.vault.config().unwrap().reward_token, f.reward.address());
        assert_eq!(f.vault.events().len(), events);

        // The stake stays redeemable in full.
        stake(&mut f, 100, START).unwrap();
        assert_eq!(f.vault.unstake(f.user, &mut f.lp, START + FREEZE), Ok(100));
        assert_eq!(f.lp.balance_of(f.user), f.lp.total_supply());
    }

    #[test]
    fn inconsistent_total_fails_unstake_without_panicking() {
        let mut f = fixture();
        stake(&mut f, 100, START).unwrap();
        f.vault.total_staked = 40;
        let events = f.vault.events().len();

        assert_eq!(
            f.vault.unstake(f.user, &mut f.lp, START + FREEZE),
            Err(VaultError::ArithmeticOverflow)
        );
        assert_eq!(f.vault.position_of(f.user).staked_amount, 100);
        assert_eq!(f.lp.balance_of(f.vault.address()), 100);
        assert_eq!(f.vault.events().len(), events);
    }

    #[test]
    fn first_stake_sets_clock_top_up_does_not() {
        let mut f = fixture();
        stake(&mut f, 50, START).unwrap();
        stake(&mut f, 50, START + 600).unwrap();
        let position = f.vault.position_of(f.user);
        assert_eq!(position.staked_amount, 100);
        assert_eq!(position.stake_timestamp, START);
        assert_eq!(f.vault.total_staked(), 100);
        assert_eq!(f.lp.balance_of(f.vault.address()), 100);
    }

    #[test]
    fn claim_pays_priced_entitlement() {
        let mut f = fixture();
        stake(&mut f, 100, START).unwrap();
        // 2 intervals * 10% * 100 LP = 20 LP = 40 reward tokens.
        let paid = f
            .vault
            .claim(f.user, &mut f.reward, &f.pool, START + 2 * INTERVAL + 5)
            .unwrap();
        assert_eq!(paid, 40);
        assert_eq!(f.reward.balance_of(f.user), 40);
        assert_eq!(f.vault.position_of(f.user).claimed_tokens, 40);
    }

    #[test]
    fn pending_reward_matches_claim() {
        let mut f = fixture();
        stake(&mut f, 100, START).unwrap();
        let now = START + 3 * INTERVAL;
        let pending = f.vault.pending_reward(f.user, &f.pool, now).unwrap();
        let paid = f.vault.claim(f.user, &mut f.reward, &f.pool, now).unwrap();
        assert_eq!(pending, paid);
        assert_eq!(f.vault.pending_reward(f.user, &f.pool, now).unwrap(), 0);
        assert_eq!(
            f.vault.pending_reward(Address::account("nobody"), &f.pool, now),
            Ok(0)
        );
    }

    #[test]
    fn claim_with_wrong_reward_ledger_is_rejected() {
        let mut f = fixture();
        stake(&mut f, 100, START).unwrap();
        let err = f
            .vault
            .claim(f.user, &mut f.lp, &f.pool, START + INTERVAL)
            .unwrap_err();
        assert!(matches!(err, VaultError::TokenMismatch { .. }));
    }

    #[test]
    fn underfunded_vault_fails_claim_without_side_effects() {
        let mut f = fixture();
        let vault_address = f.vault.address();
        // Same address as the funded reward ledger, but the vault holds 1.
        let mut empty_reward = TokenLedger::deploy(
            f.admin,
            1,
            &TokenParams::named("Reward", "RWD"),
            f.admin,
        )
        .unwrap();
        empty_reward.mint(f.admin, vault_address, 1).unwrap();
        stake(&mut f, 100, START).unwrap();

        let before = f.vault.position_of(f.user);
        let events_before = f.vault.events().len();
        let err = f
            .vault
            .claim(f.user, &mut empty_reward, &f.pool, START + INTERVAL)
            .unwrap_err();
        assert!(matches!(
            err,
            VaultError::Ledger(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(f.vault.position_of(f.user), before);
        assert_eq!(f.vault.events().len(), events_before);
        assert_eq!(empty_reward.balance_of(vault_address), 1);
    }

    #[test]
    fn unstake_wipes_position() {
        let mut f = fixture();
        stake(&mut f, 100, START).unwrap();
        f.vault
            .claim(f.user, &mut f.reward, &f.pool, START + INTERVAL)
            .unwrap();
        let returned = f.vault.unstake(f.user, &mut f.lp, START + FREEZE).unwrap();
        assert_eq!(returned, 100);
        assert_eq!(f.vault.position_of(f.user), StakePosition::default());
        assert_eq!(f.vault.total_staked(), 0);
        assert_eq!(
            f.vault.unstake(f.user, &mut f.lp, START + FREEZE),
            Err(VaultError::NothingToStake)
        );
    }

    #[test]
    fn unstake_reports_unlock_time() {
        let mut f = fixture();
        stake(&mut f, 100, START).unwrap();
        assert_eq!(
            f.vault.unstake(f.user, &mut f.lp, START + FREEZE - 1),
            Err(VaultError::UnstakeNotAvailable {
                unlocks_at: START + FREEZE
            })
        );
    }

    #[test]
    fn admin_updates_emit_config_changed() {
        let mut f = fixture();
        f.vault.drain_events();
        f.vault.setup_reward_share(f.admin, 20).unwrap();
        f.vault.setup_freeze_time(f.admin, 10).unwrap();
        assert_eq!(f.vault.reward_share(), 20);
        assert_eq!(f.vault.freeze_time(), 10);
        let names: Vec<_> = f.vault.events().iter().map(Event::name).collect();
        assert_eq!(names, vec!["ConfigChanged", "ConfigChanged"]);
    }

    #[test]
    fn granted_admin_can_configure() {
        let mut f = fixture();
        let ops = Address::account("ops");
        assert!(f.vault.setup_reward_share(ops, 1).is_err());
        f.vault.grant_role(f.admin, ADMIN_ROLE, ops).unwrap();
        f.vault.setup_reward_share(ops, 1).unwrap();
        assert_eq!(f.vault.reward_share(), 1);
        f.vault.revoke_role(f.admin, ADMIN_ROLE, ops).unwrap();
        assert!(f.vault.setup_reward_share(ops, 2).is_err());
    }
}
