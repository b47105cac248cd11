//! # Protocol Configuration & Constants
//!
//! Every magic number in stakepair lives here. If you're hardcoding a reward
//! interval somewhere else, you're doing it wrong.
//!
//! Two parameter sets travel from a deployer's config file into the
//! contracts: [`TokenParams`] for a ledger and [`StakingParams`] for the
//! vault. Both deserialize from JSON with every field optional, so a config
//! file only needs to mention what it wants to change.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::amount::Amount;

// ---------------------------------------------------------------------------
// Token Defaults
// ---------------------------------------------------------------------------

/// 18 decimals, like every ERC-20 that didn't have a reason to be different.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Largest decimal count whose scale factor (`10^38`) still fits in `u128`.
pub const MAX_TOKEN_DECIMALS: u8 = 38;

/// Initial supply credited to the holder at deployment: 1000 whole tokens.
pub const DEFAULT_INITIAL_SUPPLY: Amount = 1_000 * 10u128.pow(DEFAULT_TOKEN_DECIMALS as u32);

/// Default token name and symbol. Deployers are expected to override these.
pub const DEFAULT_TOKEN_NAME: &str = "Test token";
pub const DEFAULT_TOKEN_SYMBOL: &str = "TST";

// ---------------------------------------------------------------------------
// Staking Defaults
// ---------------------------------------------------------------------------

/// Length of one reward interval. A minute is short enough to watch rewards
/// tick on a testnet without falling asleep.
pub const DEFAULT_REWARD_INTERVAL_SECS: u64 = 60;

/// Percentage of the staked amount accrued per interval, in LP-token terms.
pub const DEFAULT_REWARD_SHARE_PERCENT: u128 = 10;

/// Minimum time a position stays locked before `unstake` is allowed.
pub const DEFAULT_FREEZE_SECS: u64 = 120;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Validation failures for parameter sets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Token name is empty.
    #[error("token name must not be empty")]
    EmptyName,

    /// Token symbol is empty.
    #[error("token symbol must not be empty")]
    EmptySymbol,

    /// Decimals past the point where `10^decimals` overflows `u128`.
    #[error("decimals {0} exceeds maximum of {max}", max = MAX_TOKEN_DECIMALS)]
    DecimalsTooLarge(u8),

    /// A zero-length interval would make every claim divide by zero.
    #[error("reward interval must be greater than zero")]
    ZeroRewardInterval,
}

// ---------------------------------------------------------------------------
// Parameter Sets
// ---------------------------------------------------------------------------

/// Deploy-time parameters for a token ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenParams {
    /// Human-readable name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Decimal places of the smallest unit.
    pub decimals: u8,
    /// Supply credited to the initial holder, in the smallest unit.
    pub initial_supply: Amount,
}

impl Default for TokenParams {
    fn default() -> Self {
        Self {
            name: DEFAULT_TOKEN_NAME.to_string(),
            symbol: DEFAULT_TOKEN_SYMBOL.to_string(),
            decimals: DEFAULT_TOKEN_DECIMALS,
            initial_supply: DEFAULT_INITIAL_SUPPLY,
        }
    }
}

impl TokenParams {
    /// Shorthand for the common case of overriding only name and symbol.
    pub fn named(name: &str, symbol: &str) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            ..Default::default()
        }
    }

    /// Checks the parameters for values no ledger should be deployed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.decimals > MAX_TOKEN_DECIMALS {
            return Err(ConfigError::DecimalsTooLarge(self.decimals));
        }
        Ok(())
    }

    /// Loads and validates token parameters from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let params: Self = load_json(path.as_ref())?;
        params
            .validate()
            .with_context(|| format!("invalid token params in {}", path.as_ref().display()))?;
        Ok(params)
    }
}

/// Tunable staking economics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakingParams {
    /// Seconds per reward interval. Must be non-zero.
    pub reward_interval_secs: u64,
    /// Percent of the staked amount accrued per interval.
    pub reward_share_percent: u128,
    /// Lock period before unstaking, in seconds.
    pub freeze_secs: u64,
}

impl Default for StakingParams {
    fn default() -> Self {
        Self {
            reward_interval_secs: DEFAULT_REWARD_INTERVAL_SECS,
            reward_share_percent: DEFAULT_REWARD_SHARE_PERCENT,
            freeze_secs: DEFAULT_FREEZE_SECS,
        }
    }
}

impl StakingParams {
    /// Rejects a zero reward interval. Share and freeze are unsigned, so
    /// non-negativity is the type system's problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reward_interval_secs == 0 {
            return Err(ConfigError::ZeroRewardInterval);
        }
        Ok(())
    }

    /// Loads and validates staking parameters from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let params: Self = load_json(path.as_ref())?;
        params
            .validate()
            .with_context(|| format!("invalid staking params in {}", path.as_ref().display()))?;
        Ok(params)
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_initial_supply_is_1000_tokens() {
        assert_eq!(DEFAULT_INITIAL_SUPPLY, 1_000_000_000_000_000_000_000);
    }

    #[test]
    fn defaults_validate() {
        assert!(TokenParams::default().validate().is_ok());
        assert!(StakingParams::default().validate().is_ok());
    }

    #[test]
    fn token_params_reject_bad_values() {
        let mut params = TokenParams::named("", "TST");
        assert_eq!(params.validate(), Err(ConfigError::EmptyName));

        params = TokenParams::named("Token", "  ");
        assert_eq!(params.validate(), Err(ConfigError::EmptySymbol));

        params = TokenParams {
            decimals: 39,
            ..Default::default()
        };
        assert_eq!(params.validate(), Err(ConfigError::DecimalsTooLarge(39)));
    }

    #[test]
    fn staking_params_reject_zero_interval() {
        let params = StakingParams {
            reward_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(params.validate(), Err(ConfigError::ZeroRewardInterval));
    }

    #[test]
    fn partial_json_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "reward_interval_secs": 1200, "freeze_secs": 86400 }}"#).unwrap();

        let params = StakingParams::from_json_file(file.path()).unwrap();
        assert_eq!(params.reward_interval_secs, 1200);
        assert_eq!(params.freeze_secs, 86400);
        assert_eq!(params.reward_share_percent, DEFAULT_REWARD_SHARE_PERCENT);
    }

    #[test]
    fn invalid_json_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "reward_interval_secs": 0 }}"#).unwrap();
        let err = StakingParams::from_json_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid staking params"));

        let mut garbage = tempfile::NamedTempFile::new().unwrap();
        write!(garbage, "not json").unwrap();
        assert!(TokenParams::from_json_file(garbage.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = TokenParams::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
