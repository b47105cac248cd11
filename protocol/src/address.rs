//! # Addresses
//!
//! Accounts and contracts share one address space: 20 raw bytes, rendered as
//! `0x`-prefixed lowercase hex. The all-zero address is special. It is never a
//! valid owner, spender or recipient, and it shows up as the counterparty in
//! mint and burn `Transfer` events.
//!
//! Contract addresses are derived, not chosen: `BLAKE3(domain || 0x00 || part
//! || 0x00 || ...)` truncated to 20 bytes. The same deployer deploying the same
//! thing always lands on the same address, which keeps tests and replays
//! reproducible.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Length of an address in bytes.
pub const ADDRESS_LENGTH: usize = 20;

/// Errors from parsing an address string.
#[derive(Debug, Error, PartialEq)]
pub enum AddressError {
    /// The string is not valid hex.
    #[error("invalid address hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The decoded bytes are not exactly 20 long.
    #[error("invalid address length: expected {len} bytes, got {0}", len = ADDRESS_LENGTH)]
    InvalidLength(usize),
}

/// A 20-byte account or contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The zero address. Minting comes from here, burning goes to here,
    /// and nobody is allowed to act as it.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Wraps raw bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Returns `true` for [`Address::ZERO`].
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    /// Derives a deterministic address from a domain tag and a list of parts.
    ///
    /// The separator bytes prevent ambiguity when one part's suffix matches
    /// the next part's prefix.
    pub fn derive(domain: &str, parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain.as_bytes());
        for part in parts {
            hasher.update(&[0x00]);
            hasher.update(part);
        }
        let digest = hasher.finalize();
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&digest.as_bytes()[..ADDRESS_LENGTH]);
        Self(bytes)
    }

    /// Convenience for externally owned accounts in tests and fixtures:
    /// `Address::account("alice")` is stable across runs.
    pub fn account(label: &str) -> Self {
        Self::derive("stakepair/account", &[label.as_bytes()])
    }

    /// Returns the `0x`-prefixed hex encoding.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parses a hex address, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)?;
        if bytes.len() != ADDRESS_LENGTH {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        let mut arr = [0u8; ADDRESS_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}...)", &self.to_hex()[..10])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// Hex strings on the wire. JSON map keys must be strings anyway, and nobody
// wants to read a 20-element integer array in an indexer payload.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
