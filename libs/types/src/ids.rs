//! Identity types for ledger participants and assets
//!
//! Participants, the owner, the ledger itself, and the token and collection
//! contracts are all identified by a 20-byte account address. Collectibles
//! inside a collection are identified by a numeric id.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of an account address in bytes
pub const ADDRESS_LEN: usize = 20;

/// Errors produced when parsing an address from text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("Address must start with 0x: {0}")]
    MissingPrefix(String),

    #[error("Address must be {expected} hex characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Address contains invalid hex: {0}")]
    InvalidHex(String),
}

/// Canonical 20-byte account identity
///
/// Text form is `0x` followed by 40 hex characters. Parsing accepts any
/// letter case (checksummed or not); display is always lowercase so two
/// spellings of the same address compare and hash equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Address with every byte set to `byte`
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; ADDRESS_LEN])
    }

    /// Address whose low 8 bytes hold `value` big-endian
    pub fn from_low_u64_be(value: u64) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[ADDRESS_LEN - 8..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressParseError::MissingPrefix(trimmed.to_string()))?;

        if digits.len() != ADDRESS_LEN * 2 {
            return Err(AddressParseError::InvalidLength {
                expected: ADDRESS_LEN * 2,
                actual: digits.len(),
            });
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<&str> for Address {
    type Error = AddressParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifier of a single collectible within its collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectibleId(u64);

impl CollectibleId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for CollectibleId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for CollectibleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
