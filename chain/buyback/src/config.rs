//! Construction-time configuration
//!
//! Everything a ledger is built from, loadable from JSON. The deployment
//! allowlist file is a bare JSON array of address strings and is read with
//! [`load_allowlist`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use types::ids::Address;
use types::numeric::{Amount, MAX_DECIMALS};

use crate::errors::ConfigError;

/// Fixed forwarding destination, `0xbC49de68bCBD164574847A7ced47e7475179C76B`
pub const DESTINATION_ADDRESS: Address = Address::from_bytes([
    0xbc, 0x49, 0xde, 0x68, 0xbc, 0xbd, 0x16, 0x45, 0x74, 0x84, 0x7a, 0x7c, 0xed, 0x47, 0xe7,
    0x47, 0x51, 0x79, 0xc7, 0x6b,
]);

fn default_destination() -> Address {
    DESTINATION_ADDRESS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuybackConfig {
    /// Identity the ledger holds custody under
    pub ledger: Address,
    pub owner: Address,
    /// Fungible token contract
    pub token: Address,
    /// Collectible collection contract
    pub collectible: Address,
    pub token_decimals: u8,
    #[serde(default = "default_destination")]
    pub destination: Address,
    /// Currency paid per collectible, smallest units
    #[serde(default)]
    pub collectible_rate: Amount,
    #[serde(default)]
    pub allowlist: Vec<Address>,
}

impl BuybackConfig {
    /// Minimal config: fixed destination, zero rate, empty allowlist.
    pub fn new(
        ledger: Address,
        owner: Address,
        token: Address,
        collectible: Address,
        token_decimals: u8,
    ) -> Self {
        Self {
            ledger,
            owner,
            token,
            collectible,
            token_decimals,
            destination: DESTINATION_ADDRESS,
            collectible_rate: 0,
            allowlist: Vec::new(),
        }
    }

    pub fn with_collectible_rate(mut self, rate: Amount) -> Self {
        self.collectible_rate = rate;
        self
    }

    pub fn with_allowlist(mut self, allowlist: Vec<Address>) -> Self {
        self.allowlist = allowlist;
        self
    }

    /// Parse and validate.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_decimals > MAX_DECIMALS {
            return Err(ConfigError::Invalid(format!(
                "token_decimals {} exceeds {}",
                self.token_decimals, MAX_DECIMALS
            )));
        }

        let identities = [
            ("ledger", &self.ledger),
            ("owner", &self.owner),
            ("token", &self.token),
            ("collectible", &self.collectible),
            ("destination", &self.destination),
        ];
        if let Some((name, _)) = identities.iter().find(|(_, id)| id.is_zero()) {
            return Err(ConfigError::Invalid(format!("{name} must not be the zero address")));
        }

        if self.ledger == self.owner {
            return Err(ConfigError::Invalid(
                "ledger and owner must be distinct".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read a bare JSON array of addresses.
pub fn load_allowlist(path: impl AsRef<Path>) -> Result<Vec<Address>, ConfigError> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample() -> BuybackConfig {
        BuybackConfig::new(
            Address::repeat_byte(0x0b),
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x70),
            Address::repeat_byte(0x71),
            18,
        )
    }

    #[test]
    fn test_destination_constant() {
        assert_eq!(
            DESTINATION_ADDRESS,
            "0xbC49de68bCBD164574847A7ced47e7475179C76B"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn test_defaults_applied() {
        let json = r#"{
            "ledger": "0x0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b",
            "owner": "0x0101010101010101010101010101010101010101",
            "token": "0x7070707070707070707070707070707070707070",
            "collectible": "0x7171717171717171717171717171717171717171",
            "token_decimals": 18
        }"#;
        let config = BuybackConfig::from_json_str(json).unwrap();
        assert_eq!(config, sample());
        assert_eq!(config.destination, DESTINATION_ADDRESS);
        assert_eq!(config.collectible_rate, 0);
        assert!(config.allowlist.is_empty());
    }

    #[test]
    fn test_explicit_rate_and_allowlist() {
        let json = r#"{
            "ledger": "0x0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b",
            "owner": "0x0101010101010101010101010101010101010101",
            "token": "0x7070707070707070707070707070707070707070",
            "collectible": "0x7171717171717171717171717171717171717171",
            "token_decimals": 6,
            "collectible_rate": 2000000000000000000,
            "allowlist": ["0x4Eb40136Eda0b3e2cEC97F0B2b006C8F0066Bf89"]
        }"#;
        let config = BuybackConfig::from_json_str(json).unwrap();
        assert_eq!(config.token_decimals, 6);
        assert_eq!(config.collectible_rate, 2_000_000_000_000_000_000);
        assert_eq!(config.allowlist.len(), 1);
    }

    #[test]
    fn test_rejects_excess_decimals() {
        let mut config = sample();
        config.token_decimals = 39;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_zero_identity() {
        let mut config = sample();
        config.token = Address::ZERO;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn test_rejects_ledger_as_owner() {
        let mut config = sample();
        config.owner = config.ledger;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_address_is_parse_error() {
        let json = r#"{"ledger": "0x12", "owner": "0x12", "token": "0x12", "collectible": "0x12", "token_decimals": 18}"#;
        assert!(matches!(
            BuybackConfig::from_json_str(json),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&sample()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = BuybackConfig::from_path(file.path()).unwrap();
        assert_eq!(config, sample());
    }

    #[test]
    fn test_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = BuybackConfig::from_path(dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_allowlist() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"["0x4Eb40136Eda0b3e2cEC97F0B2b006C8F0066Bf89", "0xba7CfbD459dfa75ddBB9901C661804D06fd4DBaC"]"#,
        )
        .unwrap();

        let list = load_allowlist(file.path()).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(
            list[0],
            "0x4eb40136eda0b3e2cec97f0b2b006c8f0066bf89"
                .parse::<Address>()
                .unwrap()
        );
    }
}
