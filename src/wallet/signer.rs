//! Secure wallet implementation
//!
//! SECURITY: This is the ONLY place where private keys exist.
//! - Keys are held in alloy's PrivateKeySigner
//! - Keys are never serialized or logged
//! - Swap transactions are signed by the client wallet, so the agent key
//!   only identifies the agent's own account

use crate::{Error, Result};
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use secrecy::{ExposeSecret, SecretString};

/// Wallet that derives the agent's address from its private key
pub struct SecureWallet {
    /// The signer
    signer: PrivateKeySigner,
    /// Public address (safe to expose)
    address: Address,
}

impl SecureWallet {
    /// Create a wallet from a runtime setting value
    ///
    /// Only `0x`-prefixed keys are accepted, the same rule the balance
    /// action uses to decide whether it may run.
    pub fn from_setting(key: &SecretString) -> Result<Self> {
        let key_hex = key.expose_secret();
        if !key_hex.starts_with("0x") {
            return Err(Error::Wallet(
                "Private key must be 0x-prefixed hex".to_string(),
            ));
        }
        Self::from_hex(key_hex)
    }

    /// Create a wallet from a hex-encoded private key
    pub fn from_hex(key_hex: &str) -> Result<Self> {
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| Error::Wallet(format!("Invalid private key: {}", e)))?;

        let address = signer.address();

        Ok(Self { signer, address })
    }

    /// Get the public address (safe to share)
    pub fn address(&self) -> Address {
        self.address
    }
}

// Implement Debug manually to avoid exposing the signer
impl std::fmt::Debug for SecureWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureWallet")
            .field("address", &self.address)
            .field("signer", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test private key (DO NOT use in production!)
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_wallet_from_setting() {
        let key = SecretString::from(TEST_KEY.to_string());
        let wallet = SecureWallet::from_setting(&key).unwrap();

        assert_eq!(
            wallet.address().to_checksum(None).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_setting_requires_prefix() {
        let key = SecretString::from(TEST_KEY.trim_start_matches("0x").to_string());
        assert!(matches!(
            SecureWallet::from_setting(&key),
            Err(Error::Wallet(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let wallet = SecureWallet::from_hex(TEST_KEY).unwrap();

        let debug_str = format!("{:?}", wallet);

        assert!(!debug_str.contains("ac0974bec"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
