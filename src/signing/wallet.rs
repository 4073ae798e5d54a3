use crate::domain::{Account, KeyKind};
use crate::error::{Result, WayfarerError};
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use tracing::debug;
use zeroize::Zeroizing;

/// EVM signer for one account
///
/// # Security
/// The hex key is copied into a zeroizing buffer only for the parse and is
/// wiped right after; only the signer keeps the key material.
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
}

impl Wallet {
    /// Create a wallet from a private key hex string (with or without `0x`)
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let key_hex = Zeroizing::new(
            private_key
                .trim()
                .trim_start_matches("0x")
                .trim_start_matches("0X")
                .to_string(),
        );

        let key_bytes = Zeroizing::new(
            hex::decode(key_hex.as_str())
                .map_err(|e| WayfarerError::Wallet(format!("Private key is not hex: {}", e)))?,
        );
        let signer = PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| WayfarerError::Wallet(format!("Invalid private key: {}", e)))?;

        debug!("Wallet initialized: {}", signer.address());
        Ok(Self { signer })
    }

    /// Build the signer for an account, rejecting non-EVM keys.
    pub fn for_account(account: &Account) -> Result<Self> {
        match account.key_kind()? {
            KeyKind::Evm => Self::from_private_key(account.secret()),
            KeyKind::Solana => Err(WayfarerError::Configuration(format!(
                "Account \"{}\" holds a Solana key, not an EVM key",
                account.name
            ))),
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Wallet filler for alloy providers
    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test private key (DO NOT use in production!)
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_wallet_creation() {
        let wallet = Wallet::from_private_key(TEST_KEY).unwrap();
        // This is the well-known address for this test key
        assert_eq!(
            format!("{:?}", wallet.address()).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert_eq!(
            Wallet::from_private_key(&TEST_KEY[2..]).unwrap().address(),
            wallet.address()
        );
    }

    #[test]
    fn solana_account_is_rejected() {
        let account = Account::new(
            "sol",
            solana_sdk::signature::Keypair::new().to_base58_string(),
            None,
            None,
        );
        assert!(matches!(
            Wallet::for_account(&account),
            Err(WayfarerError::Configuration(_))
        ));
    }

    #[test]
    fn debug_shows_only_address() {
        let wallet = Wallet::from_private_key(TEST_KEY).unwrap();
        let printed = format!("{:?}", wallet);
        assert!(!printed.contains("ac0974"));
    }
}
