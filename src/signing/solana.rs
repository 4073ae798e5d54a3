//! Solana keypair handling: base58 keypair string to signer and public address.

use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use zeroize::Zeroizing;

use crate::error::{Result, WayfarerError};

/// Parse a base58 encoded 64-byte keypair (secret ++ public).
pub fn solana_keypair(secret: &str) -> Result<Keypair> {
    let bytes = Zeroizing::new(
        bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| WayfarerError::Wallet(format!("Solana key is not valid base58: {}", e)))?,
    );

    if bytes.len() != 64 {
        return Err(WayfarerError::Wallet(format!(
            "Solana keypair must decode to 64 bytes, got {}",
            bytes.len()
        )));
    }

    Keypair::try_from(&bytes[..])
        .map_err(|e| WayfarerError::Wallet(format!("Invalid Solana keypair: {}", e)))
}

/// Public address of a base58 encoded keypair
pub fn solana_address(secret: &str) -> Result<String> {
    Ok(solana_keypair(secret)?.pubkey().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_public_half_of_keypair() {
        let keypair = Keypair::new();
        let encoded = keypair.to_base58_string();
        assert_eq!(solana_address(&encoded).unwrap(), keypair.pubkey().to_string());
        assert_eq!(solana_keypair(&encoded).unwrap().pubkey(), keypair.pubkey());
    }

    #[test]
    fn wrong_length_is_rejected() {
        let encoded = bs58::encode([1u8; 32]).into_string();
        assert!(solana_address(&encoded).is_err());
        assert!(solana_address("0OIl").is_err());
    }

    #[test]
    fn mismatched_public_half_is_rejected() {
        let mut bytes = Keypair::new().to_bytes();
        bytes[32..].copy_from_slice(&Keypair::new().pubkey().to_bytes());
        let encoded = bs58::encode(bytes).into_string();
        assert!(solana_keypair(&encoded).is_err());
    }
}
