use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::error::{Result, WayfarerError};

/// Which client family a secret key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Evm,
    Solana,
}

impl KeyKind {
    /// Route a secret key to its client family.
    ///
    /// 64 hex chars (66 with `0x`) is an EVM key, a base58 string decoding to
    /// a 64-byte keypair is a Solana key, anything else is rejected.
    pub fn detect(secret: &str) -> Result<Self> {
        let secret = secret.trim();
        let hex_body = secret
            .strip_prefix("0x")
            .or_else(|| secret.strip_prefix("0X"))
            .unwrap_or(secret);

        let looks_evm = (secret.len() == 66 && hex_body.len() == 64) || secret.len() == 64;
        if looks_evm && hex_body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(Self::Evm);
        }

        if bs58::decode(secret)
            .into_vec()
            .map(|bytes| Zeroizing::new(bytes).len() == 64)
            .unwrap_or(false)
        {
            return Ok(Self::Solana);
        }

        Err(WayfarerError::Configuration(format!(
            "Private key of length {} is neither an EVM nor a Solana key",
            secret.len()
        )))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Evm => "evm",
            Self::Solana => "solana",
        }
    }
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One managed wallet. Immutable once loaded.
#[derive(Clone)]
pub struct Account {
    pub name: String,
    secret: Zeroizing<String>,
    pub proxy: Option<String>,
    pub transfer_address: Option<String>,
}

impl Account {
    pub fn new(
        name: impl Into<String>,
        secret: impl Into<String>,
        proxy: Option<String>,
        transfer_address: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            secret: Zeroizing::new(secret.into()),
            proxy: proxy.filter(|p| !p.trim().is_empty()).map(|p| p.trim().to_string()),
            transfer_address: transfer_address
                .filter(|a| !a.trim().is_empty())
                .map(|a| a.trim().to_string()),
        }
    }

    /// Secret key material; never log this
    pub fn secret(&self) -> &str {
        self.secret.as_str().trim()
    }

    pub fn key_kind(&self) -> Result<KeyKind> {
        KeyKind::detect(self.secret())
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .field("proxy", &self.proxy)
            .field("transfer_address", &self.transfer_address)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct AccountRow {
    #[serde(default)]
    name: Option<String>,
    private_key: String,
    #[serde(default)]
    proxy: Option<String>,
    #[serde(default)]
    transfer_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountsFile {
    #[serde(default)]
    accounts: Vec<AccountRow>,
}

/// Accounts in load order plus the shared proxy pool
#[derive(Debug, Clone)]
pub struct AccountDirectory {
    accounts: Vec<Account>,
    proxy_pool: Arc<[String]>,
}

impl AccountDirectory {
    /// Build a directory; duplicate names are rejected.
    pub fn new(accounts: Vec<Account>) -> Result<Self> {
        let mut seen = HashSet::new();
        for account in &accounts {
            if !seen.insert(account.name.clone()) {
                return Err(WayfarerError::Configuration(format!(
                    "Duplicate account name \"{}\"",
                    account.name
                )));
            }
        }

        let mut pool: Vec<String> = Vec::new();
        for proxy in accounts.iter().filter_map(|a| a.proxy.clone()) {
            if !pool.contains(&proxy) {
                pool.push(proxy);
            }
        }

        Ok(Self {
            accounts,
            proxy_pool: pool.into(),
        })
    }

    /// Load `[[accounts]]` rows from a TOML file.
    ///
    /// Rows without a name are skipped. With `use_proxy = false` every proxy is
    /// dropped so clients connect directly.
    pub fn load(path: impl AsRef<Path>, use_proxy: bool) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            WayfarerError::Configuration(format!(
                "Can not read accounts file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&raw, use_proxy)
    }

    pub fn parse(raw: &str, use_proxy: bool) -> Result<Self> {
        let file: AccountsFile = toml::from_str(raw)
            .map_err(|e| WayfarerError::Configuration(format!("Bad accounts file: {}", e)))?;

        let mut accounts = Vec::with_capacity(file.accounts.len());
        for (index, row) in file.accounts.into_iter().enumerate() {
            let name = match row.name.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => {
                    warn!("Skipping account row {} without a name", index + 1);
                    continue;
                }
            };
            if row.private_key.trim().is_empty() {
                return Err(WayfarerError::Configuration(format!(
                    "Account \"{}\" has no private key",
                    name
                )));
            }
            let proxy = if use_proxy { row.proxy } else { None };
            accounts.push(Account::new(name, row.private_key, proxy, row.transfer_address));
        }

        let directory = Self::new(accounts)?;
        info!(
            "Loaded {} accounts ({} proxies in pool)",
            directory.len(),
            directory.proxy_pool.len()
        );
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn names(&self) -> Vec<String> {
        self.accounts.iter().map(|a| a.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.name == name)
    }

    pub fn proxy_pool(&self) -> Arc<[String]> {
        Arc::clone(&self.proxy_pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVM_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn solana_key() -> String {
        solana_sdk::signature::Keypair::new().to_base58_string()
    }

    #[test]
    fn evm_key_with_and_without_prefix() {
        assert_eq!(KeyKind::detect(EVM_KEY).unwrap(), KeyKind::Evm);
        assert_eq!(KeyKind::detect(&EVM_KEY[2..]).unwrap(), KeyKind::Evm);
    }

    #[test]
    fn solana_keypair_is_detected() {
        assert_eq!(KeyKind::detect(&solana_key()).unwrap(), KeyKind::Solana);
    }

    #[test]
    fn other_lengths_are_rejected() {
        let public_key_only = bs58::encode([7u8; 32]).into_string();
        let too_long = "z".repeat(88);
        for bad in ["", "0x1234", &"a".repeat(70), &"0".repeat(88), &public_key_only, &too_long] {
            let err = KeyKind::detect(bad).unwrap_err();
            assert!(matches!(err, WayfarerError::Configuration(_)), "{bad}");
        }
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let account = Account::new("main", EVM_KEY, Some("user:pass@1.2.3.4:80".into()), None);
        let printed = format!("{:?}", account);
        assert!(!printed.contains("ac0974"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn parse_builds_proxy_pool_and_skips_nameless_rows() {
        let raw = format!(
            r#"
            [[accounts]]
            name = "one"
            private_key = "{key}"
            proxy = "u:p@10.0.0.1:8000"

            [[accounts]]
            private_key = "{key}"

            [[accounts]]
            name = "two"
            private_key = "{key}"
            proxy = "u:p@10.0.0.2:8000"
            transfer_address = "0x000000000000000000000000000000000000dEaD"

            [[accounts]]
            name = "three"
            private_key = "{key}"
            proxy = "u:p@10.0.0.1:8000"
            "#,
            key = EVM_KEY
        );

        let directory = AccountDirectory::parse(&raw, true).unwrap();
        assert_eq!(directory.names(), vec!["one", "two", "three"]);
        assert_eq!(directory.proxy_pool().len(), 2);
        assert!(directory.get("two").unwrap().transfer_address.is_some());

        let direct = AccountDirectory::parse(&raw, false).unwrap();
        assert!(direct.proxy_pool().is_empty());
        assert!(direct.get("one").unwrap().proxy.is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let accounts = vec![
            Account::new("dup", EVM_KEY, None, None),
            Account::new("dup", EVM_KEY, None, None),
        ];
        assert!(matches!(
            AccountDirectory::new(accounts),
            Err(WayfarerError::Configuration(_))
        ));
    }
}
