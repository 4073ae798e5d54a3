use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Built once at startup and handed to every component; there is no global
/// settings state, so tests construct their own isolated values.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub gas: GasConfig,
    #[serde(default)]
    pub route: RouteConfig,
    #[serde(default)]
    pub wallets: WalletsConfig,
    #[serde(default)]
    pub amounts: AmountsConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Retry, sleep and proxy policy shared by every action
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Extra attempts after the first one (R); an action runs at most R + 1 times
    #[serde(default = "default_maximum_retry")]
    pub maximum_retry: u32,
    /// Backoff between failed attempts, seconds [min, max]
    #[serde(default = "default_sleep_time_retry")]
    pub sleep_time_retry: (u64, u64),
    /// Pause between two completed route steps, seconds [min, max]
    #[serde(default = "default_sleep_time_modules")]
    pub sleep_time_modules: (u64, u64),
    /// Pause between two accounts, seconds [min, max]
    #[serde(default = "default_sleep_time_accounts")]
    pub sleep_time_accounts: (u64, u64),
    /// Ceiling (P) for the proxy-exhaustion guard
    #[serde(default = "default_proxy_replacement_count")]
    pub proxy_replacement_count: u32,
    /// Route traffic through the account proxies
    #[serde(default = "default_true")]
    pub use_proxy: bool,
    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_maximum_retry() -> u32 {
    3
}

fn default_sleep_time_retry() -> (u64, u64) {
    (5, 10)
}

fn default_sleep_time_modules() -> (u64, u64) {
    (20, 40)
}

fn default_sleep_time_accounts() -> (u64, u64) {
    (60, 120)
}

fn default_proxy_replacement_count() -> u32 {
    3
}

fn default_request_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            maximum_retry: default_maximum_retry(),
            sleep_time_retry: default_sleep_time_retry(),
            sleep_time_modules: default_sleep_time_modules(),
            sleep_time_accounts: default_sleep_time_accounts(),
            proxy_replacement_count: default_proxy_replacement_count(),
            use_proxy: true,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GasConfig {
    /// Hold gas-sensitive actions until the reference chain is cheap enough
    #[serde(default)]
    pub control: bool,
    /// Ceiling used when the cache file is missing or unreadable
    #[serde(default = "default_maximum_gwei")]
    pub maximum_gwei: Decimal,
    /// Seconds between two gas checks
    #[serde(default = "default_sleep_time_gas")]
    pub sleep_time_gas: u64,
    /// Seconds to wait after a failed gas poll that did not rotate endpoints
    #[serde(default = "default_gas_error_sleep")]
    pub error_sleep_secs: u64,
    /// Persisted ceiling, `{ "maximum_gwei": number }`
    #[serde(default = "default_gas_cache_path")]
    pub cache_path: PathBuf,
    /// Chain whose gas price gates every EVM action
    #[serde(default = "default_reference_network")]
    pub reference_network: String,
}

fn default_maximum_gwei() -> Decimal {
    dec!(15)
}

fn default_sleep_time_gas() -> u64 {
    100
}

fn default_gas_error_sleep() -> u64 {
    10
}

fn default_gas_cache_path() -> PathBuf {
    PathBuf::from("data/services/maximum_gwei.json")
}

fn default_reference_network() -> String {
    "Ethereum".to_string()
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            control: false,
            maximum_gwei: default_maximum_gwei(),
            sleep_time_gas: default_sleep_time_gas(),
            error_sleep_secs: default_gas_error_sleep(),
            cache_path: default_gas_cache_path(),
            reference_network: default_reference_network(),
        }
    }
}

/// One step inside a block: a fixed action or a set of candidates.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum BlockStep {
    Fixed(String),
    Choice(Vec<String>),
}

impl BlockStep {
    pub fn candidates(&self) -> Vec<String> {
        match self {
            Self::Fixed(name) => vec![name.clone()],
            Self::Choice(names) => names.clone(),
        }
    }
}

/// One entry of the route grammar.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RouteSlot {
    /// Pick one candidate uniformly; `"skip"` omits the slot
    Choice { choice: Vec<String> },
    /// Alternative fixed sub-sequences feeding the shared block pool
    Blocks { blocks: Vec<Vec<BlockStep>> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    #[serde(default)]
    pub slots: Vec<RouteSlot>,
    /// How many blocks to take from the pool, [min, max]
    #[serde(default = "default_blocks_count")]
    pub blocks_count: (usize, usize),
    /// Network used when a slot does not name one
    #[serde(default = "default_home_network")]
    pub home_network: String,
}

fn default_blocks_count() -> (usize, usize) {
    (1, 1)
}

fn default_home_network() -> String {
    "BeraChain".to_string()
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            blocks_count: default_blocks_count(),
            home_network: default_home_network(),
        }
    }
}

/// An element of an account selection list: a 1-based index or an inclusive range.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SelectionItem {
    Index(usize),
    Range((usize, usize)),
}

/// Account selection by 1-based position in the account directory.
///
/// `Index(0)` means "all" for inclusion and "none" for exclusion.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AccountSelection {
    Index(usize),
    List(Vec<SelectionItem>),
}

impl Default for AccountSelection {
    fn default() -> Self {
        Self::Index(0)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct WalletsConfig {
    #[serde(default)]
    pub to_work: AccountSelection,
    #[serde(default)]
    pub to_exclude: AccountSelection,
    /// Randomize account processing order
    #[serde(default)]
    pub shuffle: bool,
}

/// Amount setting: absolute native units, or percent of the current balance.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct AmountSetting {
    pub min: Decimal,
    pub max: Decimal,
    #[serde(default)]
    pub percent: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AmountsConfig {
    #[serde(default = "default_wrap_amount")]
    pub wrap_native: AmountSetting,
    #[serde(default = "default_transfer_amount")]
    pub transfer_eth: AmountSetting,
    #[serde(default = "default_transfer_amount")]
    pub transfer_native: AmountSetting,
    /// Below this balance the richest network is not worth moving from
    #[serde(default = "default_min_amount_to_bridge")]
    pub min_amount_to_bridge: Decimal,
}

fn default_wrap_amount() -> AmountSetting {
    AmountSetting {
        min: dec!(10),
        max: dec!(20),
        percent: true,
    }
}

fn default_transfer_amount() -> AmountSetting {
    AmountSetting {
        min: dec!(90),
        max: dec!(95),
        percent: true,
    }
}

fn default_min_amount_to_bridge() -> Decimal {
    dec!(0.001)
}

impl Default for AmountsConfig {
    fn default() -> Self {
        Self {
            wrap_native: default_wrap_amount(),
            transfer_eth: default_transfer_amount(),
            transfer_native: default_transfer_amount(),
            min_amount_to_bridge: default_min_amount_to_bridge(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_accounts_file")]
    pub accounts_file: PathBuf,
    #[serde(default = "default_progress_file")]
    pub progress_file: PathBuf,
    #[serde(default = "default_stats_file")]
    pub stats_file: PathBuf,
}

fn default_accounts_file() -> PathBuf {
    PathBuf::from("data/accounts.toml")
}

fn default_progress_file() -> PathBuf {
    PathBuf::from("data/services/wallets_progress.json")
}

fn default_stats_file() -> PathBuf {
    PathBuf::from("data/accounts_stats/wallets_stats.json")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            accounts_file: default_accounts_file(),
            progress_file: default_progress_file(),
            stats_file: default_stats_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    /// Concurrent balance queries, clamped to 1..=100
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_stats_networks")]
    pub networks: Vec<String>,
}

fn default_batch_size() -> usize {
    50
}

fn default_stats_networks() -> Vec<String> {
    vec!["Ethereum".to_string(), "BeraChain".to_string()]
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            networks: default_stats_networks(),
        }
    }
}

impl StatsConfig {
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, 100)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for the daily rolling log file
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            directory: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("WAYFARER_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (WAYFARER__GENERAL__MAXIMUM_RETRY, etc.)
            .add_source(
                Environment::with_prefix("WAYFARER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate values the type system cannot express
    pub fn validate(&self) -> Result<(), String> {
        let ranges = [
            ("general.sleep_time_retry", self.general.sleep_time_retry),
            ("general.sleep_time_modules", self.general.sleep_time_modules),
            ("general.sleep_time_accounts", self.general.sleep_time_accounts),
        ];
        for (name, (min, max)) in ranges {
            if min > max {
                return Err(format!("{} has min {} above max {}", name, min, max));
            }
        }

        let (min_blocks, max_blocks) = self.route.blocks_count;
        if min_blocks > max_blocks {
            return Err(format!(
                "route.blocks_count has min {} above max {}",
                min_blocks, max_blocks
            ));
        }

        for (name, amount) in [
            ("amounts.wrap_native", self.amounts.wrap_native),
            ("amounts.transfer_eth", self.amounts.transfer_eth),
            ("amounts.transfer_native", self.amounts.transfer_native),
        ] {
            if amount.min > amount.max || amount.min < Decimal::ZERO {
                return Err(format!("{} has an invalid range", name));
            }
            if amount.percent && amount.max > dec!(100) {
                return Err(format!("{} percent above 100", name));
            }
        }

        if self.gas.maximum_gwei <= Decimal::ZERO {
            return Err("gas.maximum_gwei must be positive".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert_eq!(config.general.maximum_retry, 3);
        assert_eq!(config.general.proxy_replacement_count, 3);
        assert_eq!(config.route.home_network, "BeraChain");
        assert_eq!(config.gas.reference_network, "Ethereum");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn inverted_sleep_range_is_rejected() {
        let mut config = AppConfig::default();
        config.general.sleep_time_retry = (10, 5);
        let err = config.validate().unwrap_err();
        assert!(err.contains("sleep_time_retry"));
    }

    #[test]
    fn batch_size_is_clamped() {
        let stats = StatsConfig {
            batch_size: 500,
            networks: vec![],
        };
        assert_eq!(stats.effective_batch_size(), 100);
        let stats = StatsConfig {
            batch_size: 0,
            networks: vec![],
        };
        assert_eq!(stats.effective_batch_size(), 1);
    }

    #[test]
    fn route_grammar_parses_from_toml() {
        let raw = r#"
            [route]
            blocks_count = [1, 1]

            [[route.slots]]
            blocks = [["wrap_native", "unwrap_native"], [["transfer_native", "skip"]]]

            [[route.slots]]
            choice = ["wrap_native", "skip"]

            [wallets]
            to_work = [1, [3, 5]]
            to_exclude = 4
        "#;

        let config: AppConfig = Config::builder()
            .add_source(File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.route.slots.len(), 2);
        match &config.route.slots[0] {
            RouteSlot::Blocks { blocks } => {
                assert_eq!(blocks.len(), 2);
                assert_eq!(
                    blocks[1][0],
                    BlockStep::Choice(vec!["transfer_native".into(), "skip".into()])
                );
            }
            other => panic!("expected blocks, got {:?}", other),
        }
        assert_eq!(
            config.wallets.to_work,
            AccountSelection::List(vec![SelectionItem::Index(1), SelectionItem::Range((3, 5))])
        );
        assert_eq!(config.wallets.to_exclude, AccountSelection::Index(4));
    }
}
