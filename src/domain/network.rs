use serde::Serialize;

use crate::error::{Result, WayfarerError};

/// Fee model of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeModel {
    /// Single `gasPrice`
    Legacy,
    /// EIP-1559 base fee plus tip
    Dynamic,
    /// Not an EVM chain; gas gating does not apply
    NotApplicable,
}

/// Static chain metadata shared read-only by every account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkDescriptor {
    pub name: &'static str,
    pub rpc: &'static [&'static str],
    pub chain_id: u64,
    pub token: &'static str,
    pub fee_model: FeeModel,
    pub explorer: &'static str,
    pub decimals: u8,
    /// Wrapped native token contract, when the chain has one we use
    pub wrapped_native: Option<&'static str>,
}

impl NetworkDescriptor {
    pub fn is_solana(&self) -> bool {
        self.fee_model == FeeModel::NotApplicable
    }

    pub fn eip1559(&self) -> bool {
        self.fee_model == FeeModel::Dynamic
    }

    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}tx/{}", self.explorer, tx_hash)
    }
}

impl std::fmt::Display for NetworkDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub const BERACHAIN: NetworkDescriptor = NetworkDescriptor {
    name: "BeraChain",
    rpc: &["https://bartio.rpc.berachain.com"],
    chain_id: 80084,
    token: "BERA",
    fee_model: FeeModel::Dynamic,
    explorer: "https://bartio.beratrail.io/",
    decimals: 18,
    wrapped_native: Some("0x7507c1dc16935B82698e4C63f2746A2fCf994dF8"),
};

pub const ETHEREUM: NetworkDescriptor = NetworkDescriptor {
    name: "Ethereum",
    rpc: &["https://eth.drpc.org"],
    chain_id: 1,
    token: "ETH",
    fee_model: FeeModel::Legacy,
    explorer: "https://etherscan.io/",
    decimals: 18,
    wrapped_native: Some("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
};

pub const SCROLL: NetworkDescriptor = NetworkDescriptor {
    name: "Scroll",
    rpc: &["https://rpc.scroll.io", "https://rpc.ankr.com/scroll"],
    chain_id: 534352,
    token: "ETH",
    fee_model: FeeModel::Legacy,
    explorer: "https://scrollscan.com/",
    decimals: 18,
    wrapped_native: Some("0x5300000000000000000000000000000000000004"),
};

pub const ARBITRUM: NetworkDescriptor = NetworkDescriptor {
    name: "Arbitrum",
    rpc: &["https://arb1.arbitrum.io/rpc"],
    chain_id: 42161,
    token: "ETH",
    fee_model: FeeModel::Legacy,
    explorer: "https://arbiscan.io/",
    decimals: 18,
    wrapped_native: Some("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1"),
};

pub const POLYGON: NetworkDescriptor = NetworkDescriptor {
    name: "Polygon",
    rpc: &["https://polygon-rpc.com"],
    chain_id: 137,
    token: "MATIC",
    fee_model: FeeModel::Legacy,
    explorer: "https://polygonscan.com/",
    decimals: 18,
    wrapped_native: Some("0x0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270"),
};

pub const AVALANCHE: NetworkDescriptor = NetworkDescriptor {
    name: "Avalanche",
    rpc: &["https://avalanche.drpc.org"],
    chain_id: 43114,
    token: "AVAX",
    fee_model: FeeModel::Legacy,
    explorer: "https://snowtrace.io/",
    decimals: 18,
    wrapped_native: Some("0xB31f66AA3C1e785363F0875A1B74E27b85FD66c7"),
};

pub const ARBITRUM_NOVA: NetworkDescriptor = NetworkDescriptor {
    name: "Arbitrum Nova",
    rpc: &[
        "https://rpc.ankr.com/arbitrumnova",
        "https://arbitrum-nova.publicnode.com",
        "https://arbitrum-nova.drpc.org",
        "https://nova.arbitrum.io/rpc",
    ],
    chain_id: 42170,
    token: "ETH",
    fee_model: FeeModel::Legacy,
    explorer: "https://nova.arbiscan.io/",
    decimals: 18,
    wrapped_native: Some("0x722E8BdD2ce80A4422E880164f2079488e115365"),
};

pub const BASE: NetworkDescriptor = NetworkDescriptor {
    name: "Base",
    rpc: &["https://mainnet.base.org"],
    chain_id: 8453,
    token: "ETH",
    fee_model: FeeModel::Legacy,
    explorer: "https://basescan.org/",
    decimals: 18,
    wrapped_native: Some("0x4200000000000000000000000000000000000006"),
};

pub const LINEA: NetworkDescriptor = NetworkDescriptor {
    name: "Linea",
    rpc: &["https://rpc.linea.build"],
    chain_id: 59144,
    token: "ETH",
    fee_model: FeeModel::Legacy,
    explorer: "https://lineascan.build/",
    decimals: 18,
    wrapped_native: Some("0xe5D7C2a44FfDDf6b295A15c148167daaAf5Cf34f"),
};

pub const ZORA: NetworkDescriptor = NetworkDescriptor {
    name: "Zora",
    rpc: &["https://rpc.zora.energy"],
    chain_id: 7777777,
    token: "ETH",
    fee_model: FeeModel::Legacy,
    explorer: "https://zora.superscan.network/",
    decimals: 18,
    wrapped_native: Some("0x4200000000000000000000000000000000000006"),
};

pub const POLYGON_ZKEVM: NetworkDescriptor = NetworkDescriptor {
    name: "Polygon zkEVM",
    rpc: &[
        "https://1rpc.io/polygon/zkevm",
        "https://zkevm-rpc.com",
        "https://rpc.ankr.com/polygon_zkevm",
    ],
    chain_id: 1101,
    token: "ETH",
    fee_model: FeeModel::Legacy,
    explorer: "https://zkevm.polygonscan.com/",
    decimals: 18,
    wrapped_native: Some("0x4F9A0e7FD2Bf6067db6994CF12E4495Df938E6e9"),
};

pub const BNB_CHAIN: NetworkDescriptor = NetworkDescriptor {
    name: "BNB Chain",
    rpc: &["https://binance.llamarpc.com"],
    chain_id: 56,
    token: "BNB",
    fee_model: FeeModel::Legacy,
    explorer: "https://bscscan.com/",
    decimals: 18,
    wrapped_native: Some("0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"),
};

pub const MANTA: NetworkDescriptor = NetworkDescriptor {
    name: "Manta",
    rpc: &["https://pacific-rpc.manta.network/http", "https://1rpc.io/manta"],
    chain_id: 169,
    token: "ETH",
    fee_model: FeeModel::Legacy,
    explorer: "https://pacific-explorer.manta.network/",
    decimals: 18,
    wrapped_native: Some("0x0Dc808adcE2099A9F62AA87D9670745AbA741746"),
};

pub const OPTIMISM: NetworkDescriptor = NetworkDescriptor {
    name: "Optimism",
    rpc: &["https://mainnet.optimism.io"],
    chain_id: 10,
    token: "ETH",
    fee_model: FeeModel::Legacy,
    explorer: "https://optimistic.etherscan.io/",
    decimals: 18,
    wrapped_native: Some("0x4200000000000000000000000000000000000006"),
};

pub const ZKSYNC: NetworkDescriptor = NetworkDescriptor {
    name: "zkSync",
    rpc: &["https://mainnet.era.zksync.io"],
    chain_id: 324,
    token: "ETH",
    fee_model: FeeModel::Legacy,
    explorer: "https://era.zksync.network/",
    decimals: 18,
    wrapped_native: Some("0x5AEa5775959fBC2557Cc8789bC1bf90A239D9a91"),
};

pub const STORY: NetworkDescriptor = NetworkDescriptor {
    name: "Story",
    rpc: &["https://mainnet.storyrpc.io"],
    chain_id: 1514,
    token: "IP",
    fee_model: FeeModel::Legacy,
    explorer: "https://www.storyscan.io/",
    decimals: 18,
    wrapped_native: None,
};

pub const SOLANA: NetworkDescriptor = NetworkDescriptor {
    name: "Solana",
    rpc: &["https://api.mainnet-beta.solana.com"],
    chain_id: 1151111081099710,
    token: "SOL",
    fee_model: FeeModel::NotApplicable,
    explorer: "https://solscan.io/",
    decimals: 9,
    wrapped_native: None,
};

/// Every supported chain
pub const NETWORKS: &[NetworkDescriptor] = &[
    BERACHAIN,
    ETHEREUM,
    SCROLL,
    ARBITRUM,
    POLYGON,
    AVALANCHE,
    ARBITRUM_NOVA,
    BASE,
    LINEA,
    ZORA,
    POLYGON_ZKEVM,
    BNB_CHAIN,
    MANTA,
    OPTIMISM,
    ZKSYNC,
    STORY,
    SOLANA,
];

/// Look up a chain by name (case-insensitive)
pub fn network_by_name(name: &str) -> Result<&'static NetworkDescriptor> {
    let wanted = name.trim();
    NETWORKS
        .iter()
        .find(|n| n.name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| WayfarerError::Configuration(format!("Unknown network \"{}\"", wanted)))
}
