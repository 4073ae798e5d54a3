use alloy::transports::{RpcError, TransportErrorKind};
use thiserror::Error;

/// Main error type for the route runner
#[derive(Error, Debug)]
pub enum WayfarerError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Missing setting, unknown action or network name, bad account row.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // Account-level fatal errors
    #[error("Account {account} is not eligible: {reason}")]
    Eligibility { account: String, reason: String },

    #[error("Account {account} can not find a good proxy {ceiling} times")]
    NoWorkingProxy { account: String, ceiling: u32 },

    #[error("Action failed: {0}")]
    Action(#[from] ActionError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Crypto/signing errors
    #[error("Wallet error: {0}")]
    Wallet(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl WayfarerError {
    /// Errors that end one account's run but must not abort the batch.
    pub fn is_account_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Eligibility { .. } | Self::NoWorkingProxy { .. }
        )
    }
}

/// Result type alias for WayfarerError
pub type Result<T> = std::result::Result<T, WayfarerError>;

/// Transport-level failure kinds that are cured by swapping the proxy.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFault {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed")]
    Connect,
    #[error("connection reset by peer")]
    Reset,
    #[error("TLS handshake failed")]
    Tls,
    #[error("proxy rejected the request")]
    Proxy,
    #[error("response came from Cloudflare")]
    Cloudflare,
    #[error("host could not be resolved")]
    Dns,
    #[error("incomplete response")]
    Incomplete,
    #[error("HTTP status {0}")]
    Status(u16),
}

impl TransportFault {
    /// Map an HTTP status to a fault when the status is one that a fresh proxy may cure.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            400 | 403 | 417 | 500 | 502 | 503 | 504 => Some(Self::Status(status)),
            407 => Some(Self::Proxy),
            _ => None,
        }
    }

    /// Operator-facing explanation of the fault.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Timeout => "Connection to RPC is not stable",
            Self::Connect | Self::Proxy => "Your proxy is probably not available",
            Self::Reset => "API Server reset connection by peer",
            Self::Tls => "Your proxy SSL version is bad",
            Self::Cloudflare => "Response came from Cloudflare server (likely IP or server problem)",
            Self::Dns => "Probably your DNS is down, try another resolver or network",
            Self::Incomplete => "Probably SOCKS5 request was bad",
            Self::Status(403) => "Probably your IP got blocked by a protection system",
            Self::Status(500 | 502 | 503 | 504) => "API server or proxy is not available now",
            Self::Status(_) => "Request was rejected by the remote side",
        }
    }
}

/// Classified failure of a single action attempt.
///
/// Every library error is turned into one of these at the point where it is
/// caught, so the executor can decide between aborting, rotating the proxy,
/// rotating the RPC endpoint, or plain retrying by matching on the variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Parameter '{0}' for this module does not exist")]
    MissingParameter(String),

    /// The desired end state already holds (e.g. already claimed).
    #[error("{0}")]
    AlreadySatisfied(String),

    #[error("{0}")]
    NoRetry(String),

    #[error("Account is not eligible: {0}")]
    Eligibility(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Insufficient funds to complete transaction: {0}")]
    InsufficientFunds(String),

    #[error("Not enough native token for transaction gas payment: {0}")]
    GasShortfall(String),

    #[error("{0}")]
    ProxyRequested(String),

    #[error("{fault}: {detail}")]
    Transport { fault: TransportFault, detail: String },

    #[error("Node error: {0}")]
    Node(String),

    #[error("Contract reverted: {0}")]
    ContractReverted(String),

    #[error("{0}")]
    Software(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ActionError {
    pub fn transport(fault: TransportFault, detail: impl Into<String>) -> Self {
        Self::Transport {
            fault,
            detail: detail.into(),
        }
    }

    /// Classify a JSON-RPC error message returned by a node.
    pub fn from_node_message(message: &str) -> Self {
        let lowered = message.to_ascii_lowercase();
        if lowered.contains("insufficient funds") {
            Self::InsufficientFunds(message.to_string())
        } else if lowered.contains("gas required exceeds") {
            Self::GasShortfall(message.to_string())
        } else if lowered.contains("execution reverted") || lowered.contains("revert") {
            Self::ContractReverted(message.to_string())
        } else {
            Self::Node(message.to_string())
        }
    }
}

fn classify_reqwest(err: &reqwest::Error) -> ActionError {
    let detail = err.to_string();
    let fault = if err.is_timeout() {
        Some(TransportFault::Timeout)
    } else if err.is_connect() {
        Some(TransportFault::Connect)
    } else if let Some(status) = err.status() {
        TransportFault::from_status(status.as_u16())
    } else if err.is_body() {
        Some(TransportFault::Incomplete)
    } else if err.is_request() {
        Some(TransportFault::Connect)
    } else {
        None
    };

    match fault {
        Some(fault) => ActionError::transport(fault, detail),
        None if err.is_decode() => ActionError::Software(detail),
        None => ActionError::Unknown(detail),
    }
}

impl From<reqwest::Error> for ActionError {
    fn from(err: reqwest::Error) -> Self {
        classify_reqwest(&err)
    }
}

impl From<solana_client::client_error::ClientError> for ActionError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        use solana_client::client_error::ClientErrorKind as Kind;
        use solana_client::rpc_request::RpcError as SolanaRpcError;

        match err.kind() {
            Kind::Reqwest(inner) => classify_reqwest(inner),
            Kind::Io(_) => Self::transport(TransportFault::Connect, err.to_string()),
            Kind::RpcError(SolanaRpcError::RpcResponseError { message, .. }) => {
                Self::from_node_message(message)
            }
            Kind::RpcError(SolanaRpcError::RpcRequestError(detail)) => {
                Self::transport(TransportFault::Connect, detail.clone())
            }
            Kind::RpcError(_) | Kind::SerdeJson(_) => Self::Node(err.to_string()),
            Kind::TransactionError(_) => Self::ContractReverted(err.to_string()),
            _ => Self::Unknown(err.to_string()),
        }
    }
}

impl From<alloy::transports::TransportError> for ActionError {
    fn from(err: alloy::transports::TransportError) -> Self {
        match &err {
            RpcError::ErrorResp(payload) => Self::from_node_message(&payload.message),
            RpcError::Transport(TransportErrorKind::HttpError(http)) => {
                match TransportFault::from_status(http.status) {
                    Some(fault) => Self::transport(fault, err.to_string()),
                    None => Self::Node(err.to_string()),
                }
            }
            RpcError::Transport(_) => Self::transport(TransportFault::Connect, err.to_string()),
            RpcError::NullResp | RpcError::DeserError { .. } => Self::Node(err.to_string()),
            _ => Self::Unknown(err.to_string()),
        }
    }
}

impl From<alloy::contract::Error> for ActionError {
    fn from(err: alloy::contract::Error) -> Self {
        match err {
            alloy::contract::Error::TransportError(inner) => inner.into(),
            other => Self::ContractReverted(other.to_string()),
        }
    }
}

impl From<alloy::providers::PendingTransactionError> for ActionError {
    fn from(err: alloy::providers::PendingTransactionError) -> Self {
        Self::from_node_message(&err.to_string())
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Software(format!("Malformed response: {}", err))
    }
}
