//! Static action registry: canonical names, fixed target networks, and
//! construction of runnable actions.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::TxHash;

use super::native::{Transfer, UnwrapNative, WrapNative};
use crate::adapters::EvmClient;
use crate::config::AmountsConfig;
use crate::domain::Account;
use crate::error::{Result, WayfarerError};
use crate::execution::Action;

/// Every registered action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    WrapNative,
    UnwrapNative,
    TransferEth,
    TransferNative,
}

/// Registry row
#[derive(Debug, Clone, Copy)]
pub struct ActionDescriptor {
    pub kind: ActionKind,
    /// Network the action always runs on, whatever the slot says
    pub fixed_network: Option<&'static str>,
    /// Hold behind the gas gate
    pub gas_sensitive: bool,
    pub summary: &'static str,
}

const WRAP_NATIVE: ActionDescriptor = ActionDescriptor {
    kind: ActionKind::WrapNative,
    fixed_network: None,
    gas_sensitive: true,
    summary: "Wrap part of the native balance into the wrapped token",
};

const UNWRAP_NATIVE: ActionDescriptor = ActionDescriptor {
    kind: ActionKind::UnwrapNative,
    fixed_network: None,
    gas_sensitive: true,
    summary: "Unwrap the whole wrapped token balance",
};

const TRANSFER_ETH: ActionDescriptor = ActionDescriptor {
    kind: ActionKind::TransferEth,
    fixed_network: Some("Ethereum"),
    gas_sensitive: true,
    summary: "Send ETH on Ethereum to the account's transfer address",
};

const TRANSFER_NATIVE: ActionDescriptor = ActionDescriptor {
    kind: ActionKind::TransferNative,
    fixed_network: None,
    gas_sensitive: true,
    summary: "Send the native token to the account's transfer address",
};

pub const ACTIONS: &[ActionDescriptor] = &[WRAP_NATIVE, UNWRAP_NATIVE, TRANSFER_ETH, TRANSFER_NATIVE];

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WrapNative => "wrap_native",
            Self::UnwrapNative => "unwrap_native",
            Self::TransferEth => "transfer_eth",
            Self::TransferNative => "transfer_native",
        }
    }

    pub fn descriptor(&self) -> &'static ActionDescriptor {
        match self {
            Self::WrapNative => &WRAP_NATIVE,
            Self::UnwrapNative => &UNWRAP_NATIVE,
            Self::TransferEth => &TRANSFER_ETH,
            Self::TransferNative => &TRANSFER_NATIVE,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = WayfarerError;

    fn from_str(s: &str) -> Result<Self> {
        ACTIONS
            .iter()
            .map(|d| d.kind)
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| WayfarerError::Configuration(format!("Unknown action \"{}\"", s.trim())))
    }
}

/// Resolve a configured name to its registry row
pub fn resolve_action(name: &str) -> Result<&'static ActionDescriptor> {
    Ok(name.parse::<ActionKind>()?.descriptor())
}

/// Build the runnable action for an account
pub fn instantiate(
    kind: ActionKind,
    amounts: &AmountsConfig,
    account: &Account,
) -> Box<dyn Action<EvmClient, Output = TxHash>> {
    match kind {
        ActionKind::WrapNative => Box::new(WrapNative::new(amounts.wrap_native)),
        ActionKind::UnwrapNative => Box::new(UnwrapNative),
        ActionKind::TransferEth => Box::new(Transfer::new(
            kind.as_str(),
            amounts.transfer_eth,
            account.transfer_address.clone(),
        )),
        ActionKind::TransferNative => Box::new(Transfer::new(
            kind.as_str(),
            amounts.transfer_native,
            account.transfer_address.clone(),
        )),
    }
}
