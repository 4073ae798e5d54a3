pub mod solana;
pub mod wallet;

pub use solana::solana_address;
pub use wallet::Wallet;
