pub mod account;
pub mod network;
pub mod plan;

pub use account::*;
pub use network::*;
pub use plan::*;
