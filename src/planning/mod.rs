//! Route planning: grammar resolution, account selection, and the progress file

pub mod progress;
pub mod route_generator;
pub mod selection;

pub use progress::{Progress, ProgressStore};
pub use route_generator::{regenerate_progress, RouteGenerator, SKIP};
pub use selection::select_accounts;
