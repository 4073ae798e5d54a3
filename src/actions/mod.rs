pub mod native;
pub mod registry;

pub use native::{Transfer, UnwrapNative, WrapNative};
pub use registry::{instantiate, resolve_action, ActionDescriptor, ActionKind, ACTIONS};
