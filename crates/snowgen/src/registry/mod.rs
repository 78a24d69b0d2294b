mod context;
mod factory;
mod instance;
mod type_registry;
mod types;

pub use context::*;
pub use factory::*;
pub use instance::*;
pub use type_registry::*;
pub use types::*;
