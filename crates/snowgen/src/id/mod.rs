mod id;
mod info;
mod layout;

pub use id::*;
pub use info::*;
pub use layout::*;
