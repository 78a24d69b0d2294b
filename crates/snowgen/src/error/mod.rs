mod batch;
mod error;

pub use batch::*;
pub use error::*;
