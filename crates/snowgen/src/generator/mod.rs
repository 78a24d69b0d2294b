mod config;
mod interface;
mod metrics;
pub(crate) mod mutex;
mod snowflake;
#[cfg(test)]
mod tests;

pub use config::*;
pub use interface::*;
pub use metrics::*;
pub use snowflake::*;
