//! Coordinator-free, roughly time-ordered 64-bit Snowflake identifiers.
//!
//! ```text
//!  Bit Index:  63           63 62            22 21            17 16        12 11             0
//!              +--------------+----------------+----------------+------------+---------------+
//!  Field:      | reserved (1) | timestamp (41) | datacenter (5) | worker (5) | sequence (12) |
//!              +--------------+----------------+----------------+------------+---------------+
//! ```
//!
//! The timestamp is the number of milliseconds since [`EPOCH`]. Each
//! [`SnowflakeGenerator`] owns a `(datacenter, worker)` pair that must be
//! assigned uniquely by the deployment; uniqueness across instances sharing a
//! pair is not enforced.
//!
//! # Example
//!
//! ```
//! use snowgen::{Generator, GeneratorConfig, SnowflakeGenerator};
//!
//! let generator = SnowflakeGenerator::new(GeneratorConfig::new(5, 10)).unwrap();
//! let id = generator.next_id().unwrap();
//! let info = generator.parse_id(id).unwrap();
//! assert_eq!(info.datacenter_id, 5);
//! assert_eq!(info.worker_id, 10);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod generator;
mod id;
mod parser;
mod registry;
#[cfg(feature = "serde")]
mod serde;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::parser::*;
pub use crate::registry::*;
#[cfg(feature = "serde")]
pub use crate::serde::*;
pub use crate::time::*;
