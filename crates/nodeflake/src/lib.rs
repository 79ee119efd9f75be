//! Snowflake-style 64-bit identifiers for distributed nodes.
//!
//! Every node owns one [`SnowflakeGenerator`]. Each generated
//! [`SnowflakeId`] packs a 41-bit millisecond timestamp (relative to a
//! configurable epoch), a 10-bit node ID and a 12-bit per-millisecond
//! sequence:
//!
//! ```text
//!  Bit Index:  63           63 62            22 21          12 11             0
//!              +--------------+----------------+--------------+---------------+
//!  Field:      | reserved (1) | timestamp (41) | node ID (10) | sequence (12) |
//!              +--------------+----------------+--------------+---------------+
//! ```
//!
//! IDs from one generator never repeat and never decrease as long as the
//! system clock does not move backward. IDs from different generators are
//! unique as long as their node IDs differ.
//!
//! ```
//! use nodeflake::{DEFAULT_EPOCH, SnowflakeGenerator};
//!
//! let generator = SnowflakeGenerator::new(Some(5), None)?;
//! let id = generator.next_id()?;
//!
//! let parsed = generator.parse(id.to_raw());
//! assert_eq!(parsed.node_id, 5);
//! assert!(parsed.timestamp >= DEFAULT_EPOCH);
//! # Ok::<(), nodeflake::Error>(())
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod error;
mod generator;
mod id;
mod node;
mod time;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::node::*;
pub use crate::time::*;
