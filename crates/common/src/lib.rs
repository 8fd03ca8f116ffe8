//! Shared identifier types used across the order engine crates.

pub mod types;

pub use types::{OrderId, UserId};
