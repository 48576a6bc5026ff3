//! HTTP API modules
//!
//! Each resource owns its router and handlers; [`crate::core::Server`]
//! merges them into the application.

pub mod health;
pub mod orders;
