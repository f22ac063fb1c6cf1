//! Common utilities for chess-review
//!
//! This crate provides shared conversion utilities and UCI helpers
//! used across the rules, engine, and analysis components.

pub mod converters;
pub mod uci;

// Re-export commonly used items
pub use converters::*;
pub use uci::*;
