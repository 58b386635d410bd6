//! Configuration types
//!
//! Board-agnostic configuration structures, parsed from TOML at build time.

pub mod board;

pub use board::*;
