//! Core types and constants for the pose filter

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
