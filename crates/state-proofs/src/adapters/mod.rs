//! # Adapters
//!
//! In-memory implementations of the driven ports.

pub mod memory_db;
pub mod memory_state;

pub use memory_db::*;
pub use memory_state::*;
