pub mod database;
pub mod state;

pub use database::*;
pub use state::*;
