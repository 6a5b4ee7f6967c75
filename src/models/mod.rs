//! Core data models for the ledger.

mod game;
mod ids;
mod player;
mod record;
mod season;
mod stats;

pub use game::*;
pub use ids::*;
pub use player::*;
pub use record::*;
pub use season::*;
pub use stats::*;
