//! Game simulation.
//!
//! - [`engine`]: seeded Monte-Carlo play of the single-squid format, used to
//!   check the analytical solver against sampled games

pub mod engine;

pub use engine::{simulate_batch, simulate_game, PlayedGame, SimulationSummary};
