//! # Squid: Exact EV Solver for Squid Penalty Games
//!
//! Computes the full outcome distribution of a squid game from hero's current
//! position: expected value, loss probability, expected hands, the
//! per-final-squid-count table, the payoff histogram, and the value of taking
//! the next squid now. Everything is exact: recurrences and binomial weights
//! replace Monte-Carlo sampling.
//!
//! ## Solvers
//!
//! | Format | Rust module | Method |
//! |--------|-------------|--------|
//! | single | [`single_solver`] | Backward fold over squidless-player counts, optional heads-up sudden-death sub-game |
//! | progressive | [`progressive_solver`] | Binomial split over ordinary and double slots, linear payout |
//! | multiplier | [`progressive_solver`] | Same enumeration, tiered payout, optional known opponent holdings |
//!
//! [`api_computations::solve`] dispatches on the format; both solvers hand
//! their distributions to [`result_assembly`] for the shared shaping.
//!
//! ## Numerical thresholds
//!
//! Branch probabilities at or below [`constants::PROBABILITY_EPSILON`] (1e-15)
//! and enumeration weights below [`constants::WEIGHT_EPSILON`] (1e-18) are
//! treated as zero so near-certain win rates never divide by a vanishing
//! probability.
//!
//! ## Serving
//!
//! [`server`] wraps the solve in a single POST endpoint. The paid formats are
//! gated by [`auth`] (bearer ID token) and [`entitlement`] (active subscription).
//! [`simulation`] plays the single format by sampling, to check the closed forms.

pub mod api_computations;
pub mod auth;
pub mod combinatorics;
pub mod constants;
pub mod entitlement;
pub mod env_config;
pub mod error;
pub mod progressive_solver;
pub mod result_assembly;
pub mod server;
pub mod simulation;
pub mod single_solver;
pub mod types;

pub use api_computations::{solve, validate_config};
pub use types::{Format, GameConfig, SolveResult};
