//! Numeric thresholds and input limits.
//!
//! The two epsilons are load-bearing: probabilities at or below them are
//! treated as exactly zero, which keeps divisions by a branch probability
//! (back-solving an average payoff, normalising a histogram bin) away from
//! NaN/Infinity when a win rate approaches 0 or 1.

/// A branch probability at or below this is treated as zero when backing out
/// averages and when emitting closed-form histogram bins.
pub const PROBABILITY_EPSILON: f64 = 1e-15;

/// Combinatorial weights below this are skipped in the progressive/multiplier
/// enumeration.
pub const WEIGHT_EPSILON: f64 = 1e-18;

/// Smallest table size accepted at the boundary.
pub const MIN_PLAYERS: u32 = 2;

/// Largest table size accepted at the boundary.
pub const MAX_PLAYERS: u32 = 20;

/// Upper bound (inclusive) for the base penalty of one squid.
pub const MAX_PENALTY: f64 = 100_000.0;

/// Upper bound on the deck size. Binomial coefficients stay finite in f64 well
/// past this; the enumeration is quadratic in the deck size.
pub const MAX_TOTAL_SQUIDS: u32 = 500;

/// Upper bound (inclusive) on sudden-death orbits. Orbit counts drive loop
/// bounds and `powi` exponents.
pub const MAX_SD_ORBIT: u32 = 100;

/// Sudden-death orbit count when the request omits it.
pub const DEFAULT_SD_ORBIT: u32 = 1;

/// Number of precomputed last-player-standing estimates (0, 1 or 2 double events).
pub const MAX_DOUBLE_EVENTS: usize = 2;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 9000;
