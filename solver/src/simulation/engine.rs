//! Monte-Carlo play of the single-squid format.
//!
//! Plays the same hand model the analytical solver integrates: each hand is
//! won by hero with probability `wr`, by a given opponent with probability
//! `(1 − wr)/(n − 1)`, and hands won by players who already hold a squid change
//! nothing. Sudden death plays the last two squids as a fixed number of orbits.
//! Used to check the closed forms, never by the solve path.

use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::constants::MAX_SD_ORBIT;
use crate::types::GameConfig;

/// One simulated game from hero's point of view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayedGame {
    pub payoff: f64,
    /// Hero finished without a squid and paid.
    pub lost: bool,
    pub hands: u32,
}

/// Aggregate of a simulated batch.
#[derive(Clone, Debug)]
pub struct SimulationSummary {
    pub games: usize,
    pub mean_payoff: f64,
    /// Standard error of `mean_payoff`.
    pub payoff_std_error: f64,
    pub loss_rate: f64,
    pub mean_hands: f64,
    /// Standard error of `mean_hands`.
    pub hands_std_error: f64,
    pub min_payoff: f64,
    pub max_payoff: f64,
    pub elapsed: Duration,
}

/// Per-game constants of the single-format table.
struct Table {
    players: f64,
    win_rate: f64,
    penalty: f64,
    sudden_death: bool,
    sd_orbit: u32,
}

impl Table {
    fn new(cfg: &GameConfig) -> Self {
        Self {
            players: cfg.n as f64,
            win_rate: cfg.hero_win_rate,
            penalty: cfg.penalty,
            sudden_death: cfg.sudden_death,
            sd_orbit: cfg.sd_orbit.clamp(1, MAX_SD_ORBIT),
        }
    }

    fn single_opponent(&self) -> f64 {
        (1.0 - self.win_rate) / (self.players - 1.0)
    }

    fn full_pot_loss(&self) -> f64 {
        -self.penalty * (self.players - 1.0)
    }

    /// Hero already holds a squid; play the field out with `m` squidless
    /// opponents and return hero's payoff.
    fn finish_safe(&self, mut m: i64, rng: &mut SmallRng, hands: &mut u32) -> f64 {
        let floor = if self.sudden_death { 2 } else { 1 };
        while m > floor {
            *hands += 1;
            if rng.random::<f64>() < m as f64 * self.single_opponent() {
                m -= 1;
            }
        }
        if !self.sudden_death {
            return self.penalty;
        }

        let pair_hazard = (2.0 * self.single_opponent()).min(1.0);
        let count_orbits = m >= 2;
        for _ in 0..self.sd_orbit {
            if count_orbits {
                *hands += 1;
            }
            if rng.random::<f64>() < pair_hazard {
                return self.penalty;
            }
        }
        2.0 * self.penalty
    }

    fn play(&self, hero_squids: u32, mut slots: i64, rng: &mut SmallRng) -> PlayedGame {
        let mut hands = 0u32;
        if hero_squids >= 1 {
            let payoff = self.finish_safe(slots, rng, &mut hands);
            return PlayedGame {
                payoff,
                lost: false,
                hands,
            };
        }
        if slots <= 0 {
            return PlayedGame {
                payoff: 0.0,
                lost: false,
                hands: 0,
            };
        }

        let floor = if self.sudden_death { 2 } else { 1 };
        while slots > floor {
            hands += 1;
            let u = rng.random::<f64>();
            if u < self.win_rate {
                let payoff = self.finish_safe(slots - 1, rng, &mut hands);
                return PlayedGame {
                    payoff,
                    lost: false,
                    hands,
                };
            }
            if u < self.win_rate + (slots - 1) as f64 * self.single_opponent() {
                slots -= 1;
            }
        }

        if slots == 1 {
            return PlayedGame {
                payoff: self.full_pot_loss(),
                lost: true,
                hands,
            };
        }

        // Heads-up sudden death for the last two squids.
        for _ in 0..self.sd_orbit {
            hands += 1;
            let u = rng.random::<f64>();
            if u < self.win_rate {
                return PlayedGame {
                    payoff: self.penalty,
                    lost: false,
                    hands,
                };
            }
            if u < self.win_rate + self.single_opponent() {
                return PlayedGame {
                    payoff: self.full_pot_loss(),
                    lost: true,
                    hands,
                };
            }
        }
        PlayedGame {
            payoff: -self.penalty * (self.players - 2.0),
            lost: true,
            hands,
        }
    }
}

/// Play one single-format game from the configuration's current position.
pub fn simulate_game(cfg: &GameConfig, rng: &mut SmallRng) -> PlayedGame {
    let slots = cfg.n as i64 - cfg.squids_dealt as i64;
    Table::new(cfg).play(cfg.hero_squids, slots, rng)
}

fn mean_and_std_error(values: impl Iterator<Item = f64> + Clone, n: usize) -> (f64, f64) {
    let mean = values.clone().sum::<f64>() / n as f64;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    (mean, (variance / n as f64).sqrt())
}

/// Simulate N games in parallel, one seeded RNG per game.
pub fn simulate_batch(cfg: &GameConfig, num_games: usize, seed: u64) -> SimulationSummary {
    let start = Instant::now();
    let games: Vec<PlayedGame> = (0..num_games)
        .into_par_iter()
        .map(|i| {
            let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(i as u64));
            simulate_game(cfg, &mut rng)
        })
        .collect();
    let elapsed = start.elapsed();

    let n = games.len().max(1);
    let (mean_payoff, payoff_std_error) = mean_and_std_error(games.iter().map(|g| g.payoff), n);
    let (mean_hands, hands_std_error) = mean_and_std_error(games.iter().map(|g| g.hands as f64), n);
    let losses = games.iter().filter(|g| g.lost).count();
    let (min_payoff, max_payoff) = games
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), g| {
            (lo.min(g.payoff), hi.max(g.payoff))
        });

    SimulationSummary {
        games: num_games,
        mean_payoff,
        payoff_std_error,
        loss_rate: losses as f64 / n as f64,
        mean_hands,
        hands_std_error,
        min_payoff,
        max_payoff,
        elapsed,
    }
}
