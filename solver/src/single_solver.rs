//! Exact EV for the single-squid format.
//!
//! Every player needs one squid; whoever is left without one when the pool runs
//! out pays the full pot, `penalty × (n − 1)`. With `slots` players still
//! squidless (hero included), each hand is resolved by hero drawing (weight
//! `wr`) or by one of the `slots − 1` squidless opponents drawing (weight
//! `(slots − 1)(1 − wr)/(n − 1)`). Hands won by players who already hold a squid
//! resolve nothing, so both branches are renormalised by their sum.
//!
//! ## Recurrence
//!
//! `E(1)` is the forced loss. For `j ≥ 2`,
//!
//! ```text
//! E(j) = h_j · safe + o_j · E(j − 1),    h_j + o_j = 1
//! ```
//!
//! and the same convex blend carries the loss probability and expected hand
//! count. [`SingleSolver::step`] is one application of it; the solver folds it
//! upward from the base case instead of recursing.
//!
//! ## Sudden death
//!
//! With sudden death enabled the last two squids are played as a heads-up
//! sub-game over a fixed number of orbits. If hero is in it, the three terminal
//! outcomes are: hero draws (paid one penalty), the opponent draws (full pot
//! loss), or nobody draws and hero pays `n − 2` penalties as a spectator. If hero
//! is already safe, a final pair that never resolves doubles hero's payment.

use crate::constants::{MAX_SD_ORBIT, PROBABILITY_EPSILON};
use crate::result_assembly::{assemble, push_bin, squid_table};
use crate::types::{GameConfig, HistogramBin, Outcome, SolveResult, SquidRow};

/// Immutable context shared by every step of the single-format solve.
#[derive(Clone, Debug)]
pub struct SingleSolver {
    players: f64,
    win_rate: f64,
    penalty: f64,
    sudden_death: bool,
    sd_orbit: i32,
    safe_payoff: f64,
}

impl SingleSolver {
    pub fn new(cfg: &GameConfig) -> Self {
        let mut solver = Self {
            players: cfg.n as f64,
            win_rate: cfg.hero_win_rate,
            penalty: cfg.penalty,
            sudden_death: cfg.sudden_death,
            sd_orbit: cfg.sd_orbit.clamp(1, MAX_SD_ORBIT) as i32,
            safe_payoff: 0.0,
        };
        solver.safe_payoff = if solver.sudden_death {
            solver.penalty * (1.0 + solver.final_pair_stall())
        } else {
            solver.penalty
        };
        solver
    }

    /// Expected payoff once hero holds a squid.
    pub fn safe_payoff(&self) -> f64 {
        self.safe_payoff
    }

    /// Payoff of the last squidless player.
    fn full_pot_loss(&self) -> f64 {
        -self.penalty * (self.players - 1.0)
    }

    /// Per-orbit probability that one of hero's final two opponents draws.
    /// Capped at 1: heads-up there is no opponent pair to stall.
    fn final_pair_hazard(&self) -> f64 {
        (2.0 * (1.0 - self.win_rate) / (self.players - 1.0)).min(1.0)
    }

    /// Probability the opponents' final pair never resolves across all orbits.
    fn final_pair_stall(&self) -> f64 {
        (1.0 - self.final_pair_hazard()).powi(self.sd_orbit)
    }

    /// Expected orbits played in a sudden-death sub-game that resolves with
    /// probability `resolve` per orbit and stops after `sd_orbit` orbits.
    fn sudden_death_orbits(&self, resolve: f64) -> f64 {
        let stall = 1.0 - resolve;
        let resolved: f64 = (1..self.sd_orbit)
            .map(|j| j as f64 * stall.powi(j - 1) * resolve)
            .sum();
        resolved + self.sd_orbit as f64 * stall.powi(self.sd_orbit - 1)
    }

    /// Expected further hands until the field resolves with `m` squidless
    /// opponents and hero out of the rotation.
    pub fn opponent_hands(&self, m: i64) -> f64 {
        if m <= 0 {
            return 0.0;
        }
        let floor = if self.sudden_death { 2 } else { 1 };
        let mut hands: f64 = ((floor + 1)..=m)
            .map(|q| (self.players - 1.0) / (q as f64 * (1.0 - self.win_rate)))
            .sum();
        if self.sudden_death && m >= 2 {
            hands += self.sudden_death_orbits(self.final_pair_hazard());
        }
        hands
    }

    /// Normalised `(hero draws, opponent draws, resolving probability)` with
    /// `j` squidless players.
    fn draw_weights(&self, j: i64) -> (f64, f64, f64) {
        let hero = self.win_rate;
        let opp = (j - 1) as f64 * (1.0 - self.win_rate) / (self.players - 1.0);
        let resolving = hero + opp;
        (hero / resolving, opp / resolving, resolving)
    }

    /// One backward step: the outcome with `j` squidless players from the
    /// outcome with `j − 1`.
    pub fn step(&self, prev: Outcome, j: i64) -> Outcome {
        let (hero, opp, resolving) = self.draw_weights(j);
        Outcome {
            ev: hero * self.safe_payoff + opp * prev.ev,
            p_lose: opp * prev.p_lose,
            expected_hands: 1.0 / resolving
                + hero * self.opponent_hands(j - 1)
                + opp * prev.expected_hands,
        }
    }

    fn forced_loss(&self) -> Outcome {
        Outcome {
            ev: self.full_pot_loss(),
            p_lose: 1.0,
            expected_hands: 0.0,
        }
    }

    /// Hero-vs-one-opponent resolution of the last two squids:
    /// `(hero first, opponent first, no resolution)` probabilities.
    fn sudden_death_branches(&self) -> (f64, f64, f64) {
        let (hero, opp, resolving) = self.draw_weights(2);
        let stall = (1.0 - resolving).powi(self.sd_orbit);
        let resolved = 1.0 - stall;
        (hero * resolved, opp * resolved, stall)
    }

    fn sudden_death_base(&self) -> Outcome {
        let (hero_first, opp_first, stall) = self.sudden_death_branches();
        let (_, _, resolving) = self.draw_weights(2);
        Outcome {
            ev: hero_first * self.penalty
                + opp_first * self.full_pot_loss()
                + stall * (-self.penalty * (self.players - 2.0)),
            p_lose: opp_first + stall,
            expected_hands: self.sudden_death_orbits(resolving),
        }
    }

    /// Outcome for hero holding `hero_squids` with `slots` players squidless.
    pub fn hero_outcome(&self, hero_squids: u32, slots: i64) -> Outcome {
        if hero_squids >= 1 {
            return Outcome {
                ev: self.safe_payoff,
                p_lose: 0.0,
                expected_hands: self.opponent_hands(slots),
            };
        }
        if slots <= 0 {
            return Outcome::ZERO;
        }
        let (base, first) = if !self.sudden_death {
            (self.forced_loss(), 2)
        } else if slots == 1 {
            return self.forced_loss();
        } else {
            (self.sudden_death_base(), 3)
        };
        (first..=slots).fold(base, |acc, j| self.step(acc, j))
    }

    /// Probability the hero-squidless chain walks from `slots` down to the
    /// heads-up sudden-death sub-game.
    fn reach_final_pair(&self, slots: i64) -> f64 {
        (3..=slots).map(|j| self.draw_weights(j).1).product()
    }

    fn histogram(&self, hero_squids: u32, slots: i64, outcome: &Outcome) -> Vec<HistogramBin> {
        let double = 2.0 * self.penalty;
        let mut hist = Vec::with_capacity(4);

        if hero_squids >= 1 {
            if self.sudden_death {
                let stall = self.final_pair_stall();
                push_bin(&mut hist, self.penalty, 1.0 - stall);
                push_bin(&mut hist, double, stall);
            } else {
                push_bin(&mut hist, self.penalty, 1.0);
            }
        } else if slots <= 0 {
            push_bin(&mut hist, 0.0, 1.0);
        } else if !self.sudden_death {
            push_bin(&mut hist, self.safe_payoff, 1.0 - outcome.p_lose);
            push_bin(&mut hist, self.full_pot_loss(), outcome.p_lose);
        } else if slots == 1 {
            push_bin(&mut hist, self.full_pot_loss(), 1.0);
        } else {
            let reach = self.reach_final_pair(slots);
            let safe = 1.0 - reach;
            let stall = self.final_pair_stall();
            let (hero_first, opp_first, no_resolution) = self.sudden_death_branches();
            push_bin(&mut hist, self.penalty, safe * (1.0 - stall) + reach * hero_first);
            push_bin(&mut hist, double, safe * stall);
            push_bin(&mut hist, self.full_pot_loss(), reach * opp_first);
            push_bin(
                &mut hist,
                -self.penalty * (self.players - 2.0),
                reach * no_resolution,
            );
        }
        hist
    }

    fn squid_rows(&self, hero_squids: u32, slots: i64, outcome: &Outcome) -> Vec<SquidRow> {
        // Only holding a squid matters in this format, so a safe hero is one row.
        if hero_squids >= 1 {
            return squid_table([(1, 1.0, self.safe_payoff)]);
        }
        if slots <= 0 {
            return squid_table([(0, 1.0, 0.0)]);
        }
        let p_lose = outcome.p_lose;
        let avg_loss = if p_lose > PROBABILITY_EPSILON {
            (outcome.ev - (1.0 - p_lose) * self.safe_payoff) / p_lose
        } else {
            self.full_pot_loss()
        };
        squid_table([(0, p_lose, avg_loss), (1, 1.0 - p_lose, self.safe_payoff)])
    }
}

/// Solve a single-format configuration.
pub fn solve_single(cfg: &GameConfig) -> SolveResult {
    let solver = SingleSolver::new(cfg);
    let slots = cfg.n as i64 - cfg.squids_dealt as i64;
    tracing::debug!(
        n = cfg.n,
        slots,
        sudden_death = cfg.sudden_death,
        safe_payoff = solver.safe_payoff(),
        "single-format solve"
    );

    let outcome = solver.hero_outcome(cfg.hero_squids, slots);
    let sqt = solver.squid_rows(cfg.hero_squids, slots, &outcome);
    let hist = solver.histogram(cfg.hero_squids, slots, &outcome);

    let nsv = (cfg.hero_squids == 0 && cfg.squids_remaining() > 0)
        .then(|| solver.safe_payoff() - solver.hero_outcome(0, slots - 1).ev);

    assemble(outcome, nsv, sqt, hist)
}
