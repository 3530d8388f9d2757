//! Exact EV for the progressive and multiplier formats.
//!
//! Every remaining squid goes to hero with probability `wr`, so the number of
//! further squids hero collects is binomial. Double events take two squids out
//! of the pool in one draw: with `nd` of them and `r` squids remaining, the draw
//! splits into `nd` double slots and `r − 2·nd` ordinary slots, and hero's count
//! is the sum of two independent binomials (each double worth two squids).
//!
//! For each possible final count the solver attributes:
//! - `pay(count) × E[zero-squid opponents left]` when hero ends with squids;
//!   the zero-squid pool is modelled as decaying by `q = (n − 2)/(n − 1)` per
//!   squid that lands on an opponent, or taken from `oppDist` when known;
//! - the last-player-standing penalty when hero ends with none.

use std::collections::BTreeMap;

use crate::combinatorics::binomial_pmf;
use crate::constants::{MAX_DOUBLE_EVENTS, WEIGHT_EPSILON};
use crate::result_assembly::{assemble, squid_table, SquidTally};
use crate::types::{Format, GameConfig, HistogramBin, Outcome, SolveResult};

/// Last-player-standing estimate for 0, 1 and 2 double events.
pub type StandingPenalties = [f64; MAX_DOUBLE_EVENTS + 1];

/// Shrink the requested double-event count until `2·nd` fits in `remaining`.
pub fn effective_double_events(requested: usize, remaining: i64) -> usize {
    let mut nd = requested;
    while nd > 0 && remaining < 2 * nd as i64 {
        nd -= 1;
    }
    nd
}

/// P(exactly `count` squids land on one player) when `doubles` double slots
/// and `ordinary` single slots are each won with probability `p`.
fn split_count_pmf(doubles: usize, ordinary: i64, count: i64, p: f64) -> f64 {
    (0..=doubles as i64)
        .map(|dw| {
            let singles = count - 2 * dw;
            if singles < 0 || singles > ordinary {
                0.0
            } else {
                binomial_pmf(doubles as i64, dw, p) * binomial_pmf(ordinary, singles, p)
            }
        })
        .sum()
}

/// Whether an enumeration weight is large enough to keep.
fn significant(weight: f64) -> bool {
    weight >= WEIGHT_EPSILON
}

/// Overrides for one evaluation. `None` means "derive from the configuration".
#[derive(Clone, Copy, Debug, Default)]
pub struct EvalOverrides<'a> {
    pub doubles: Option<usize>,
    pub zero_holders: Option<f64>,
    pub standing: Option<&'a StandingPenalties>,
}

/// Accumulated distribution of one evaluation.
#[derive(Debug)]
pub struct Evaluation {
    pub ev: f64,
    pub p_lose: f64,
    pub tally: SquidTally,
    pub hist: Vec<HistogramBin>,
}

/// Immutable context of a progressive/multiplier solve.
#[derive(Debug)]
pub struct ProgressiveSolver<'a> {
    cfg: &'a GameConfig,
    opponents: f64,
    decay: f64,
    share: f64,
    standing: StandingPenalties,
    known_standing: Option<StandingPenalties>,
}

impl<'a> ProgressiveSolver<'a> {
    pub fn new(cfg: &'a GameConfig) -> Self {
        let opponents = (cfg.n as f64 - 1.0).max(1.0);
        let mut solver = Self {
            cfg,
            opponents,
            decay: (opponents - 1.0) / opponents,
            share: 1.0 / opponents,
            standing: [0.0; MAX_DOUBLE_EVENTS + 1],
            known_standing: None,
        };
        solver.standing = solver.last_player_standing();
        solver.known_standing = solver.known_last_player_standing();
        solver
    }

    /// Hero's payout for ending with `squids`.
    pub fn pay(&self, squids: u32) -> f64 {
        let base = self.cfg.penalty * squids as f64;
        match self.cfg.format {
            Format::Multiplier => base * self.cfg.multiplier(squids),
            _ => base,
        }
    }

    fn tiered_count(&self, squids: u32) -> f64 {
        squids as f64 * self.cfg.multiplier(squids)
    }

    /// Generic last-player-standing penalty, one entry per double-event count.
    fn last_player_standing(&self) -> StandingPenalties {
        let total = self.cfg.total_squids as i64;
        let flat = -self.cfg.penalty * total as f64;
        let mut out = [flat; MAX_DOUBLE_EVENTS + 1];
        if self.cfg.format != Format::Multiplier {
            return out;
        }
        for (nd, slot) in out.iter_mut().enumerate() {
            let ordinary = total - 2 * nd as i64;
            if ordinary < 0 {
                continue;
            }
            let expected: f64 = (1..=total)
                .map(|k| {
                    self.tiered_count(k as u32) * split_count_pmf(nd, ordinary, k, self.share)
                })
                .sum();
            *slot = -self.cfg.penalty * self.opponents * expected;
        }
        out
    }

    /// Sharper estimate from the opponents' known holdings (multiplier only).
    fn known_last_player_standing(&self) -> Option<StandingPenalties> {
        let opp_dist = self.cfg.opp_dist.as_ref()?;
        if self.cfg.format != Format::Multiplier {
            return None;
        }
        let mut groups: BTreeMap<u32, usize> = BTreeMap::new();
        for &held in opp_dist {
            *groups.entry(held).or_default() += 1;
        }

        let remaining = self.cfg.squids_remaining() as i64;
        let mut out = self.standing;
        for (nd, slot) in out.iter_mut().enumerate() {
            let ordinary = remaining - 2 * nd as i64;
            if ordinary < 0 {
                continue;
            }
            let total: f64 = groups
                .iter()
                .map(|(&held, &count)| {
                    let expected: f64 = (0..=remaining)
                        .map(|z| {
                            self.tiered_count(held.saturating_add(z as u32))
                                * split_count_pmf(nd, ordinary, z, self.share)
                        })
                        .sum();
                    count as f64 * expected
                })
                .sum();
            *slot = -self.cfg.penalty * total;
        }
        Some(out)
    }

    /// Number of opponents known to hold no squid, when `oppDist` is supplied.
    pub fn known_zero_holders(&self) -> Option<f64> {
        self.cfg
            .opp_dist
            .as_ref()
            .map(|d| d.iter().filter(|&&held| held == 0).count() as f64)
    }

    /// Full distribution for hero holding `hero_squids` after `dealt` squids.
    pub fn evaluate(
        &self,
        hero_squids: u32,
        dealt: u32,
        overrides: EvalOverrides<'_>,
    ) -> Evaluation {
        let wr = self.cfg.hero_win_rate;
        let remaining = (self.cfg.total_squids as i64 - dealt as i64).max(0);
        let nd = effective_double_events(
            overrides
                .doubles
                .unwrap_or_else(|| self.cfg.requested_double_events()),
            remaining,
        );
        let ordinary = remaining - 2 * nd as i64;
        let standing = overrides.standing.unwrap_or(&self.standing)[nd];
        let zero_holders = overrides.zero_holders.unwrap_or_else(|| {
            let opponent_draws = (dealt as i64 - hero_squids as i64).max(0) as i32;
            self.opponents * self.decay.powi(opponent_draws)
        });

        let mut eval = Evaluation {
            ev: 0.0,
            p_lose: 0.0,
            tally: SquidTally::new(),
            hist: Vec::new(),
        };

        for x in 0..=remaining {
            let final_squids = hero_squids + x as u32;
            let mut mass = 0.0;
            let mut pay = 0.0;
            for dw in 0..=nd as i64 {
                let singles = x - 2 * dw;
                if singles < 0 || singles > ordinary {
                    continue;
                }
                let px = binomial_pmf(nd as i64, dw, wr) * binomial_pmf(ordinary, singles, wr);
                if !significant(px) {
                    continue;
                }
                mass += px;
                if final_squids == 0 {
                    eval.p_lose += px;
                    pay += px * standing;
                } else {
                    let opponent_doubles = nd as i64 - dw;
                    let survivors =
                        zero_holders * self.decay.powi((remaining - x - opponent_doubles) as i32);
                    pay += self.pay(final_squids) * survivors * px;
                }
            }
            if !significant(mass) {
                continue;
            }
            eval.ev += pay;
            eval.tally.add(final_squids, mass, pay);
            eval.hist.push(HistogramBin {
                value: pay / mass,
                freq: mass,
            });
        }
        eval
    }

    /// EV of hero taking the next draw (one squid, or two under double-per-hand)
    /// minus EV of an opponent taking it, with the same squids dealt in both.
    pub fn next_squid_value(&self) -> Option<f64> {
        let remaining = self.cfg.squids_remaining();
        if remaining == 0 {
            return None;
        }
        let step = if self.cfg.double_per_hand && remaining >= 2 {
            2
        } else {
            1
        };
        let doubles = Some(usize::from(self.cfg.final_double));
        let known = self.known_zero_holders();
        let hero_takes = self.evaluate(
            self.cfg.hero_squids + step,
            self.cfg.squids_dealt + step,
            EvalOverrides {
                doubles,
                zero_holders: known,
                standing: None,
            },
        );
        let opponent_takes = self.evaluate(
            self.cfg.hero_squids,
            self.cfg.squids_dealt + step,
            EvalOverrides {
                doubles,
                zero_holders: known.map(|z| z * self.decay),
                standing: None,
            },
        );
        Some(hero_takes.ev - opponent_takes.ev)
    }
}

/// Solve a progressive or multiplier configuration.
pub fn solve_progressive(cfg: &GameConfig) -> SolveResult {
    let solver = ProgressiveSolver::new(cfg);
    let remaining = cfg.squids_remaining() as i64;
    let doubles = effective_double_events(cfg.requested_double_events(), remaining);
    tracing::debug!(
        format = cfg.format.as_str(),
        remaining,
        doubles,
        known_opponents = cfg.opp_dist.is_some(),
        "progressive solve"
    );

    // Pool exhausted with hero empty-handed: no hand is left to play.
    if remaining == 0 && cfg.hero_squids == 0 {
        return assemble(
            Outcome::ZERO,
            None,
            squid_table([(0, 1.0, 0.0)]),
            vec![HistogramBin {
                value: 0.0,
                freq: 1.0,
            }],
        );
    }

    let main = solver.evaluate(
        cfg.hero_squids,
        cfg.squids_dealt,
        EvalOverrides {
            doubles: None,
            zero_holders: solver.known_zero_holders(),
            standing: solver.known_standing.as_ref(),
        },
    );
    let outcome = Outcome {
        ev: main.ev,
        p_lose: main.p_lose,
        expected_hands: (remaining - doubles as i64) as f64,
    };
    let nsv = solver.next_squid_value();

    assemble(outcome, nsv, main.tally.into_table(), main.hist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tier;

    fn config(n: u32, wr: f64, total: u32, format: Format) -> GameConfig {
        GameConfig {
            n,
            hero_win_rate: wr,
            penalty: 10.0,
            hero_squids: 0,
            squids_dealt: 0,
            total_squids: total,
            sudden_death: false,
            sd_orbit: 1,
            format,
            tiers: Vec::new(),
            final_double: false,
            double_per_hand: false,
            opp_dist: None,
        }
    }

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{a} vs {b}");
    }

    #[test]
    fn test_effective_double_events_shrinks() {
        assert_eq!(effective_double_events(2, 4), 2);
        assert_eq!(effective_double_events(2, 3), 1);
        assert_eq!(effective_double_events(2, 1), 0);
        assert_eq!(effective_double_events(1, 0), 0);
        assert_eq!(effective_double_events(0, 10), 0);
    }

    #[test]
    fn test_split_count_pmf_sums_to_one() {
        for &(nd, ordinary) in &[(0usize, 5i64), (1, 3), (2, 4)] {
            let max = ordinary + 2 * nd as i64;
            let total: f64 = (0..=max).map(|k| split_count_pmf(nd, ordinary, k, 0.3)).sum();
            assert_close(total, 1.0, 1e-12);
        }
    }

    #[test]
    fn test_progressive_pay_is_linear() {
        let cfg = config(4, 0.3, 5, Format::Progressive);
        let solver = ProgressiveSolver::new(&cfg);
        assert_eq!(solver.pay(0), 0.0);
        assert_eq!(solver.pay(3), 30.0);
    }

    #[test]
    fn test_multiplier_pay_uses_tiers() {
        let mut cfg = config(4, 0.3, 5, Format::Multiplier);
        cfg.tiers = vec![Tier { squids: 2, mult: 2.0 }, Tier { squids: 4, mult: 3.0 }];
        let solver = ProgressiveSolver::new(&cfg);
        assert_eq!(solver.pay(1), 10.0);
        assert_eq!(solver.pay(2), 40.0);
        assert_eq!(solver.pay(4), 120.0);
    }

    #[test]
    fn test_progressive_standing_is_flat() {
        let cfg = config(5, 0.3, 6, Format::Progressive);
        let solver = ProgressiveSolver::new(&cfg);
        assert_eq!(solver.standing, [-60.0; 3]);
    }

    #[test]
    fn test_multiplier_standing_without_tiers_matches_flat() {
        // With every multiplier at 1, nO · E[count per opponent] = total squids.
        let cfg = config(5, 0.3, 6, Format::Multiplier);
        let solver = ProgressiveSolver::new(&cfg);
        for nd in 0..=MAX_DOUBLE_EVENTS {
            assert_close(solver.standing[nd], -60.0, 1e-9);
        }
    }

    #[test]
    fn test_heads_up_progressive() {
        let cfg = config(2, 0.5, 2, Format::Progressive);
        let result = solve_progressive(&cfg);
        assert_close(result.ev, 0.0, 1e-12);
        assert_close(result.p_lose, 0.25, 1e-12);
        assert_eq!(result.expected_hands, 2.0);
        assert_eq!(result.nsv, Some(20.0));
        let values: Vec<f64> = result.hist.iter().map(|b| b.value).collect();
        assert_eq!(values, vec![-20.0, 0.0, 20.0]);
        assert_eq!(result.mn, -20.0);
        assert_eq!(result.mx, 20.0);
    }

    #[test]
    fn test_known_opponents_override_zero_holders() {
        let mut cfg = config(4, 0.3, 6, Format::Multiplier);
        cfg.squids_dealt = 2;
        cfg.opp_dist = Some(vec![2, 0, 0]);
        let solver = ProgressiveSolver::new(&cfg);
        assert_eq!(solver.known_zero_holders(), Some(2.0));
        assert!(solver.known_standing.is_some());
    }

    #[test]
    fn test_known_standing_ignored_for_progressive() {
        let mut cfg = config(4, 0.3, 6, Format::Progressive);
        cfg.opp_dist = Some(vec![1, 0, 0]);
        let solver = ProgressiveSolver::new(&cfg);
        assert!(solver.known_standing.is_none());
    }

    #[test]
    fn test_double_per_hand_doubles_hero_draws() {
        let mut cfg = config(3, 0.4, 4, Format::Progressive);
        cfg.double_per_hand = true;
        let solver = ProgressiveSolver::new(&cfg);
        let eval = solver.evaluate(0, 0, EvalOverrides::default());
        let total: f64 = eval.hist.iter().map(|b| b.freq).sum();
        assert_close(total, 1.0, 1e-12);
        assert_close(eval.ev, eval.hist.iter().map(|b| b.value * b.freq).sum(), 1e-9);
    }

    #[test]
    fn test_weight_threshold_boundary() {
        assert!(significant(WEIGHT_EPSILON));
        assert!(!significant(WEIGHT_EPSILON * (1.0 - f64::EPSILON)));
        assert!(!significant(0.0));
    }

    #[test]
    fn test_negligible_branches_pruned_without_losing_mass() {
        // wr = 0.01 over 20 ordinary slots: P(x = 11) ≈ 1.5e-17 is kept,
        // P(x = 12) ≈ 1.1e-19 falls under the weight threshold.
        let cfg = config(4, 0.01, 20, Format::Progressive);
        let solver = ProgressiveSolver::new(&cfg);
        let eval = solver.evaluate(0, 0, EvalOverrides::default());
        assert_eq!(eval.hist.len(), 12);
        assert!(eval.hist.iter().all(|b| b.freq >= WEIGHT_EPSILON));
        let total: f64 = eval.hist.iter().map(|b| b.freq).sum();
        assert_close(total, 1.0, 1e-9);
        assert_close(eval.ev, eval.hist.iter().map(|b| b.value * b.freq).sum(), 1e-9);
    }

    #[test]
    fn test_exhausted_pool_without_squids_is_terminal() {
        let mut cfg = config(4, 0.3, 3, Format::Progressive);
        cfg.squids_dealt = 3;
        let result = solve_progressive(&cfg);
        assert_eq!(result.ev, 0.0);
        assert_eq!(result.p_lose, 0.0);
        assert_eq!(result.expected_hands, 0.0);
        assert_eq!(result.nsv, None);
        assert_eq!(result.hist.len(), 1);
        assert_eq!(result.sqt.len(), 1);
        assert_eq!(result.sqt[0].squids, 0);
    }

    #[test]
    fn test_known_holdings_tolerate_large_counts() {
        let mut cfg = config(3, 0.3, 4, Format::Multiplier);
        cfg.opp_dist = Some(vec![u32::MAX, 0]);
        let result = solve_progressive(&cfg);
        assert!(result.p_lose > 0.0);
    }

    #[test]
    fn test_nsv_absent_when_pool_empty() {
        let mut cfg = config(4, 0.3, 3, Format::Progressive);
        cfg.squids_dealt = 3;
        cfg.hero_squids = 1;
        let result = solve_progressive(&cfg);
        assert_eq!(result.nsv, None);
        assert_eq!(result.expected_hands, 0.0);
        assert_eq!(result.p_lose, 0.0);
        assert_eq!(result.sqt.len(), 1);
        assert_eq!(result.sqt[0].squids, 1);
    }
}
