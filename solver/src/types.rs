//! Core data structures: the game configuration consumed by the solvers and the
//! result they produce.
//!
//! Both are plain values. A [`GameConfig`] is built once per request (see
//! [`crate::api_computations::validate_config`]) and only ever borrowed by the
//! solvers; a [`SolveResult`] is assembled fresh and handed back by value.
//!
//! Field names on the wire are camelCase (`heroWinRate`, `squidsDealt`, ...) and
//! the result keeps the compact keys the frontend reads (`pL`, `aH`, `sqt`, ...).

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SD_ORBIT;

/// Payout rule of the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Each player needs exactly one squid; the last player without one pays everyone.
    Single,
    /// Payout is `penalty × squids held`.
    Progressive,
    /// Payout is `penalty × squids held × tier multiplier`.
    Multiplier,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Single => "single",
            Format::Progressive => "progressive",
            Format::Multiplier => "multiplier",
        }
    }
}

/// One step of the multiplier schedule: from `squids` held upward, pay `mult`×.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub squids: u32,
    pub mult: f64,
}

/// Immutable input of one solve call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Players at the table (2–20).
    pub n: u32,
    /// Probability hero wins a single draw, open interval (0, 1).
    pub hero_win_rate: f64,
    /// Base monetary unit of one squid.
    pub penalty: f64,
    #[serde(default)]
    pub hero_squids: u32,
    #[serde(default)]
    pub squids_dealt: u32,
    #[serde(default)]
    pub total_squids: u32,
    /// Single format only: two-player endgame when two squids remain.
    #[serde(default)]
    pub sudden_death: bool,
    #[serde(default = "default_sd_orbit")]
    pub sd_orbit: u32,
    pub format: Format,
    /// Multiplier schedule; ignored by the other formats.
    #[serde(default)]
    pub tiers: Vec<Tier>,
    #[serde(default)]
    pub final_double: bool,
    #[serde(default)]
    pub double_per_hand: bool,
    /// Squids already held by each named opponent, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opp_dist: Option<Vec<u32>>,
}

fn default_sd_orbit() -> u32 {
    DEFAULT_SD_ORBIT
}

impl GameConfig {
    /// Squids still in the undealt pool (never negative).
    pub fn squids_remaining(&self) -> u32 {
        self.total_squids.saturating_sub(self.squids_dealt)
    }

    /// Requested double events, before shrinking to the room left in the pool.
    pub fn requested_double_events(&self) -> usize {
        usize::from(self.final_double) + usize::from(self.double_per_hand)
    }

    /// Multiplier for holding `squids`: the tier with the highest threshold not
    /// above `squids` wins, 1 below the first threshold.
    pub fn multiplier(&self, squids: u32) -> f64 {
        self.tiers
            .iter()
            .filter(|t| t.squids <= squids)
            .fold(None, |best: Option<&Tier>, t| match best {
                Some(b) if b.squids > t.squids => Some(b),
                _ => Some(t),
            })
            .map_or(1.0, |t| t.mult)
    }
}

/// `(ev, pLose, expectedHands)` triple carried through the recurrences.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Outcome {
    pub ev: f64,
    pub p_lose: f64,
    pub expected_hands: f64,
}

impl Outcome {
    pub const ZERO: Outcome = Outcome {
        ev: 0.0,
        p_lose: 0.0,
        expected_hands: 0.0,
    };
}

/// One row of the per-final-squid-count table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SquidRow {
    #[serde(rename = "sq")]
    pub squids: u32,
    pub freq: f64,
    #[serde(rename = "avgPay")]
    pub avg_pay: f64,
    /// Difference from the previous row's average payoff; absent on the first row.
    pub marg: Option<f64>,
}

/// One point of the discrete payoff distribution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    #[serde(rename = "v")]
    pub value: f64,
    #[serde(rename = "f")]
    pub freq: f64,
}

/// Full outcome distribution for one configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    pub ev: f64,
    #[serde(rename = "pL")]
    pub p_lose: f64,
    #[serde(rename = "aH")]
    pub expected_hands: f64,
    pub mn: f64,
    pub mx: f64,
    pub nsv: Option<f64>,
    pub sqt: Vec<SquidRow>,
    pub hist: Vec<HistogramBin>,
    /// Always true: values are exact, not sampled.
    pub analytical: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_tiers(tiers: Vec<Tier>) -> GameConfig {
        GameConfig {
            n: 4,
            hero_win_rate: 0.3,
            penalty: 1.0,
            hero_squids: 0,
            squids_dealt: 0,
            total_squids: 6,
            sudden_death: false,
            sd_orbit: 1,
            format: Format::Multiplier,
            tiers,
            final_double: false,
            double_per_hand: false,
            opp_dist: None,
        }
    }

    #[test]
    fn test_multiplier_defaults_to_one() {
        let cfg = config_with_tiers(vec![Tier { squids: 2, mult: 2.0 }]);
        assert_eq!(cfg.multiplier(0), 1.0);
        assert_eq!(cfg.multiplier(1), 1.0);
        assert_eq!(cfg.multiplier(2), 2.0);
        assert_eq!(cfg.multiplier(9), 2.0);
    }

    #[test]
    fn test_multiplier_highest_threshold_wins_regardless_of_order() {
        let cfg = config_with_tiers(vec![
            Tier { squids: 4, mult: 3.0 },
            Tier { squids: 2, mult: 2.0 },
        ]);
        assert_eq!(cfg.multiplier(3), 2.0);
        assert_eq!(cfg.multiplier(4), 3.0);
        assert_eq!(cfg.multiplier(5), 3.0);
    }

    #[test]
    fn test_config_defaults_from_json() {
        let cfg: GameConfig = serde_json::from_value(serde_json::json!({
            "n": 5, "heroWinRate": 0.2, "penalty": 10, "format": "single"
        }))
        .unwrap();
        assert_eq!(cfg.sd_orbit, DEFAULT_SD_ORBIT);
        assert_eq!(cfg.hero_squids, 0);
        assert!(cfg.opp_dist.is_none());
        assert_eq!(cfg.requested_double_events(), 0);
    }

    #[test]
    fn test_result_wire_keys() {
        let result = SolveResult {
            ev: 1.0,
            p_lose: 0.5,
            expected_hands: 2.0,
            mn: -1.0,
            mx: 1.0,
            nsv: None,
            sqt: vec![SquidRow {
                squids: 0,
                freq: 1.0,
                avg_pay: 1.0,
                marg: None,
            }],
            hist: vec![HistogramBin {
                value: 1.0,
                freq: 1.0,
            }],
            analytical: true,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["pL"], 0.5);
        assert_eq!(json["aH"], 2.0);
        assert!(json["nsv"].is_null());
        assert_eq!(json["sqt"][0]["sq"], 0);
        assert_eq!(json["sqt"][0]["avgPay"], 1.0);
        assert!(json["sqt"][0]["marg"].is_null());
        assert_eq!(json["hist"][0]["v"], 1.0);
        assert_eq!(json["hist"][0]["f"], 1.0);
    }
}
