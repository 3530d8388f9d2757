//! Shared shaping of solver output: the per-squid-count table, histogram bins
//! and extrema, and the final [`SolveResult`].

use std::collections::BTreeMap;

use crate::constants::PROBABILITY_EPSILON;
use crate::types::{HistogramBin, Outcome, SolveResult, SquidRow};

/// Per-final-squid-count accumulator: total probability and total
/// probability-weighted payoff for each count.
#[derive(Debug, Default)]
pub struct SquidTally {
    rows: BTreeMap<u32, (f64, f64)>,
}

impl SquidTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, squids: u32, freq: f64, weighted_pay: f64) {
        let entry = self.rows.entry(squids).or_insert((0.0, 0.0));
        entry.0 += freq;
        entry.1 += weighted_pay;
    }

    /// Rows ordered by squid count with average payoffs and marginals filled in.
    pub fn into_table(self) -> Vec<SquidRow> {
        squid_table(
            self.rows
                .into_iter()
                .map(|(sq, (freq, total))| (sq, freq, total / freq)),
        )
    }
}

/// Build the squid table from `(squids, freq, avg_pay)` triples.
///
/// Rows are sorted by squid count; each row's marginal is its average payoff
/// minus the previous row's, and the first row has none.
pub fn squid_table(rows: impl IntoIterator<Item = (u32, f64, f64)>) -> Vec<SquidRow> {
    let mut rows: Vec<(u32, f64, f64)> = rows.into_iter().collect();
    rows.sort_by_key(|&(sq, _, _)| sq);

    let mut prev: Option<f64> = None;
    rows.into_iter()
        .map(|(squids, freq, avg_pay)| {
            let marg = prev.map(|p| avg_pay - p);
            prev = Some(avg_pay);
            SquidRow {
                squids,
                freq,
                avg_pay,
                marg,
            }
        })
        .collect()
}

/// Append a closed-form histogram bin unless its probability is negligible.
pub fn push_bin(hist: &mut Vec<HistogramBin>, value: f64, freq: f64) {
    if freq > PROBABILITY_EPSILON {
        hist.push(HistogramBin { value, freq });
    }
}

/// `(min, max)` over histogram values, `(0, 0)` for an empty histogram.
pub fn histogram_bounds(hist: &[HistogramBin]) -> (f64, f64) {
    if hist.is_empty() {
        return (0.0, 0.0);
    }
    hist.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), b| {
            (lo.min(b.value), hi.max(b.value))
        })
}

/// Final result for either solver.
pub fn assemble(
    outcome: Outcome,
    nsv: Option<f64>,
    sqt: Vec<SquidRow>,
    hist: Vec<HistogramBin>,
) -> SolveResult {
    let (mn, mx) = histogram_bounds(&hist);
    SolveResult {
        ev: outcome.ev,
        p_lose: outcome.p_lose,
        expected_hands: outcome.expected_hands,
        mn,
        mx,
        nsv,
        sqt,
        hist,
        analytical: true,
    }
}
