//! Request-level computations shared by the HTTP server and the CLI:
//! validating a raw JSON configuration and dispatching it to a solver.

use serde_json::{Map, Value};

use crate::constants::*;
use crate::error::{SolveError, ValidationError};
use crate::progressive_solver::solve_progressive;
use crate::single_solver::solve_single;
use crate::types::{Format, GameConfig, SolveResult};

/// Count fields that may arrive as integral floats (`6.0`).
const COUNT_FIELDS: [&str; 5] = ["n", "heroSquids", "squidsDealt", "totalSquids", "sdOrbit"];

/// `Some(integer)` for a float that holds a non-negative whole number.
fn integral(value: &Value) -> Option<Value> {
    let f = value.as_f64().filter(|_| value.is_f64())?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64)
        .then(|| Value::from(f as u64))
}

fn normalize_count(value: &mut Value) {
    if let Some(whole) = integral(value) {
        *value = whole;
    }
}

/// Rewrite integral floats in count fields as integers so they deserialize
/// into `u32`.
fn normalize_counts(obj: &mut Map<String, Value>) {
    for field in COUNT_FIELDS {
        if let Some(value) = obj.get_mut(field) {
            normalize_count(value);
        }
    }
    if let Some(Value::Array(tiers)) = obj.get_mut("tiers") {
        for squids in tiers.iter_mut().filter_map(|t| t.get_mut("squids")) {
            normalize_count(squids);
        }
    }
    if let Some(Value::Array(held)) = obj.get_mut("oppDist") {
        held.iter_mut().for_each(normalize_count);
    }
}

/// Validate a raw request body and build the configuration.
///
/// Field checks run in the order the frontend reports them: body shape, player
/// count, win rate, penalty, format. Only then is the full configuration
/// deserialized and checked for internal consistency.
pub fn validate_config(body: &Value) -> Result<GameConfig, ValidationError> {
    let mut body = body.clone();
    normalize_counts(body.as_object_mut().ok_or(ValidationError::InvalidBody)?);
    let obj = body.as_object().ok_or(ValidationError::InvalidBody)?;

    let n = obj.get("n").and_then(Value::as_u64);
    if !matches!(n, Some(n) if (MIN_PLAYERS as u64..=MAX_PLAYERS as u64).contains(&n)) {
        return Err(ValidationError::Players);
    }
    let wr = obj.get("heroWinRate").and_then(Value::as_f64);
    if !matches!(wr, Some(wr) if wr > 0.0 && wr < 1.0) {
        return Err(ValidationError::WinRate);
    }
    let penalty = obj.get("penalty").and_then(Value::as_f64);
    if !matches!(penalty, Some(p) if p > 0.0 && p <= MAX_PENALTY) {
        return Err(ValidationError::Penalty);
    }
    let format = obj.get("format").and_then(Value::as_str);
    if !matches!(format, Some("single" | "progressive" | "multiplier")) {
        return Err(ValidationError::Format);
    }

    let cfg: GameConfig =
        serde_json::from_value(body).map_err(|e| ValidationError::Field(e.to_string()))?;

    if !(1..=MAX_SD_ORBIT).contains(&cfg.sd_orbit) {
        return Err(ValidationError::SuddenDeathOrbit);
    }
    if cfg.total_squids > MAX_TOTAL_SQUIDS {
        return Err(ValidationError::TotalSquids);
    }
    if cfg.squids_dealt > cfg.total_squids {
        return Err(ValidationError::SquidsDealt);
    }
    if cfg.hero_squids > cfg.squids_dealt {
        return Err(ValidationError::HeroSquids);
    }
    if cfg
        .tiers
        .iter()
        .any(|t| !t.mult.is_finite() || t.mult <= 0.0)
    {
        return Err(ValidationError::Tiers);
    }
    if let Some(held) = &cfg.opp_dist {
        if held.len() >= cfg.n as usize || held.iter().any(|&h| h > cfg.squids_dealt) {
            return Err(ValidationError::OpponentHoldings);
        }
    }
    Ok(cfg)
}

/// Solve a validated configuration with the solver for its format.
pub fn solve(cfg: &GameConfig) -> Result<SolveResult, SolveError> {
    let result = match cfg.format {
        Format::Single => solve_single(cfg),
        Format::Progressive | Format::Multiplier => solve_progressive(cfg),
    };
    ensure_finite(&result)?;
    Ok(result)
}

fn ensure_finite(result: &SolveResult) -> Result<(), SolveError> {
    let scalars = [
        ("ev", result.ev),
        ("pL", result.p_lose),
        ("aH", result.expected_hands),
        ("mn", result.mn),
        ("mx", result.mx),
        ("nsv", result.nsv.unwrap_or(0.0)),
    ];
    if let Some((name, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
        return Err(SolveError::NonFinite(*name));
    }
    if result
        .hist
        .iter()
        .any(|b| !b.value.is_finite() || !b.freq.is_finite())
    {
        return Err(SolveError::NonFinite("hist"));
    }
    if result
        .sqt
        .iter()
        .any(|r| !r.freq.is_finite() || !r.avg_pay.is_finite())
    {
        return Err(SolveError::NonFinite("sqt"));
    }
    Ok(())
}
