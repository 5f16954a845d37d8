//! Deterministic horizon results built straight from screening output.

use crate::domain::candidate::{FundCandidate, ScoredCandidate};
use crate::domain::recommendation::{
    FundPick, Horizon, HorizonRecommendation, RecommendationSource, StockPick,
};
use serde_json::{Map, Value};

pub const FALLBACK_STOCKS: usize = 8;
pub const FALLBACK_FUNDS: usize = 5;
pub const SCREENING_ONLY_STOCKS: usize = 15;
pub const SCREENING_ONLY_FUNDS: usize = 10;

pub const FALLBACK_CONFIDENCE: &str = "medium";
pub const FALLBACK_NARRATIVE: &str = "Text generation unavailable; returning screening results";
pub const SCREENING_ONLY_NARRATIVE: &str = "Text generation not used; returning screening results";
pub const SCREENING_RISK_WARNING: &str =
    "Screening output only; apply your own judgement before investing";

/// Keys already surfaced as first-class pick fields.
const PROMOTED_KEYS: [&str; 5] = ["code", "name", "price", "nav", "score"];

fn fallback_logic(score: f64) -> String {
    format!("Composite score {score}, selected by quantitative screening")
}

/// Candidate metrics not promoted to pick fields.
fn candidate_details<C: ScoredCandidate>(c: &C) -> Map<String, Value> {
    match serde_json::to_value(c) {
        Ok(Value::Object(mut map)) => {
            for key in PROMOTED_KEYS {
                map.remove(key);
            }
            map.remove("fund_type");
            map
        }
        _ => Map::new(),
    }
}

fn stock_pick<C: ScoredCandidate>(c: &C, annotated: bool) -> StockPick {
    StockPick {
        code: c.code().to_string(),
        name: c.name().to_string(),
        current_price: c.price(),
        recommendation_score: Some(c.score()),
        investment_logic: annotated.then(|| fallback_logic(c.score())),
        confidence: annotated.then(|| FALLBACK_CONFIDENCE.to_string()),
        details: if annotated { Map::new() } else { candidate_details(c) },
    }
}

fn fund_pick<C: FundCandidate>(c: &C, annotated: bool) -> FundPick {
    FundPick {
        code: c.code().to_string(),
        name: c.name().to_string(),
        current_nav: c.price(),
        recommendation_score: Some(c.score()),
        fund_type: Some(c.fund_type().to_string()),
        investment_logic: annotated.then(|| fallback_logic(c.score())),
        confidence: annotated.then(|| FALLBACK_CONFIDENCE.to_string()),
        details: if annotated { Map::new() } else { candidate_details(c) },
    }
}

/// Top 8 stocks and top 5 funds with a templated rationale. Used when generation
/// fails for a horizon.
pub fn fallback_horizon<S, F>(horizon: Horizon, stocks: &[S], funds: &[F]) -> HorizonRecommendation
where
    S: ScoredCandidate,
    F: FundCandidate,
{
    HorizonRecommendation {
        horizon,
        source: RecommendationSource::Fallback,
        stocks: stocks
            .iter()
            .take(FALLBACK_STOCKS)
            .map(|c| stock_pick(c, true))
            .collect(),
        funds: funds
            .iter()
            .take(FALLBACK_FUNDS)
            .map(|c| fund_pick(c, true))
            .collect(),
        narrative: FALLBACK_NARRATIVE.to_string(),
        sector_preference: Vec::new(),
        risk_warning: SCREENING_RISK_WARNING.to_string(),
    }
}

/// Top 15 stocks and top 10 funds as screened, metrics attached. Used when
/// generation is disabled or no generator is configured.
pub fn screening_only_horizon<S, F>(
    horizon: Horizon,
    stocks: &[S],
    funds: &[F],
) -> HorizonRecommendation
where
    S: ScoredCandidate,
    F: FundCandidate,
{
    HorizonRecommendation {
        horizon,
        source: RecommendationSource::ScreeningOnly,
        stocks: stocks
            .iter()
            .take(SCREENING_ONLY_STOCKS)
            .map(|c| stock_pick(c, false))
            .collect(),
        funds: funds
            .iter()
            .take(SCREENING_ONLY_FUNDS)
            .map(|c| fund_pick(c, false))
            .collect(),
        narrative: SCREENING_ONLY_NARRATIVE.to_string(),
        sector_preference: Vec::new(),
        risk_warning: SCREENING_RISK_WARNING.to_string(),
    }
}
