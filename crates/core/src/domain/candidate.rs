use serde::{Deserialize, Serialize};

/// A filter-passing instrument that carries a composite score.
pub trait ScoredCandidate: Clone + Serialize + Send + Sync + 'static {
    fn code(&self) -> &str;
    fn name(&self) -> &str;
    /// Last price for stocks, unit NAV for funds.
    fn price(&self) -> Option<f64>;
    fn score(&self) -> f64;
}

/// Fund candidates additionally expose their type label.
pub trait FundCandidate: ScoredCandidate {
    fn fund_type(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortTermStockCandidate {
    pub code: String,
    pub name: String,
    pub price: f64,
    pub change_pct: f64,
    pub turnover: f64,
    pub market_cap: f64,
    pub pe: f64,
    pub volume_ratio: Option<f64>,
    pub main_net_inflow: f64,
    pub main_net_inflow_pct: Option<f64>,
    /// Listed in the popularity ranking.
    pub is_hot: bool,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTermStockCandidate {
    pub code: String,
    pub name: String,
    pub price: Option<f64>,
    pub market_cap: f64,
    pub pe: f64,
    pub pb: f64,
    pub turnover: f64,
    pub change_pct: Option<f64>,
    pub change_60d: Option<f64>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortTermFundCandidate {
    pub code: String,
    pub name: String,
    pub fund_type: String,
    pub nav: f64,
    pub daily_growth: Option<f64>,
    pub return_1w: f64,
    pub return_1m: f64,
    pub return_3m: Option<f64>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTermFundCandidate {
    pub code: String,
    pub name: String,
    pub fund_type: String,
    pub nav: f64,
    pub return_3m: Option<f64>,
    pub return_6m: Option<f64>,
    pub return_1y: f64,
    pub return_3y: f64,
    pub score: f64,
}

macro_rules! impl_scored_candidate {
    ($ty:ty, |$s:ident| $price:expr) => {
        impl ScoredCandidate for $ty {
            fn code(&self) -> &str {
                &self.code
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn price(&self) -> Option<f64> {
                let $s = self;
                $price
            }

            fn score(&self) -> f64 {
                self.score
            }
        }
    };
}

impl_scored_candidate!(ShortTermStockCandidate, |s| Some(s.price));
impl_scored_candidate!(LongTermStockCandidate, |s| s.price);
impl_scored_candidate!(ShortTermFundCandidate, |s| Some(s.nav));
impl_scored_candidate!(LongTermFundCandidate, |s| Some(s.nav));

impl FundCandidate for ShortTermFundCandidate {
    fn fund_type(&self) -> &str {
        &self.fund_type
    }
}

impl FundCandidate for LongTermFundCandidate {
    fn fund_type(&self) -> &str {
        &self.fund_type
    }
}

/// Rounds a score to two decimal places.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(17.5), 17.5);
        assert_eq!(round2(71.666_666), 71.67);
        assert_eq!(round2(0.0), 0.0);
    }
}
