use super::{params, FilterBatch, Screener, ScreenerContext, ScreenerType};
use crate::domain::candidate::{round2, LongTermFundCandidate, ShortTermFundCandidate};
use crate::error::PipelineError;
use crate::ingest::fields::{col, RowReader};
use crate::ingest::{Dataset, RawDataBundle, Row};

const SHORT_TERM_TOP: usize = 500;
const LONG_TERM_TOP: usize = 1000;

const ST_MAX_RETURN_1W: f64 = 15.0;
const ST_MIN_DAILY_GROWTH: f64 = -3.0;
const LT_MIN_RETURN_6M: f64 = -15.0;

const ELIGIBLE_TYPES: [&str; 4] = ["股票", "混合", "指数", "QDII"];
const EXCLUDED_TYPES: [&str; 2] = ["债", "货币"];
/// Back-end load share classes duplicate their front-end sibling.
const BACK_END_SHARE: &str = "后端";

/// Equity-like funds only: stock, hybrid, index and QDII, never bond or money market.
pub fn is_eligible_fund(fund_type: &str, name: &str) -> bool {
    ELIGIBLE_TYPES.iter().any(|t| fund_type.contains(t))
        && !EXCLUDED_TYPES.iter().any(|t| fund_type.contains(t))
        && !name.contains(BACK_END_SHARE)
}

fn read_identity(r: &RowReader<'_>) -> Result<Option<(String, String, String)>, PipelineError> {
    let code = r.code()?;
    let name = r.text(col::NAME)?;
    let Some(fund_type) = r.opt_text(col::FUND_TYPE) else {
        return Ok(None);
    };
    if !is_eligible_fund(&fund_type, &name) {
        return Ok(None);
    }
    Ok(Some((code, name, fund_type)))
}

/// Momentum screen over trailing weekly and monthly returns.
#[derive(Clone)]
pub struct ShortTermFundScreener {
    ctx: ScreenerContext,
}

impl ShortTermFundScreener {
    pub fn new(ctx: ScreenerContext) -> Self {
        Self { ctx }
    }

    fn evaluate(row: &Row) -> Result<Option<ShortTermFundCandidate>, PipelineError> {
        let r = RowReader::new(row);
        let Some((code, name, fund_type)) = read_identity(&r)? else {
            return Ok(None);
        };

        let nav = r.number(col::NAV)?;
        let daily_growth = r.number(col::DAILY_GROWTH)?;
        let return_1w = r.number(col::RETURN_1W)?;
        let return_1m = r.number(col::RETURN_1M)?;
        let return_3m = r.number(col::RETURN_3M)?;

        let Some(nav) = nav.filter(|v| *v > 0.0) else {
            return Ok(None);
        };
        let Some(return_1w) = return_1w.filter(|v| *v > 0.0 && *v < ST_MAX_RETURN_1W) else {
            return Ok(None);
        };
        let Some(return_1m) = return_1m.filter(|v| *v > 0.0) else {
            return Ok(None);
        };
        if daily_growth.is_some_and(|v| v <= ST_MIN_DAILY_GROWTH) {
            return Ok(None);
        }

        Ok(Some(ShortTermFundCandidate {
            code,
            name,
            fund_type,
            nav,
            daily_growth,
            return_1w,
            return_1m,
            return_3m,
            score: 0.0,
        }))
    }
}

/// Short-term fund score (max 100): weekly momentum 35, monthly return 25,
/// quarterly return 20, fund type 20.
pub fn short_term_fund_score(c: &ShortTermFundCandidate, max_return_1w: f64) -> f64 {
    let mut score = 0.0;

    if max_return_1w > 0.0 {
        score += (c.return_1w.max(0.0) / max_return_1w) * 35.0;
    }

    score += if c.return_1m >= 5.0 {
        25.0
    } else if c.return_1m >= 2.0 {
        20.0
    } else if c.return_1m > 0.0 {
        15.0
    } else {
        5.0
    };

    score += match c.return_3m {
        Some(x) if x >= 10.0 => 20.0,
        Some(x) if x >= 0.0 => 15.0,
        Some(_) => 5.0,
        None => 10.0,
    };

    score += fund_type_score(&c.fund_type);

    round2(score)
}

fn fund_type_score(fund_type: &str) -> f64 {
    if fund_type.contains("指数") {
        20.0
    } else if fund_type.contains("股票") {
        15.0
    } else if fund_type.contains("混合") {
        10.0
    } else {
        5.0
    }
}

#[async_trait::async_trait]
impl Screener for ShortTermFundScreener {
    type Candidate = ShortTermFundCandidate;

    fn screener_type(&self) -> ScreenerType {
        ScreenerType::ShortTermFund
    }

    fn default_limit(&self) -> usize {
        20
    }

    async fn collect_raw_data(&self) -> RawDataBundle {
        let ranking = self
            .ctx
            .fetch_dataset(
                self.screener_type(),
                Dataset::FundRank,
                params([
                    ("sort_by", col::RETURN_1W.to_string()),
                    ("limit", SHORT_TERM_TOP.to_string()),
                ]),
            )
            .await;
        RawDataBundle::new().with(Dataset::FundRank, ranking.head(SHORT_TERM_TOP))
    }

    fn apply_filters(&self, bundle: &RawDataBundle) -> Vec<ShortTermFundCandidate> {
        let mut batch = FilterBatch::new(self.screener_type());
        for row in bundle.get(Dataset::FundRank).iter() {
            batch.record(Self::evaluate(row));
        }
        batch.finish()
    }

    fn calculate_scores(
        &self,
        mut candidates: Vec<ShortTermFundCandidate>,
    ) -> Vec<ShortTermFundCandidate> {
        let max_return_1w = candidates
            .iter()
            .map(|c| c.return_1w)
            .fold(0.0_f64, f64::max);
        for c in candidates.iter_mut() {
            c.score = short_term_fund_score(c, max_return_1w);
        }
        tracing::debug!(event = "scores_computed", screener = %self.screener_type(), count = candidates.len(), max_return_1w);
        candidates
    }
}

/// Track-record screen over one- and three-year returns.
#[derive(Clone)]
pub struct LongTermFundScreener {
    ctx: ScreenerContext,
}

impl LongTermFundScreener {
    pub fn new(ctx: ScreenerContext) -> Self {
        Self { ctx }
    }

    fn evaluate(row: &Row) -> Result<Option<LongTermFundCandidate>, PipelineError> {
        let r = RowReader::new(row);
        let Some((code, name, fund_type)) = read_identity(&r)? else {
            return Ok(None);
        };

        let nav = r.number(col::NAV)?;
        let return_3m = r.number(col::RETURN_3M)?;
        let return_6m = r.number(col::RETURN_6M)?;
        let return_1y = r.number(col::RETURN_1Y)?;
        let return_3y = r.number(col::RETURN_3Y)?;

        let Some(nav) = nav.filter(|v| *v > 0.0) else {
            return Ok(None);
        };
        let Some(return_1y) = return_1y.filter(|v| *v > 0.0) else {
            return Ok(None);
        };
        let Some(return_3y) = return_3y.filter(|v| *v > 0.0) else {
            return Ok(None);
        };
        if return_6m.is_some_and(|v| v < LT_MIN_RETURN_6M) {
            return Ok(None);
        }

        Ok(Some(LongTermFundCandidate {
            code,
            name,
            fund_type,
            nav,
            return_3m,
            return_6m,
            return_1y,
            return_3y,
            score: 0.0,
        }))
    }
}

/// Long-term fund score (max 100): three-year return 40, one-year return 30,
/// consistency across the 3m/6m/1y windows 30.
pub fn long_term_fund_score(c: &LongTermFundCandidate) -> f64 {
    let mut score = 0.0;

    score += if c.return_3y >= 60.0 {
        40.0
    } else if c.return_3y >= 30.0 {
        30.0
    } else if c.return_3y >= 10.0 {
        20.0
    } else {
        10.0
    };

    score += if c.return_1y >= 30.0 {
        30.0
    } else if c.return_1y >= 15.0 {
        25.0
    } else if c.return_1y >= 5.0 {
        20.0
    } else {
        10.0
    };

    let positive = [c.return_3m, c.return_6m, Some(c.return_1y)]
        .into_iter()
        .filter(|r| r.is_some_and(|v| v > 0.0))
        .count();
    score += match positive {
        3 => 30.0,
        2 => 20.0,
        _ => 10.0,
    };

    round2(score)
}

#[async_trait::async_trait]
impl Screener for LongTermFundScreener {
    type Candidate = LongTermFundCandidate;

    fn screener_type(&self) -> ScreenerType {
        ScreenerType::LongTermFund
    }

    fn default_limit(&self) -> usize {
        20
    }

    async fn collect_raw_data(&self) -> RawDataBundle {
        let ranking = self
            .ctx
            .fetch_dataset(
                self.screener_type(),
                Dataset::FundRank,
                params([
                    ("sort_by", col::RETURN_1Y.to_string()),
                    ("limit", LONG_TERM_TOP.to_string()),
                ]),
            )
            .await;
        RawDataBundle::new().with(Dataset::FundRank, ranking.head(LONG_TERM_TOP))
    }

    fn apply_filters(&self, bundle: &RawDataBundle) -> Vec<LongTermFundCandidate> {
        let mut batch = FilterBatch::new(self.screener_type());
        for row in bundle.get(Dataset::FundRank).iter() {
            batch.record(Self::evaluate(row));
        }
        batch.finish()
    }

    fn calculate_scores(
        &self,
        mut candidates: Vec<LongTermFundCandidate>,
    ) -> Vec<LongTermFundCandidate> {
        for c in candidates.iter_mut() {
            c.score = long_term_fund_score(c);
        }
        tracing::debug!(event = "scores_computed", screener = %self.screener_type(), count = candidates.len());
        candidates
    }
}
