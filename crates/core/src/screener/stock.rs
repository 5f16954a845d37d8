use super::{is_excluded_listing, params, FilterBatch, Screener, ScreenerContext, ScreenerType};
use crate::domain::candidate::{round2, LongTermStockCandidate, ShortTermStockCandidate};
use crate::error::PipelineError;
use crate::ingest::fields::{col, RowReader};
use crate::ingest::{Dataset, FetchParams, RawDataBundle, Row, Table};
use std::collections::{HashMap, HashSet};

const FUND_FLOW_TOP: usize = 200;
const POPULARITY_TOP: usize = 100;
const SECTOR_TOP: usize = 20;

// Short-term hard filters.
const ST_MIN_MARKET_CAP: f64 = 1e10;
const ST_MIN_PRICE: f64 = 5.0;
const ST_MIN_TURNOVER: f64 = 1e8;
const ST_CHANGE_PCT_LOW: f64 = -5.0;
const ST_CHANGE_PCT_HIGH: f64 = 8.0;
const ST_MAX_PE: f64 = 100.0;
const ST_MIN_VOLUME_RATIO: f64 = 1.0;

// Long-term hard filters.
const LT_MIN_MARKET_CAP: f64 = 2e10;
const LT_MAX_PE: f64 = 40.0;
const LT_MAX_PB: f64 = 8.0;
const LT_MIN_TURNOVER: f64 = 5e7;
const LT_MIN_CHANGE_60D: f64 = -20.0;

/// Capital-flow driven screen for holding periods of about a week.
#[derive(Clone)]
pub struct ShortTermStockScreener {
    ctx: ScreenerContext,
}

impl ShortTermStockScreener {
    pub fn new(ctx: ScreenerContext) -> Self {
        Self { ctx }
    }

    fn evaluate(
        row: &Row,
        quotes: &HashMap<String, &Row>,
        hot_codes: &HashSet<String>,
    ) -> Result<Option<ShortTermStockCandidate>, PipelineError> {
        let flow = RowReader::new(row);
        let code = flow.code()?;
        let name = flow.text(col::NAME)?;
        if is_excluded_listing(&code, &name) {
            return Ok(None);
        }

        let Some(quote) = quotes.get(&code) else {
            return Ok(None);
        };
        let quote = RowReader::new(quote);

        let price = quote.number(col::PRICE)?;
        let change_pct = quote.number(col::CHANGE_PCT)?;
        let market_cap = quote.number(col::MARKET_CAP)?;
        let pe = quote.number(col::PE)?;
        let volume_ratio = quote.number(col::VOLUME_RATIO)?;
        let turnover = quote.number(col::TURNOVER)?;
        let main_net_inflow = flow.number(col::MAIN_NET_INFLOW)?;
        let main_net_inflow_pct = flow.number(col::MAIN_NET_INFLOW_PCT)?;

        let Some(market_cap) = market_cap.filter(|v| *v >= ST_MIN_MARKET_CAP) else {
            return Ok(None);
        };
        let Some(price) = price.filter(|v| *v >= ST_MIN_PRICE) else {
            return Ok(None);
        };
        let Some(turnover) = turnover.filter(|v| *v >= ST_MIN_TURNOVER) else {
            return Ok(None);
        };
        // Open interval: avoid limit-up chasing and falling knives.
        let Some(change_pct) =
            change_pct.filter(|v| *v > ST_CHANGE_PCT_LOW && *v < ST_CHANGE_PCT_HIGH)
        else {
            return Ok(None);
        };
        let Some(pe) = pe.filter(|v| *v > 0.0 && *v <= ST_MAX_PE) else {
            return Ok(None);
        };
        let Some(main_net_inflow) = main_net_inflow.filter(|v| *v > 0.0) else {
            return Ok(None);
        };
        if volume_ratio.is_some_and(|v| v < ST_MIN_VOLUME_RATIO) {
            return Ok(None);
        }

        Ok(Some(ShortTermStockCandidate {
            is_hot: hot_codes.contains(&code),
            code,
            name,
            price,
            change_pct,
            turnover,
            market_cap,
            pe,
            volume_ratio,
            main_net_inflow,
            main_net_inflow_pct,
            score: 0.0,
        }))
    }
}

/// Short-term composite score (max 100): inflow 35, volume ratio 20, change 15,
/// popularity 15, valuation 15.
pub fn short_term_stock_score(c: &ShortTermStockCandidate, max_inflow: f64) -> f64 {
    let mut score = 0.0;

    if max_inflow > 0.0 {
        score += (c.main_net_inflow.max(0.0) / max_inflow) * 35.0;
    }

    let vr = c.volume_ratio.unwrap_or(1.0);
    score += if (1.5..=3.0).contains(&vr) {
        20.0
    } else if (1.0..1.5).contains(&vr) {
        15.0
    } else if vr > 3.0 {
        10.0
    } else {
        5.0
    };

    let change = c.change_pct;
    score += if (2.0..=5.0).contains(&change) {
        15.0
    } else if change > 0.0 && change < 2.0 {
        12.0
    } else if change > 5.0 && change < 8.0 {
        8.0
    } else {
        5.0
    };

    score += if c.is_hot { 15.0 } else { 5.0 };

    score += if c.pe > 0.0 && c.pe <= 30.0 {
        15.0
    } else if c.pe > 30.0 && c.pe <= 50.0 {
        10.0
    } else {
        5.0
    };

    round2(score)
}

#[async_trait::async_trait]
impl Screener for ShortTermStockScreener {
    type Candidate = ShortTermStockCandidate;

    fn screener_type(&self) -> ScreenerType {
        ScreenerType::ShortTermStock
    }

    fn default_limit(&self) -> usize {
        30
    }

    async fn collect_raw_data(&self) -> RawDataBundle {
        let screener = self.screener_type();
        let (flow, popularity, sectors) = tokio::join!(
            self.ctx.fetch_dataset(
                screener,
                Dataset::FundFlowRank,
                params([
                    ("indicator", "today".to_string()),
                    ("limit", FUND_FLOW_TOP.to_string()),
                ]),
            ),
            self.ctx.fetch_dataset(
                screener,
                Dataset::PopularityRank,
                params([("limit", POPULARITY_TOP.to_string())]),
            ),
            self.ctx.fetch_dataset(
                screener,
                Dataset::SectorPerformance,
                params([("limit", SECTOR_TOP.to_string())]),
            ),
        );
        let flow = flow.head(FUND_FLOW_TOP);

        // Quotes are only looked up for codes already in the capital-flow ranking.
        let codes: HashSet<String> = flow
            .iter()
            .filter_map(|row| RowReader::new(row).code().ok())
            .collect();

        let mut quotes = Table::default();
        if !codes.is_empty() {
            let mut sorted: Vec<&str> = codes.iter().map(String::as_str).collect();
            sorted.sort_unstable();
            let fetched = self
                .ctx
                .fetch_dataset(
                    screener,
                    Dataset::StockQuotes,
                    params([("codes", sorted.join(","))]),
                )
                .await;
            quotes.rows = fetched
                .rows
                .into_iter()
                .filter(|row| {
                    RowReader::new(row)
                        .code()
                        .is_ok_and(|code| codes.contains(&code))
                })
                .collect();
        }

        RawDataBundle::new()
            .with(Dataset::FundFlowRank, flow)
            .with(Dataset::PopularityRank, popularity.head(POPULARITY_TOP))
            .with(Dataset::SectorPerformance, sectors.head(SECTOR_TOP))
            .with(Dataset::StockQuotes, quotes)
    }

    fn apply_filters(&self, bundle: &RawDataBundle) -> Vec<ShortTermStockCandidate> {
        let mut batch = FilterBatch::new(self.screener_type());
        let flow = bundle.get(Dataset::FundFlowRank);
        if flow.is_empty() {
            tracing::warn!(screener = %self.screener_type(), "no capital-flow data; nothing to screen");
            return batch.finish();
        }

        let hot_codes: HashSet<String> = bundle
            .get(Dataset::PopularityRank)
            .iter()
            .filter_map(|row| RowReader::new(row).code().ok())
            .collect();

        let quotes: HashMap<String, &Row> = bundle
            .get(Dataset::StockQuotes)
            .iter()
            .filter_map(|row| RowReader::new(row).code().ok().map(|code| (code, row)))
            .collect();

        for row in flow.iter() {
            batch.record(Self::evaluate(row, &quotes, &hot_codes));
        }
        batch.finish()
    }

    fn calculate_scores(
        &self,
        mut candidates: Vec<ShortTermStockCandidate>,
    ) -> Vec<ShortTermStockCandidate> {
        let max_inflow = candidates
            .iter()
            .map(|c| c.main_net_inflow)
            .fold(0.0_f64, f64::max);

        for c in candidates.iter_mut() {
            c.score = short_term_stock_score(c, max_inflow);
        }

        tracing::debug!(event = "scores_computed", screener = %self.screener_type(), count = candidates.len(), max_inflow);
        candidates
    }
}

/// Valuation and size driven screen for holding periods of three months or more.
#[derive(Clone)]
pub struct LongTermStockScreener {
    ctx: ScreenerContext,
}

impl LongTermStockScreener {
    pub fn new(ctx: ScreenerContext) -> Self {
        Self { ctx }
    }

    fn evaluate(row: &Row) -> Result<Option<LongTermStockCandidate>, PipelineError> {
        let r = RowReader::new(row);
        let code = r.code()?;
        let name = r.text(col::NAME)?;
        if is_excluded_listing(&code, &name) {
            return Ok(None);
        }

        let price = r.number(col::PRICE)?;
        let market_cap = r.number(col::MARKET_CAP)?;
        let pe = r.number(col::PE)?;
        let pb = r.number(col::PB)?;
        let turnover = r.number(col::TURNOVER)?;
        let change_pct = r.number(col::CHANGE_PCT)?;
        let change_60d = r.number(col::CHANGE_60D)?;

        let Some(market_cap) = market_cap.filter(|v| *v >= LT_MIN_MARKET_CAP) else {
            return Ok(None);
        };
        let Some(pe) = pe.filter(|v| *v > 0.0 && *v <= LT_MAX_PE) else {
            return Ok(None);
        };
        let Some(pb) = pb.filter(|v| *v > 0.0 && *v <= LT_MAX_PB) else {
            return Ok(None);
        };
        let Some(turnover) = turnover.filter(|v| *v >= LT_MIN_TURNOVER) else {
            return Ok(None);
        };
        if change_60d.is_some_and(|v| v < LT_MIN_CHANGE_60D) {
            return Ok(None);
        }

        Ok(Some(LongTermStockCandidate {
            code,
            name,
            price,
            market_cap,
            pe,
            pb,
            turnover,
            change_pct,
            change_60d,
            score: 0.0,
        }))
    }
}

/// Long-term composite score (max 100): valuation 40 (PE 20 + PB 20), size 30,
/// 60-day trend 30.
pub fn long_term_stock_score(c: &LongTermStockCandidate) -> f64 {
    let mut score = 0.0;

    score += if c.pe <= 15.0 {
        20.0
    } else if c.pe <= 25.0 {
        15.0
    } else if c.pe <= 35.0 {
        10.0
    } else {
        5.0
    };

    score += if c.pb <= 2.0 {
        20.0
    } else if c.pb <= 4.0 {
        15.0
    } else if c.pb <= 6.0 {
        10.0
    } else {
        5.0
    };

    score += if c.market_cap >= 5e11 {
        30.0
    } else if c.market_cap >= 2e11 {
        25.0
    } else if c.market_cap >= 1e11 {
        20.0
    } else if c.market_cap >= 5e10 {
        15.0
    } else {
        10.0
    };

    score += match c.change_60d {
        Some(x) if x > 10.0 => 30.0,
        Some(x) if x > 0.0 => 25.0,
        Some(x) if x > -10.0 => 15.0,
        Some(_) => 5.0,
        None => 15.0,
    };

    round2(score)
}

#[async_trait::async_trait]
impl Screener for LongTermStockScreener {
    type Candidate = LongTermStockCandidate;

    fn screener_type(&self) -> ScreenerType {
        ScreenerType::LongTermStock
    }

    fn default_limit(&self) -> usize {
        30
    }

    async fn collect_raw_data(&self) -> RawDataBundle {
        // Full-market scan; no pre-filtered code set.
        let quotes = self
            .ctx
            .fetch_dataset(self.screener_type(), Dataset::StockQuotes, FetchParams::new())
            .await;
        RawDataBundle::new().with(Dataset::StockQuotes, quotes)
    }

    fn apply_filters(&self, bundle: &RawDataBundle) -> Vec<LongTermStockCandidate> {
        let mut batch = FilterBatch::new(self.screener_type());
        for row in bundle.get(Dataset::StockQuotes).iter() {
            batch.record(Self::evaluate(row));
        }
        batch.finish()
    }

    fn calculate_scores(
        &self,
        mut candidates: Vec<LongTermStockCandidate>,
    ) -> Vec<LongTermStockCandidate> {
        for c in candidates.iter_mut() {
            c.score = long_term_stock_score(c);
        }
        tracing::debug!(event = "scores_computed", screener = %self.screener_type(), count = candidates.len());
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, StaticMarketData};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn flow_row(code: &str, name: &str, inflow: Value) -> Value {
        json!({"code": code, "name": name, "main_net_inflow": inflow, "main_net_inflow_pct": 5.1})
    }

    fn quote(code: &str) -> Value {
        json!({
            "code": code,
            "price": 20.0,
            "change_pct": 3.0,
            "market_cap": 5e10,
            "pe": 20.0,
            "volume_ratio": 2.0,
            "turnover": 5e8
        })
    }

    fn quote_with(code: &str, key: &str, value: Value) -> Value {
        let mut q = quote(code);
        q[key] = value;
        q
    }

    fn short_candidate(code: &str, inflow: f64) -> ShortTermStockCandidate {
        ShortTermStockCandidate {
            code: code.to_string(),
            name: code.to_string(),
            price: 10.0,
            change_pct: 1.0,
            turnover: 2e8,
            market_cap: 2e10,
            pe: 20.0,
            volume_ratio: Some(1.2),
            main_net_inflow: inflow,
            main_net_inflow_pct: None,
            is_hot: false,
            score: 0.0,
        }
    }

    fn short_screener(market: StaticMarketData) -> (ShortTermStockScreener, Arc<StaticMarketData>) {
        let market = Arc::new(market);
        (ShortTermStockScreener::new(context(market.clone())), market)
    }

    #[test]
    fn inflow_term_is_proportional_to_max_inflow() {
        let (screener, _) = short_screener(StaticMarketData::new());
        let scored = screener.calculate_scores(vec![
            short_candidate("000001", 100.0),
            short_candidate("000002", 50.0),
            short_candidate("000003", 0.0),
        ]);

        // Other terms: volume 15 + change 12 + popularity 5 + valuation 15 = 47.
        let inflow_terms: Vec<f64> = scored.iter().map(|c| c.score - 47.0).collect();
        assert_eq!(inflow_terms, vec![35.0, 17.5, 0.0]);

        let ranked = crate::screener::rank_and_limit(ScreenerType::ShortTermStock, 3, scored, 3).unwrap();
        assert_eq!(ranked[0].code, "000001");
    }

    #[test]
    fn empty_inputs_produce_empty_outputs() {
        let (screener, _) = short_screener(StaticMarketData::new());
        assert!(screener.apply_filters(&RawDataBundle::new()).is_empty());
        assert!(screener.calculate_scores(Vec::new()).is_empty());

        let long = LongTermStockScreener::new(context(Arc::new(StaticMarketData::new())));
        assert!(long.apply_filters(&RawDataBundle::new()).is_empty());
        assert!(long.calculate_scores(Vec::new()).is_empty());
    }

    #[test]
    fn short_term_score_tiers() {
        let mut c = short_candidate("000001", 10.0);
        c.volume_ratio = Some(2.0);
        c.change_pct = 3.0;
        c.is_hot = true;
        c.pe = 25.0;
        assert_eq!(short_term_stock_score(&c, 10.0), 100.0);

        c.volume_ratio = Some(4.0);
        c.change_pct = 6.0;
        c.is_hot = false;
        c.pe = 45.0;
        assert_eq!(short_term_stock_score(&c, 20.0), 17.5 + 10.0 + 8.0 + 5.0 + 10.0);

        c.volume_ratio = None;
        c.change_pct = -1.0;
        c.pe = 80.0;
        assert_eq!(short_term_stock_score(&c, 30.0), 41.67);
    }

    #[test]
    fn score_is_deterministic() {
        let c = short_candidate("000001", 42.0);
        assert_eq!(short_term_stock_score(&c, 77.0), short_term_stock_score(&c, 77.0));
    }

    #[tokio::test]
    async fn short_term_screen_applies_every_hard_filter() {
        let flow = json!([
            flow_row("600519", "贵州茅台", json!(9e8)),
            flow_row("000002", "*ST万科", json!(8e8)),
            flow_row("300001", "N特锐", json!(8e8)),
            flow_row("200012", "南玻B", json!(8e8)),
            flow_row("000333", "美的集团", json!(-1.0)),
            flow_row("600036", "招商银行", json!(5e8)),
            flow_row("601318", "中国平安", json!("garbled")),
            flow_row("000858", "五粮液", json!(3e8)),
            flow_row("002415", "海康威视", json!(3e8)),
            flow_row("600000", "浦发银行", json!(3e8)),
            flow_row("600104", "上汽集团", json!(3e8)),
            flow_row("601012", "隆基绿能", json!(3e8)),
            flow_row("600900", "长江电力", json!(3e8)),
            flow_row("000001", "平安银行", json!(2e8)),
            {"name": "no code"}
        ]);
        let quotes = json!([
            quote("600519"),
            quote("000002"),
            quote("300001"),
            quote("200012"),
            quote("000333"),
            quote_with("600036", "change_pct", json!(8.0)),
            quote("601318"),
            quote_with("000858", "change_pct", json!(-5.0)),
            quote_with("002415", "pe", json!(-3.0)),
            quote_with("600000", "market_cap", json!(9e9)),
            quote_with("600104", "volume_ratio", json!(0.8)),
            quote_with("601012", "price", json!(4.99)),
            quote_with("600900", "turnover", json!(9.9e7)),
            quote("000001"),
            quote("999999")
        ]);
        let market = StaticMarketData::new()
            .with(Dataset::FundFlowRank, flow)
            .with(Dataset::StockQuotes, quotes)
            .with(Dataset::PopularityRank, json!([{"code": 1}]))
            .failing(Dataset::SectorPerformance);
        let (screener, market) = short_screener(market);

        let out = screener.screen(Some(10)).await.unwrap();
        let codes: Vec<_> = out.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["600519", "000001"]);

        // 000001 is in the popularity list (integer code normalized).
        assert!(out[1].is_hot);
        assert!(!out[0].is_hot);
        for c in &out {
            assert!(c.change_pct > -5.0 && c.change_pct < 8.0);
            assert!(c.pe > 0.0 && c.pe <= 100.0);
            assert!(c.main_net_inflow > 0.0);
            assert!(c.market_cap >= 1e10 && c.price >= 5.0 && c.turnover >= 1e8);
        }

        // Quote lookup was restricted to capital-flow codes.
        let quote_params = market.params_for(Dataset::StockQuotes);
        let requested = quote_params[0].get("codes").cloned().unwrap_or_default();
        assert!(requested.contains("600519"));
        assert!(!requested.contains("999999"));
    }

    #[tokio::test]
    async fn short_term_screen_without_capital_flow_is_empty() {
        let market = StaticMarketData::new()
            .failing(Dataset::FundFlowRank)
            .with(Dataset::StockQuotes, json!([quote("600519")]));
        let (screener, market) = short_screener(market);

        assert!(screener.screen(None).await.unwrap().is_empty());
        assert_eq!(market.call_count(Dataset::StockQuotes), 0);
    }

    #[tokio::test]
    async fn short_term_missing_quote_excludes_row() {
        let market = StaticMarketData::new()
            .with(Dataset::FundFlowRank, json!([flow_row("600519", "贵州茅台", json!(1e9))]));
        let (screener, _) = short_screener(market);
        assert!(screener.screen(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn short_term_filter_bounds_are_inclusive() {
        let flow = json!([
            flow_row("600001", "甲", json!(5e8)),
            flow_row("600002", "乙", json!(5e8)),
            flow_row("600003", "丙", json!(5e8)),
            flow_row("600004", "丁", json!(5e8))
        ]);
        let quotes = json!([
            quote_with("600001", "pe", json!(100.0)),
            quote_with("600002", "pe", json!(100.01)),
            quote_with("600003", "volume_ratio", json!(1.0)),
            quote_with("600004", "volume_ratio", json!(0.99))
        ]);
        let market = StaticMarketData::new()
            .with(Dataset::FundFlowRank, flow)
            .with(Dataset::StockQuotes, quotes);
        let (screener, _) = short_screener(market);

        let mut codes: Vec<_> = screener
            .screen(None)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.code)
            .collect();
        codes.sort();
        assert_eq!(codes, vec!["600001", "600003"]);
    }

    fn lt_row(code: &str, name: &str, cap: f64, pe: Value, pb: Value, change_60d: Value) -> Value {
        json!({
            "code": code,
            "name": name,
            "price": 30.0,
            "market_cap": cap,
            "pe": pe,
            "pb": pb,
            "turnover": 1e8,
            "change_pct": 0.5,
            "change_60d": change_60d
        })
    }

    #[tokio::test]
    async fn long_term_screen_filters_scores_and_ranks() {
        let quotes = json!([
            lt_row("600519", "贵州茅台", 2.1e12, json!(28.0), json!(9.5), json!(5.0)),
            lt_row("601398", "工商银行", 2.0e12, json!(5.5), json!(0.6), json!(12.0)),
            lt_row("600036", "招商银行", 8.0e11, json!(6.0), json!(0.9), json!(-25.0)),
            lt_row("000333", "美的集团", 4.0e11, json!(13.0), json!(3.0), json!(null)),
            lt_row("002594", "比亚迪", 7.0e11, json!(45.0), json!(5.0), json!(3.0)),
            lt_row("600000", "浦发银行", 1.9e10, json!(5.0), json!(0.4), json!(1.0)),
            lt_row("000651", "格力电器", 2.5e11, json!(null), json!(2.0), json!(1.0)),
            lt_row("600030", "ST中信", 3.0e11, json!(15.0), json!(1.5), json!(1.0)),
            lt_row("600887", "伊利股份", 1.8e11, json!("x"), json!(3.0), json!(1.0)),
            lt_row("601888", "中国中免", 2.2e11, json!(30.0), json!(5.0), json!(-12.0))
        ]);
        let market = Arc::new(StaticMarketData::new().with(Dataset::StockQuotes, quotes));
        let screener = LongTermStockScreener::new(context(market.clone()));

        let out = screener.screen(None).await.unwrap();
        let summary: Vec<_> = out.iter().map(|c| (c.code.as_str(), c.score)).collect();
        assert_eq!(
            summary,
            vec![
                ("601398", 100.0),
                ("000333", 75.0),
                ("601888", 50.0),
            ]
        );
        assert!(market.params_for(Dataset::StockQuotes)[0].is_empty());
    }

    #[tokio::test]
    async fn long_term_filter_bounds_are_inclusive() {
        let quotes = json!([
            lt_row("601001", "甲", 6e11, json!(40.0), json!(1.0), json!(5.0)),
            lt_row("601002", "乙", 6e11, json!(40.01), json!(1.0), json!(5.0)),
            lt_row("601003", "丙", 6e11, json!(10.0), json!(8.0), json!(5.0)),
            lt_row("601004", "丁", 6e11, json!(10.0), json!(8.01), json!(5.0)),
            lt_row("601005", "戊", 6e11, json!(10.0), json!(1.0), json!(-20.0)),
            lt_row("601006", "己", 6e11, json!(10.0), json!(1.0), json!(-20.01)),
            lt_row("601007", "庚", 2e10, json!(10.0), json!(1.0), json!(5.0))
        ]);
        let market = Arc::new(StaticMarketData::new().with(Dataset::StockQuotes, quotes));
        let screener = LongTermStockScreener::new(context(market));

        let mut codes: Vec<_> = screener
            .screen(None)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.code)
            .collect();
        codes.sort();
        assert_eq!(codes, vec!["601001", "601003", "601005", "601007"]);
    }

    #[tokio::test]
    async fn long_term_screen_respects_limit() {
        let rows: Vec<Value> = (0..12)
            .map(|i| lt_row(&format!("6000{i:02}"), "样本", 6e11, json!(10.0 + i as f64), json!(1.0), json!(5.0)))
            .collect();
        let market = Arc::new(StaticMarketData::new().with(Dataset::StockQuotes, Value::Array(rows)));
        let screener = LongTermStockScreener::new(context(market));

        let out = screener.screen(Some(4)).await.unwrap();
        assert_eq!(out.len(), 4);
        assert!(out.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn long_term_score_tiers() {
        let mut c = LongTermStockCandidate {
            code: "600000".to_string(),
            name: "x".to_string(),
            price: None,
            market_cap: 2e10,
            pe: 36.0,
            pb: 7.0,
            turnover: 1e8,
            change_pct: None,
            change_60d: Some(-10.0),
            score: 0.0,
        };
        assert_eq!(long_term_stock_score(&c), 5.0 + 5.0 + 10.0 + 5.0);

        c.change_60d = None;
        c.market_cap = 1e11;
        assert_eq!(long_term_stock_score(&c), 5.0 + 5.0 + 20.0 + 15.0);
    }
}
