//! Four-stage screening pipeline: collect, filter, score, rank.
//!
//! Every variant implements [`Screener`]; the provided [`Screener::screen`] drives
//! the stages and enforces the output contract (length bounded by the limit, sorted
//! by score descending, ties kept in filter order). Data problems never fail a
//! screen: a dataset that cannot be fetched is empty, and a row that cannot be read
//! is skipped.

pub mod fund;
pub mod stock;

use crate::cache::CacheFacade;
use crate::config::env_or;
use crate::domain::candidate::ScoredCandidate;
use crate::error::PipelineError;
use crate::ingest::{Dataset, FetchParams, MarketDataProvider, RawDataBundle, Table};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub use fund::{LongTermFundScreener, ShortTermFundScreener};
pub use stock::{LongTermStockScreener, ShortTermStockScreener};

const DEFAULT_DATASET_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenerType {
    ShortTermStock,
    LongTermStock,
    ShortTermFund,
    LongTermFund,
}

impl ScreenerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortTermStock => "short_term_stock",
            Self::LongTermStock => "long_term_stock",
            Self::ShortTermFund => "short_term_fund",
            Self::LongTermFund => "long_term_fund",
        }
    }
}

impl fmt::Display for ScreenerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait::async_trait]
pub trait Screener: Send + Sync {
    type Candidate: ScoredCandidate;

    fn screener_type(&self) -> ScreenerType;

    fn default_limit(&self) -> usize;

    /// Gathers this variant's datasets. Each dataset is fetched behind its own
    /// fail-soft boundary.
    async fn collect_raw_data(&self) -> RawDataBundle;

    /// Returns the rows that pass every hard constraint, in dataset order.
    fn apply_filters(&self, bundle: &RawDataBundle) -> Vec<Self::Candidate>;

    /// Annotates each candidate with its composite score. Must keep the candidate
    /// count unchanged.
    fn calculate_scores(&self, candidates: Vec<Self::Candidate>) -> Vec<Self::Candidate>;

    async fn screen(&self, limit: Option<usize>) -> Result<Vec<Self::Candidate>, PipelineError> {
        let screener = self.screener_type();
        let default_limit = self.default_limit();
        if default_limit == 0 {
            return Err(PipelineError::StructuralViolation(format!(
                "{screener} declares a default limit of 0"
            )));
        }
        let limit = limit.unwrap_or(default_limit);

        let bundle = self.collect_raw_data().await;
        let candidates = self.apply_filters(&bundle);
        drop(bundle);

        let filtered = candidates.len();
        let scored = self.calculate_scores(candidates);
        rank_and_limit(screener, filtered, scored, limit)
    }
}

/// Checks the scoring contract, then sorts descending by score (stable) and
/// truncates.
pub(crate) fn rank_and_limit<C: ScoredCandidate>(
    screener: ScreenerType,
    filtered: usize,
    mut scored: Vec<C>,
    limit: usize,
) -> Result<Vec<C>, PipelineError> {
    if scored.len() != filtered {
        return Err(PipelineError::StructuralViolation(format!(
            "{screener} scoring returned {} candidates for {filtered} filtered",
            scored.len()
        )));
    }

    if let Some(bad) = scored
        .iter()
        .find(|c| !c.score().is_finite() || c.score() < 0.0)
    {
        return Err(PipelineError::StructuralViolation(format!(
            "{screener} produced invalid score {} for {}",
            bad.score(),
            bad.code()
        )));
    }

    scored.sort_by(|a, b| b.score().total_cmp(&a.score()));
    scored.truncate(limit);

    tracing::info!(
        event = "screening_completed",
        %screener,
        filtered,
        returned = scored.len(),
        limit,
        top_score = scored.first().map(|c| c.score()),
        "screening completed"
    );
    Ok(scored)
}

/// Shared name/code exclusions for A-share listings: special-treatment names,
/// first-day (`N`) and pending-confirmation (`C`) listings, and B-share code ranges.
pub fn is_excluded_listing(code: &str, name: &str) -> bool {
    name.contains("ST")
        || name.starts_with('N')
        || name.starts_with('C')
        || code.starts_with("900")
        || code.starts_with("200")
}

/// Collaborators shared by all screeners.
#[derive(Clone)]
pub struct ScreenerContext {
    market: Arc<dyn MarketDataProvider>,
    cache: CacheFacade,
    screening_date: NaiveDate,
    dataset_ttl_secs: u64,
}

impl ScreenerContext {
    pub fn new(market: Arc<dyn MarketDataProvider>, cache: CacheFacade) -> Self {
        Self {
            market,
            cache,
            screening_date: crate::time::cn_market::screening_date(Utc::now()),
            dataset_ttl_secs: env_or("SCREENER_CACHE_TTL_SECS", DEFAULT_DATASET_TTL_SECS),
        }
    }

    pub fn with_screening_date(mut self, date: NaiveDate) -> Self {
        self.screening_date = date;
        self
    }

    pub fn screening_date(&self) -> NaiveDate {
        self.screening_date
    }

    pub fn cache_key(&self, screener: ScreenerType, suffix: &str) -> String {
        format!("screener:{screener}:{}:{suffix}", self.screening_date)
    }

    /// Fetches one dataset through the per-day cache. Failures and empty results
    /// come back as an empty table and are not cached.
    pub async fn fetch_dataset(
        &self,
        screener: ScreenerType,
        dataset: Dataset,
        params: FetchParams,
    ) -> Table {
        let key = self.cache_key(screener, dataset.as_str());
        if let Some(table) = self.cache.get_json::<Table>(&key).await {
            tracing::debug!(event = "dataset_cache_hit", %screener, %dataset, rows = table.len());
            return table;
        }

        let reason = match self.market.fetch(dataset, &params).await {
            Ok(table) if !table.is_empty() => {
                tracing::info!(
                    event = "dataset_fetched",
                    %screener,
                    %dataset,
                    provider = self.market.provider_name(),
                    rows = table.len(),
                    "dataset fetched"
                );
                self.cache
                    .set_json(&key, &table, self.dataset_ttl_secs)
                    .await;
                return table;
            }
            Ok(_) => "provider returned no rows".to_string(),
            Err(e) => format!("{e:#}"),
        };

        let err = PipelineError::DataUnavailable { dataset, reason };
        tracing::warn!(event = "dataset_unavailable", %screener, error = %err, "continuing with empty dataset");
        Table::default()
    }
}

/// Accumulates per-row filter outcomes and logs the batch once.
pub(crate) struct FilterBatch<C> {
    screener: ScreenerType,
    passed: Vec<C>,
    rejected: usize,
    malformed: usize,
    first_error: Option<PipelineError>,
}

impl<C> FilterBatch<C> {
    pub(crate) fn new(screener: ScreenerType) -> Self {
        Self {
            screener,
            passed: Vec::new(),
            rejected: 0,
            malformed: 0,
            first_error: None,
        }
    }

    pub(crate) fn record(&mut self, outcome: Result<Option<C>, PipelineError>) {
        match outcome {
            Ok(Some(c)) => self.passed.push(c),
            Ok(None) => self.rejected += 1,
            Err(e) => {
                self.malformed += 1;
                self.first_error.get_or_insert(e);
            }
        }
    }

    pub(crate) fn finish(self) -> Vec<C> {
        let screener = self.screener;
        if let Some(err) = &self.first_error {
            tracing::warn!(
                %screener,
                malformed = self.malformed,
                first_error = %err,
                "skipped malformed rows"
            );
        }
        tracing::info!(
            event = "candidates_filtered",
            %screener,
            passed = self.passed.len(),
            rejected = self.rejected,
            malformed = self.malformed,
            "filters applied"
        );
        self.passed
    }
}

pub(crate) fn params<const N: usize>(pairs: [(&str, String); N]) -> FetchParams {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
