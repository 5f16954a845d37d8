//! Hand-written collaborators for unit tests.

use crate::cache::CacheFacade;
use crate::ingest::{Dataset, FetchParams, MarketDataProvider, Row, Table};
use crate::llm::{Provider, TextGenerator};
use crate::screener::ScreenerContext;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) fn screening_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

/// Screener context over `market` with caching off and a fixed screening date.
pub(crate) fn context(market: std::sync::Arc<StaticMarketData>) -> ScreenerContext {
    ScreenerContext::new(market, CacheFacade::disabled()).with_screening_date(screening_date())
}

/// Serves fixed tables and records every request.
#[derive(Default)]
pub(crate) struct StaticMarketData {
    tables: HashMap<Dataset, Table>,
    failing: HashSet<Dataset>,
    calls: Mutex<Vec<(Dataset, FetchParams)>>,
}

impl StaticMarketData {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// `rows` must be a JSON array of objects.
    pub(crate) fn with(mut self, dataset: Dataset, rows: Value) -> Self {
        let rows: Vec<Row> = serde_json::from_value(rows).expect("fixture rows must be objects");
        self.tables.insert(dataset, Table::new(rows));
        self
    }

    pub(crate) fn failing(mut self, dataset: Dataset) -> Self {
        self.failing.insert(dataset);
        self
    }

    pub(crate) fn call_count(&self, dataset: Dataset) -> usize {
        self.params_for(dataset).len()
    }

    pub(crate) fn params_for(&self, dataset: Dataset) -> Vec<FetchParams> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(d, _)| *d == dataset)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for StaticMarketData {
    fn provider_name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self, dataset: Dataset, params: &FetchParams) -> anyhow::Result<Table> {
        self.calls.lock().unwrap().push((dataset, params.clone()));
        if self.failing.contains(&dataset) {
            anyhow::bail!("{dataset} is down");
        }
        Ok(self.tables.get(&dataset).cloned().unwrap_or_default())
    }
}

/// Replies according to the first rule whose needle occurs in the prompt. Prompts
/// matching no rule fail.
#[derive(Default)]
pub(crate) struct ScriptedGenerator {
    rules: Vec<(String, Result<String, String>)>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(mut self, needle: &str, text: impl Into<String>) -> Self {
        self.rules.push((needle.to_string(), Ok(text.into())));
        self
    }

    pub(crate) fn fail(mut self, needle: &str, message: &str) -> Self {
        self.rules.push((needle.to_string(), Err(message.to_string())));
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TextGenerator for ScriptedGenerator {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.rules.iter().find(|(needle, _)| prompt.contains(needle)) {
            Some((_, Ok(text))) => Ok(text.clone()),
            Some((_, Err(message))) => Err(anyhow::anyhow!("{message}")),
            None => Err(anyhow::anyhow!("no scripted reply")),
        }
    }
}
