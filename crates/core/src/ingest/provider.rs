use crate::config::{env_or, Settings};
use crate::ingest::types::{Dataset, FetchParams, Table};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PATH_PREFIX: &str = "/v1/datasets";
const DEFAULT_RETRIES: u32 = 3;
const MAX_RETRIES: u32 = 10;
const MAX_BACKOFF_SECS: u64 = 30;

/// Source of named market datasets. Each call may fail independently.
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch(&self, dataset: Dataset, params: &FetchParams) -> Result<Table>;
}

#[derive(Debug, Clone)]
pub struct HttpJsonMarketData {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path_prefix: String,
    retries: u32,
}

impl HttpJsonMarketData {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_data_provider_base_url()?.to_string();
        let api_key = settings.data_provider_api_key.clone();

        let timeout_secs = env_or("DATA_PROVIDER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
        let retries = env_or("DATA_PROVIDER_RETRIES", DEFAULT_RETRIES).clamp(1, MAX_RETRIES);

        let path_prefix = std::env::var("DATA_PROVIDER_PATH_PREFIX")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH_PREFIX.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build data provider http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path_prefix,
            retries,
        })
    }

    fn url(&self, dataset: Dataset) -> String {
        let prefix = self.path_prefix.trim_end_matches('/');
        let prefix = if prefix.starts_with('/') {
            prefix.to_string()
        } else {
            format!("/{prefix}")
        };

        format!(
            "{}{}/{}",
            self.base_url.trim_end_matches('/'),
            prefix,
            dataset.as_str()
        )
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(&self, dataset: Dataset, params: &FetchParams) -> Result<Table> {
        let res = self
            .http
            .get(self.url(dataset))
            .headers(self.headers()?)
            .query(params)
            .send()
            .await
            .with_context(|| format!("data provider request failed for {dataset}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read provider response")?;

        if !status.is_success() {
            anyhow::bail!("data provider HTTP {status} for {dataset}: {text}");
        }

        parse_table(&text).with_context(|| format!("failed to decode {dataset} response"))
    }
}

/// Exponential backoff after the given 1-based attempt, capped at `MAX_BACKOFF_SECS`.
fn backoff_delay(attempt: u32) -> Duration {
    let secs = 1u64
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(MAX_BACKOFF_SECS)
        .min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}

/// Accepts either `{"rows": [...]}` or a bare array of row objects.
fn parse_table(text: &str) -> Result<Table> {
    let raw = serde_json::from_str::<Value>(text)
        .with_context(|| format!("provider response is not valid JSON: {text}"))?;
    let table = match raw {
        Value::Array(_) => Table::new(serde_json::from_value(raw)?),
        other => serde_json::from_value::<Table>(other)?,
    };
    Ok(table)
}

#[async_trait::async_trait]
impl MarketDataProvider for HttpJsonMarketData {
    fn provider_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn fetch(&self, dataset: Dataset, params: &FetchParams) -> Result<Table> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(dataset, params).await {
                Ok(table) => return Ok(table),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = backoff_delay(attempt);
                    tracing::warn!(attempt, %dataset, ?backoff, error = %err, "data provider fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str, path_prefix: &str) -> HttpJsonMarketData {
        HttpJsonMarketData {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
            api_key: None,
            path_prefix: path_prefix.to_string(),
            retries: 1,
        }
    }

    #[test]
    fn builds_dataset_urls() {
        let c = client("http://data.local/", "v1/datasets/");
        assert_eq!(
            c.url(Dataset::FundFlowRank),
            "http://data.local/v1/datasets/fund_flow_rank"
        );
        let c = client("http://data.local", DEFAULT_PATH_PREFIX);
        assert_eq!(
            c.url(Dataset::StockQuotes),
            "http://data.local/v1/datasets/stock_quotes"
        );
    }

    #[test]
    fn parses_envelope_and_bare_arrays() {
        let t = parse_table(r#"{"rows":[{"code":"600519","price":1688.0}]}"#).unwrap();
        assert_eq!(t.len(), 1);

        let t = parse_table(r#"[{"code":"000001"},{"code":"000002"}]"#).unwrap();
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
        assert_eq!(backoff_delay(6), Duration::from_secs(MAX_BACKOFF_SECS));
        assert_eq!(backoff_delay(65), Duration::from_secs(MAX_BACKOFF_SECS));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_secs(MAX_BACKOFF_SECS));
    }

    #[test]
    fn rejects_non_object_rows() {
        assert!(parse_table("[1, 2, 3]").is_err());
        assert!(parse_table("not json").is_err());
    }
}
