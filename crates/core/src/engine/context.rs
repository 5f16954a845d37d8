//! Market context snippets for generation prompts. Every snippet degrades to a fixed
//! placeholder when its dataset cannot be fetched or has no usable rows.

use crate::error::PipelineError;
use crate::ingest::fields::{col, RowReader};
use crate::ingest::{Dataset, FetchParams, MarketDataProvider, Row, Table};

use super::render::format_amount;

pub const MARKET_UNAVAILABLE: &str = "market data unavailable";
pub const HOT_SECTORS_UNAVAILABLE: &str = "hot sector data unavailable";
pub const MACRO_UNAVAILABLE: &str = "macro data unavailable";
pub const INDUSTRY_UNAVAILABLE: &str = "industry data unavailable";

const HOT_SECTOR_COUNT: usize = 5;
const MACRO_ITEMS: usize = 3;
const INDUSTRY_EDGE: usize = 3;

async fn fetch_or_empty(market: &dyn MarketDataProvider, dataset: Dataset) -> Table {
    match market.fetch(dataset, &FetchParams::new()).await {
        Ok(table) => table,
        Err(e) => {
            let err = PipelineError::DataUnavailable {
                dataset,
                reason: format!("{e:#}"),
            };
            tracing::warn!(event = "dataset_unavailable", error = %err, "context placeholder used");
            Table::default()
        }
    }
}

fn name_and_change(row: &Row) -> Option<(String, f64)> {
    let r = RowReader::new(row);
    let name = r.text(col::NAME).ok()?;
    let change = r.number(col::CHANGE_PCT).ok()??;
    Some((name, change))
}

/// Index moves and northbound net inflow, e.g. `上证指数: 0.52% | northbound: 12.35亿`.
pub async fn market_snapshot(market: &dyn MarketDataProvider) -> String {
    let (indices, northbound) = tokio::join!(
        fetch_or_empty(market, Dataset::MarketIndices),
        fetch_or_empty(market, Dataset::NorthboundFlow),
    );

    let mut parts: Vec<String> = indices
        .iter()
        .filter_map(name_and_change)
        .map(|(name, change)| format!("{name}: {change:.2}%"))
        .collect();
    if parts.is_empty() {
        return MARKET_UNAVAILABLE.to_string();
    }

    let inflow = northbound
        .iter()
        .next()
        .and_then(|row| RowReader::new(row).number(col::NET_INFLOW).ok().flatten());
    parts.push(format!("northbound: {}", format_amount(inflow)));
    parts.join(" | ")
}

/// Top sectors by change, e.g. `半导体(3.1%), 白酒(2.4%)`.
pub async fn hot_sectors(market: &dyn MarketDataProvider) -> String {
    let sectors = fetch_or_empty(market, Dataset::SectorPerformance).await;
    let parts: Vec<String> = sectors
        .iter()
        .filter_map(name_and_change)
        .take(HOT_SECTOR_COUNT)
        .map(|(name, change)| format!("{name}({change:.1}%)"))
        .collect();
    if parts.is_empty() {
        return HOT_SECTORS_UNAVAILABLE.to_string();
    }
    parts.join(", ")
}

pub async fn macro_snapshot(market: &dyn MarketDataProvider) -> String {
    let macro_rows = fetch_or_empty(market, Dataset::GlobalMacro).await;
    let parts: Vec<String> = macro_rows
        .iter()
        .filter_map(name_and_change)
        .take(MACRO_ITEMS)
        .map(|(name, change)| format!("{name}: {change:.2}%"))
        .collect();
    if parts.is_empty() {
        return MACRO_UNAVAILABLE.to_string();
    }
    parts.join(" | ")
}

/// Leading and lagging industries from the sector ranking (sorted by change, best first).
pub async fn industry_outlook(market: &dyn MarketDataProvider) -> String {
    let sectors = fetch_or_empty(market, Dataset::SectorPerformance).await;
    let ranked: Vec<(String, f64)> = sectors.iter().filter_map(name_and_change).collect();
    if ranked.is_empty() {
        return INDUSTRY_UNAVAILABLE.to_string();
    }

    let lagging_from = ranked.len().saturating_sub(INDUSTRY_EDGE);
    let mut lines = vec!["Leading:".to_string()];
    lines.extend(
        ranked[..ranked.len().min(INDUSTRY_EDGE)]
            .iter()
            .map(|(name, change)| format!("  {name}({change:.1}%)")),
    );
    lines.push("Lagging:".to_string());
    lines.extend(
        ranked[lagging_from..]
            .iter()
            .map(|(name, change)| format!("  {name}({change:.1}%)")),
    );
    lines.join("\n")
}
