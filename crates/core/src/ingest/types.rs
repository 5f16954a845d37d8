use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Named datasets served by the market data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    /// Individual stocks ranked by today's main-force net inflow.
    FundFlowRank,
    PopularityRank,
    SectorPerformance,
    StockQuotes,
    /// Open-ended funds with trailing return windows and type labels.
    FundRank,
    MarketIndices,
    NorthboundFlow,
    GlobalMacro,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FundFlowRank => "fund_flow_rank",
            Self::PopularityRank => "popularity_rank",
            Self::SectorPerformance => "sector_performance",
            Self::StockQuotes => "stock_quotes",
            Self::FundRank => "fund_rank",
            Self::MarketIndices => "market_indices",
            Self::NorthboundFlow => "northbound_flow",
            Self::GlobalMacro => "global_macro",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Row = Map<String, Value>;

/// Query parameters forwarded to the provider (kept ordered for stable URLs).
pub type FetchParams = BTreeMap<String, String>;

/// Ordered rows with named, loosely typed columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub rows: Vec<Row>,
}

static EMPTY_TABLE: Table = Table { rows: Vec::new() };

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Keeps only the first `n` rows.
    pub fn head(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

/// Datasets gathered for a single screening run, keyed by dataset.
///
/// A dataset that failed to load is stored (or simply absent) as an empty table;
/// lookups never fail.
#[derive(Debug, Clone, Default)]
pub struct RawDataBundle {
    datasets: BTreeMap<Dataset, Table>,
}

impl RawDataBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset: Dataset, table: Table) {
        self.datasets.insert(dataset, table);
    }

    pub fn with(mut self, dataset: Dataset, table: Table) -> Self {
        self.insert(dataset, table);
        self
    }

    pub fn get(&self, dataset: Dataset) -> &Table {
        self.datasets.get(&dataset).unwrap_or(&EMPTY_TABLE)
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.values().all(Table::is_empty)
    }
}
