pub mod fields;
pub mod provider;
pub mod types;

pub use provider::{HttpJsonMarketData, MarketDataProvider};
pub use types::{Dataset, FetchParams, RawDataBundle, Row, Table};
