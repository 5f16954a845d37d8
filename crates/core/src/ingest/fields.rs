//! Typed access to loosely typed dataset rows.

use crate::error::PipelineError;
use crate::ingest::types::Row;
use serde_json::Value;

/// Column names used by the market data provider.
pub mod col {
    pub const CODE: &str = "code";
    pub const NAME: &str = "name";
    pub const PRICE: &str = "price";
    pub const CHANGE_PCT: &str = "change_pct";
    pub const MARKET_CAP: &str = "market_cap";
    pub const PE: &str = "pe";
    pub const PB: &str = "pb";
    pub const VOLUME_RATIO: &str = "volume_ratio";
    pub const TURNOVER: &str = "turnover";
    pub const CHANGE_60D: &str = "change_60d";
    pub const MAIN_NET_INFLOW: &str = "main_net_inflow";
    pub const MAIN_NET_INFLOW_PCT: &str = "main_net_inflow_pct";
    pub const NAV: &str = "nav";
    pub const DAILY_GROWTH: &str = "daily_growth";
    pub const RETURN_1W: &str = "return_1w";
    pub const RETURN_1M: &str = "return_1m";
    pub const RETURN_3M: &str = "return_3m";
    pub const RETURN_6M: &str = "return_6m";
    pub const RETURN_1Y: &str = "return_1y";
    pub const RETURN_3Y: &str = "return_3y";
    pub const FUND_TYPE: &str = "fund_type";
    pub const NET_INFLOW: &str = "net_inflow";
}

const CODE_WIDTH: usize = 6;

/// Converts a cell to `f64`, tolerating thousands separators and percent signs.
///
/// Returns `None` for nulls, blanks, the `-` placeholder, unparsable text and
/// non-finite numbers.
pub fn safe_float(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| *c != ',' && *c != '%').collect();
            cleaned.trim().parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => {
            let s = s.trim();
            s.is_empty() || s == "-"
        }
        _ => false,
    }
}

/// Left-pads an instrument code with zeros to the exchange's fixed width.
pub fn normalize_code(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= CODE_WIDTH {
        return trimmed.to_string();
    }
    format!("{trimmed:0>width$}", width = CODE_WIDTH)
}

/// Borrowed view over a row with fallible typed accessors.
pub struct RowReader<'a> {
    row: &'a Row,
}

impl<'a> RowReader<'a> {
    pub fn new(row: &'a Row) -> Self {
        Self { row }
    }

    /// Required text column. Numbers are rendered as text.
    pub fn text(&self, field: &'static str) -> Result<String, PipelineError> {
        match self.row.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(other) => Err(PipelineError::RowMalformed {
                field,
                detail: format!("is not text: {other}"),
            }),
            None => Err(PipelineError::RowMalformed {
                field,
                detail: "is missing".to_string(),
            }),
        }
    }

    pub fn opt_text(&self, field: &'static str) -> Option<String> {
        match self.row.get(field)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    /// Instrument code normalized to fixed width. Integer codes (`1` -> `000001`) are
    /// accepted.
    pub fn code(&self) -> Result<String, PipelineError> {
        match self.row.get(col::CODE) {
            Some(Value::Number(n)) if n.is_u64() => Ok(normalize_code(&n.to_string())),
            _ => self.text(col::CODE).map(|s| normalize_code(&s)),
        }
    }

    /// Optional numeric column: absent or blank is `Ok(None)`, present but not
    /// convertible is an error.
    pub fn number(&self, field: &'static str) -> Result<Option<f64>, PipelineError> {
        let Some(value) = self.row.get(field) else {
            return Ok(None);
        };
        if is_blank(value) {
            return Ok(None);
        }
        safe_float(value)
            .map(Some)
            .ok_or_else(|| PipelineError::RowMalformed {
                field,
                detail: format!("is not numeric: {value}"),
            })
    }
}
