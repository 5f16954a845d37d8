use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Short,
    Long,
    All,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Long => "long",
            Self::All => "all",
        }
    }

    pub fn includes_short(&self) -> bool {
        matches!(self, Self::Short | Self::All)
    }

    pub fn includes_long(&self) -> bool {
        matches!(self, Self::Long | Self::All)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "long" => Ok(Self::Long),
            "all" => Ok(Self::All),
            other => anyhow::bail!("unknown mode {other:?} (expected short, long or all)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    ShortTerm,
    LongTerm,
}

/// How a horizon's picks were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Generated,
    Fallback,
    ScreeningOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPick {
    #[serde(deserialize_with = "lenient_text")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub recommendation_score: Option<f64>,
    #[serde(default)]
    pub investment_logic: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
    /// Horizon-specific fields (target price, stop loss, catalysts, raw metrics...).
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundPick {
    #[serde(deserialize_with = "lenient_text")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_nav: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub recommendation_score: Option<f64>,
    #[serde(default)]
    pub fund_type: Option<String>,
    #[serde(default)]
    pub investment_logic: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonRecommendation {
    pub horizon: Horizon,
    pub source: RecommendationSource,
    pub stocks: Vec<StockPick>,
    pub funds: Vec<FundPick>,
    /// Market view (short-term) or macro view (long-term).
    pub narrative: String,
    pub sector_preference: Vec<String>,
    pub risk_warning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    /// Seconds spent screening.
    pub screening_time: f64,
    /// Seconds spent in text generation (0 when generation is not used).
    pub generation_time: f64,
    pub total_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub mode: Mode,
    pub generated_at: DateTime<Utc>,
    pub short_term: Option<HorizonRecommendation>,
    pub long_term: Option<HorizonRecommendation>,
    pub metadata: BundleMetadata,
}

/// Accepts text or a bare number (`600519` -> `"600519"`); null reads as empty.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected text or number, got {other}"
        ))),
    }
}

/// Accepts a number, a numeric string (`"12.5"`, `"8%"`) or null.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(crate::ingest::fields::safe_float))
}
