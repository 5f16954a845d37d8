use crate::domain::recommendation::{
    FundPick, Horizon, HorizonRecommendation, RecommendationSource, StockPick,
};
use crate::ingest::fields::normalize_code;
use anyhow::ensure;
use serde::{Deserialize, Serialize};

const DEFAULT_RISK_WARNING: &str = "Investing involves risk; recommendations are not advice.";

/// Horizon payload as produced by the text generator.
///
/// The prompts ask for horizon-prefixed keys (`short_term_stocks`, `macro_view`...);
/// plain keys are accepted as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedHorizon {
    #[serde(default, alias = "short_term_stocks", alias = "long_term_stocks")]
    pub stocks: Vec<StockPick>,
    #[serde(default, alias = "short_term_funds", alias = "long_term_funds")]
    pub funds: Vec<FundPick>,
    #[serde(default, alias = "market_view", alias = "macro_view")]
    pub narrative: Option<String>,
    #[serde(default)]
    pub sector_preference: Vec<String>,
    #[serde(default)]
    pub risk_warning: Option<String>,
}

impl GeneratedHorizon {
    pub fn validate_and_into_horizon(
        self,
        horizon: Horizon,
    ) -> anyhow::Result<HorizonRecommendation> {
        let mut stocks = Vec::with_capacity(self.stocks.len());
        for mut pick in self.stocks {
            ensure!(!pick.code.trim().is_empty(), "stock pick code must be non-empty");
            pick.code = normalize_code(&pick.code);
            pick.name = pick.name.trim().to_string();
            stocks.push(pick);
        }

        let mut funds = Vec::with_capacity(self.funds.len());
        for mut pick in self.funds {
            ensure!(!pick.code.trim().is_empty(), "fund pick code must be non-empty");
            pick.code = normalize_code(&pick.code);
            pick.name = pick.name.trim().to_string();
            funds.push(pick);
        }

        let sector_preference = self
            .sector_preference
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(HorizonRecommendation {
            horizon,
            source: RecommendationSource::Generated,
            stocks,
            funds,
            narrative: self.narrative.map(|s| s.trim().to_string()).unwrap_or_default(),
            sector_preference,
            risk_warning: self
                .risk_warning
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_RISK_WARNING.to_string()),
        })
    }
}
