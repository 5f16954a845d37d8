//! Recommendation engine: screens both horizons, asks the text generator to pick
//! from the top of each pool, and falls back to score order whenever generation is
//! off or fails.

pub mod context;
pub mod fallback;
pub mod render;

use crate::cache::CacheFacade;
use crate::config::{env_or, Settings};
use crate::domain::candidate::{
    FundCandidate, LongTermFundCandidate, LongTermStockCandidate, ScoredCandidate,
    ShortTermFundCandidate, ShortTermStockCandidate,
};
use crate::domain::contract::GeneratedHorizon;
use crate::domain::recommendation::{
    BundleMetadata, Horizon, HorizonRecommendation, Mode, RecommendationBundle,
};
use crate::error::PipelineError;
use crate::ingest::{HttpJsonMarketData, MarketDataProvider};
use crate::llm::prompts::{long_term_prompt, short_term_prompt, PromptInput};
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{json, AnthropicClient, TextGenerator};
use crate::screener::{
    LongTermFundScreener, LongTermStockScreener, Screener, ScreenerContext,
    ShortTermFundScreener, ShortTermStockScreener,
};
use crate::time::cn_market;
use chrono::Utc;
use render::{render_lines, PromptLine};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 150;
const DEFAULT_RESULT_TTL_SECS: u64 = 4 * 3600;

/// Candidates handed to the generator per horizon.
const GENERATION_STOCKS: usize = 20;
const GENERATION_FUNDS: usize = 15;

pub const DEFAULT_STOCK_LIMIT: usize = 30;
pub const DEFAULT_FUND_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub generation_timeout: Duration,
    pub result_ttl_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            result_ttl_secs: DEFAULT_RESULT_TTL_SECS,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            generation_timeout: Duration::from_secs(env_or(
                "GENERATION_TIMEOUT_SECS",
                DEFAULT_GENERATION_TIMEOUT_SECS,
            )),
            result_ttl_secs: env_or("RECOMMENDATIONS_CACHE_TTL_SECS", DEFAULT_RESULT_TTL_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecommendationRequest {
    pub mode: Mode,
    /// Screening limit for each stock screener.
    pub stock_limit: usize,
    /// Screening limit for each fund screener.
    pub fund_limit: usize,
    pub use_generation: bool,
    /// Cache partition; `None` shares the global entry.
    pub subject: Option<String>,
    /// Skip the cache read (the fresh bundle is still written back). Runs without
    /// generation never touch the result cache.
    pub refresh: bool,
}

impl RecommendationRequest {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            stock_limit: DEFAULT_STOCK_LIMIT,
            fund_limit: DEFAULT_FUND_LIMIT,
            use_generation: true,
            subject: None,
            refresh: false,
        }
    }

    pub fn cache_key(&self) -> String {
        let subject = self
            .subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("global");
        format!("recommendations:{subject}:{}", self.mode)
    }
}

type Screened<S, F> = Option<(Vec<S>, Vec<F>)>;

pub struct RecommendationEngine {
    market: Arc<dyn MarketDataProvider>,
    generator: Option<Arc<dyn TextGenerator>>,
    cache: CacheFacade,
    config: EngineConfig,
}

impl RecommendationEngine {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        generator: Option<Arc<dyn TextGenerator>>,
        cache: CacheFacade,
        config: EngineConfig,
    ) -> Self {
        Self {
            market,
            generator,
            cache,
            config,
        }
    }

    /// Wires the HTTP market data provider, the Anthropic generator (when an API key
    /// is configured) and the configured cache backend.
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let market: Arc<dyn MarketDataProvider> =
            Arc::new(HttpJsonMarketData::from_settings(settings)?);

        let generator: Option<Arc<dyn TextGenerator>> = match settings.anthropic_api_key {
            Some(_) => Some(Arc::new(AnthropicClient::from_settings(settings)?)),
            None => {
                tracing::warn!("ANTHROPIC_API_KEY not set; recommendations will be screening-only");
                None
            }
        };

        let cache = CacheFacade::from_settings(settings).await;
        Ok(Self::new(market, generator, cache, EngineConfig::from_env()))
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn generate(
        &self,
        req: &RecommendationRequest,
    ) -> Result<RecommendationBundle, PipelineError> {
        let started = Instant::now();
        let key = req.cache_key();
        let generator = self.generator.as_deref().filter(|_| req.use_generation);
        let cacheable = generator.is_some();

        if cacheable && !req.refresh {
            if let Some(bundle) = self.cache.get_json::<RecommendationBundle>(&key).await {
                tracing::info!(event = "recommendations_cache_hit", key = %key, "returning cached recommendations");
                return Ok(bundle);
            }
        }

        let generated_at = Utc::now();
        let ctx = ScreenerContext::new(self.market.clone(), self.cache.clone());

        let screening_started = Instant::now();
        let (short, long) = tokio::join!(
            self.screen_short(&ctx, req),
            self.screen_long(&ctx, req)
        );
        let (short, long) = (short?, long?);
        let screening_time = screening_started.elapsed().as_secs_f64();

        let generation_started = Instant::now();
        let (short_term, long_term) = match generator {
            Some(generator) => {
                tokio::join!(
                    self.generated(generator, Horizon::ShortTerm, short),
                    self.generated(generator, Horizon::LongTerm, long)
                )
            }
            None => (
                short.map(|(s, f)| fallback::screening_only_horizon(Horizon::ShortTerm, &s, &f)),
                long.map(|(s, f)| fallback::screening_only_horizon(Horizon::LongTerm, &s, &f)),
            ),
        };
        let generation_time = match generator {
            Some(_) => generation_started.elapsed().as_secs_f64(),
            None => 0.0,
        };

        let bundle = RecommendationBundle {
            mode: req.mode,
            generated_at,
            short_term,
            long_term,
            metadata: BundleMetadata {
                screening_time,
                generation_time,
                total_time: started.elapsed().as_secs_f64(),
            },
        };

        if cacheable {
            self.cache
                .set_json(&key, &bundle, self.config.result_ttl_secs)
                .await;
            tracing::info!(
                event = "recommendations_cached",
                key = %key,
                ttl_secs = self.config.result_ttl_secs,
                screening_time,
                generation_time,
                "recommendations generated"
            );
        } else {
            tracing::info!(screening_time, "screening-only recommendations generated");
        }
        Ok(bundle)
    }

    async fn screen_short(
        &self,
        ctx: &ScreenerContext,
        req: &RecommendationRequest,
    ) -> Result<Screened<ShortTermStockCandidate, ShortTermFundCandidate>, PipelineError> {
        if !req.mode.includes_short() {
            return Ok(None);
        }
        let stocks = ShortTermStockScreener::new(ctx.clone());
        let funds = ShortTermFundScreener::new(ctx.clone());
        let (s, f) = tokio::join!(
            stocks.screen(Some(req.stock_limit)),
            funds.screen(Some(req.fund_limit))
        );
        Ok(Some((s?, f?)))
    }

    async fn screen_long(
        &self,
        ctx: &ScreenerContext,
        req: &RecommendationRequest,
    ) -> Result<Screened<LongTermStockCandidate, LongTermFundCandidate>, PipelineError> {
        if !req.mode.includes_long() {
            return Ok(None);
        }
        let stocks = LongTermStockScreener::new(ctx.clone());
        let funds = LongTermFundScreener::new(ctx.clone());
        let (s, f) = tokio::join!(
            stocks.screen(Some(req.stock_limit)),
            funds.screen(Some(req.fund_limit))
        );
        Ok(Some((s?, f?)))
    }

    /// Generated result for one horizon, or the fallback selection when generation
    /// fails in any way.
    async fn generated<S, F>(
        &self,
        generator: &dyn TextGenerator,
        horizon: Horizon,
        screened: Screened<S, F>,
    ) -> Option<HorizonRecommendation>
    where
        S: ScoredCandidate + PromptLine,
        F: FundCandidate + PromptLine,
    {
        let (stocks, funds) = screened?;
        let prompt = self.build_prompt(horizon, &stocks, &funds).await;

        tracing::info!(
            event = "generation_attempted",
            ?horizon,
            provider = ?generator.provider(),
            stocks = stocks.len().min(GENERATION_STOCKS),
            funds = funds.len().min(GENERATION_FUNDS),
            prompt_chars = prompt.chars().count(),
            "requesting generated recommendations"
        );

        match self.attempt(generator, horizon, &prompt).await {
            Ok(rec) => Some(rec),
            Err(err) => {
                tracing::warn!(event = "generation_failed", ?horizon, error = %err, "generation failed");
                tracing::info!(
                    event = "generation_fallback",
                    ?horizon,
                    stocks = stocks.len().min(fallback::FALLBACK_STOCKS),
                    funds = funds.len().min(fallback::FALLBACK_FUNDS),
                    "using score-ordered fallback"
                );
                Some(fallback::fallback_horizon(horizon, &stocks, &funds))
            }
        }
    }

    async fn build_prompt<S: PromptLine, F: PromptLine>(
        &self,
        horizon: Horizon,
        stocks: &[S],
        funds: &[F],
    ) -> String {
        let stocks = &stocks[..stocks.len().min(GENERATION_STOCKS)];
        let funds = &funds[..funds.len().min(GENERATION_FUNDS)];
        let market = self.market.as_ref();

        let (primary_context, secondary_context) = match horizon {
            Horizon::ShortTerm => {
                tokio::join!(context::market_snapshot(market), context::hot_sectors(market))
            }
            Horizon::LongTerm => {
                tokio::join!(context::macro_snapshot(market), context::industry_outlook(market))
            }
        };

        let input = PromptInput {
            stock_count: stocks.len(),
            stock_lines: render_lines(stocks),
            fund_count: funds.len(),
            fund_lines: render_lines(funds),
            primary_context,
            secondary_context,
            report_date: cn_market::report_timestamp(Utc::now()),
        };

        match horizon {
            Horizon::ShortTerm => short_term_prompt(&input),
            Horizon::LongTerm => long_term_prompt(&input),
        }
    }

    async fn attempt(
        &self,
        generator: &dyn TextGenerator,
        horizon: Horizon,
        prompt: &str,
    ) -> Result<HorizonRecommendation, PipelineError> {
        let timeout = self.config.generation_timeout;
        let text = match tokio::time::timeout(timeout, generator.generate(prompt)).await {
            Err(_) => {
                return Err(PipelineError::GenerationFailure(format!(
                    "timed out after {}s",
                    timeout.as_secs_f64()
                )))
            }
            Ok(Err(e)) => return Err(generation_failure(horizon, e)),
            Ok(Ok(text)) => text,
        };

        let payload = json::parse_payload(&text).ok_or_else(|| {
            PipelineError::GenerationFailure("response contains no JSON object".to_string())
        })?;
        let generated: GeneratedHorizon = serde_json::from_value(payload.into())
            .map_err(|e| PipelineError::GenerationFailure(format!("unexpected payload shape: {e}")))?;
        generated
            .validate_and_into_horizon(horizon)
            .map_err(|e| PipelineError::GenerationFailure(format!("{e:#}")))
    }
}

/// Maps a generator error to `GenerationFailure`, logging the raw backend exchange
/// when the error carries one.
fn generation_failure(horizon: Horizon, err: anyhow::Error) -> PipelineError {
    if let Some(diag) = err.downcast_ref::<LlmDiagnosticsError>() {
        tracing::warn!(
            ?horizon,
            provider = ?diag.provider,
            stage = diag.stage,
            raw_output = diag.raw_output.as_deref().unwrap_or(""),
            raw_response = ?diag.raw_response_json,
            "generation backend diagnostics"
        );
    }
    PipelineError::GenerationFailure(format!("{err:#}"))
}
