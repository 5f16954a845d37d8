use anyhow::Context;
use clap::Parser;
use pickwise_core::domain::recommendation::{HorizonRecommendation, Mode, RecommendationBundle};
use pickwise_core::engine::{RecommendationEngine, RecommendationRequest};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "pickwise_worker")]
struct Args {
    /// Recommendation horizon: short, long or all.
    #[arg(long, default_value = "all", value_parser = clap::value_parser!(Mode))]
    mode: Mode,

    /// Screening limit per stock screener.
    #[arg(long, default_value_t = pickwise_core::engine::DEFAULT_STOCK_LIMIT)]
    stock_limit: usize,

    /// Screening limit per fund screener.
    #[arg(long, default_value_t = pickwise_core::engine::DEFAULT_FUND_LIMIT)]
    fund_limit: usize,

    /// Return screening results without calling the text generator.
    #[arg(long)]
    no_generation: bool,

    /// Cache partition for the result (defaults to the global entry).
    #[arg(long)]
    subject: Option<String>,

    /// Ignore a cached result and recompute.
    #[arg(long)]
    refresh: bool,

    /// Write the bundle to this file instead of stdout.
    #[arg(long)]
    output: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = pickwise_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let mode = args.mode;

    let engine = RecommendationEngine::from_settings(&settings)
        .await
        .context("failed to initialise recommendation engine")?;
    if !engine.has_generator() && !args.no_generation {
        tracing::warn!("no text generator configured; output will be screening-only");
    }

    let mut req = RecommendationRequest::new(mode);
    req.stock_limit = args.stock_limit;
    req.fund_limit = args.fund_limit;
    req.use_generation = !args.no_generation;
    req.subject = args.subject;
    req.refresh = args.refresh;

    let bundle = match engine.generate(&req).await {
        Ok(bundle) => bundle,
        Err(e) => {
            let err = anyhow::Error::new(e).context("recommendation run failed");
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(%mode, error = %err, "recommendation run failed");
            return Err(err);
        }
    };

    log_summary(&bundle);

    let body = serde_json::to_string_pretty(&bundle).context("failed to serialize bundle")?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, body)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "bundle written");
        }
        None => println!("{body}"),
    }

    Ok(())
}

fn log_summary(bundle: &RecommendationBundle) {
    let horizons: [Option<&HorizonRecommendation>; 2] =
        [bundle.short_term.as_ref(), bundle.long_term.as_ref()];
    for rec in horizons.into_iter().flatten() {
        tracing::info!(
            horizon = ?rec.horizon,
            source = ?rec.source,
            stocks = rec.stocks.len(),
            funds = rec.funds.len(),
            "horizon ready"
        );
    }
    tracing::info!(
        mode = %bundle.mode,
        screening_time = bundle.metadata.screening_time,
        generation_time = bundle.metadata.generation_time,
        total_time = bundle.metadata.total_time,
        "recommendation run finished"
    );
}

fn init_sentry(settings: &pickwise_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "pickwise_worker",
            "--mode",
            "short",
            "--stock-limit",
            "10",
            "--no-generation",
            "--subject",
            "7",
        ])
        .unwrap();
        assert_eq!(args.mode, Mode::Short);
        assert_eq!(args.stock_limit, 10);
        assert_eq!(args.fund_limit, pickwise_core::engine::DEFAULT_FUND_LIMIT);
        assert!(args.no_generation);
        assert!(!args.refresh);
        assert_eq!(args.subject.as_deref(), Some("7"));
    }

    #[test]
    fn defaults_to_all_and_rejects_unknown_mode() {
        let args = Args::try_parse_from(["pickwise_worker"]).unwrap();
        assert_eq!(args.mode, Mode::All);

        let err = Args::try_parse_from(["pickwise_worker", "--mode", "weekly"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
