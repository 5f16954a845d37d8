use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pickwise_core::domain::recommendation::{Mode, RecommendationBundle};
use pickwise_core::engine::{RecommendationEngine, RecommendationRequest};

const MAX_LIMIT: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = pickwise_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let engine = match RecommendationEngine::from_settings(&settings).await {
        Ok(engine) => Some(Arc::new(engine)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "engine init failed; starting API in degraded mode");
            None
        }
    };

    let state = AppState { engine };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/recommendations", get(get_recommendations))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = pickwise_core::config::env_or("PORT", 3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    engine: Option<Arc<RecommendationEngine>>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationsQuery {
    mode: Option<String>,
    stock_limit: Option<usize>,
    fund_limit: Option<usize>,
    use_generation: Option<bool>,
    subject: Option<String>,
    #[serde(default)]
    refresh: bool,
}

impl RecommendationsQuery {
    fn into_request(self) -> Result<RecommendationRequest, StatusCode> {
        let mode = match self.mode.as_deref() {
            Some(s) => s.parse::<Mode>().map_err(|_| StatusCode::BAD_REQUEST)?,
            None => Mode::All,
        };

        let mut req = RecommendationRequest::new(mode);
        if let Some(n) = self.stock_limit {
            req.stock_limit = n.min(MAX_LIMIT);
        }
        if let Some(n) = self.fund_limit {
            req.fund_limit = n.min(MAX_LIMIT);
        }
        if let Some(g) = self.use_generation {
            req.use_generation = g;
        }
        req.subject = self.subject;
        req.refresh = self.refresh;
        Ok(req)
    }
}

async fn get_recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationsQuery>,
) -> Result<Json<RecommendationBundle>, StatusCode> {
    let Some(engine) = &state.engine else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let req = query.into_request()?;
    let bundle = engine.generate(&req).await.map_err(|e| {
        let err = anyhow::Error::new(e);
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(mode = %req.mode, error = %err, "recommendation request failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(bundle))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
