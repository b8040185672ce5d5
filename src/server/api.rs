//! HTTP API
//!
//! REST endpoints consumed by the marketing pages, plus the page routes
//! and static assets themselves.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::types::{ApiError, HistoricTradesQuery};
use crate::desk::TradingDesk;

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub desk: Arc<TradingDesk>,
    pub default_historic_limit: usize,
}

/// REST routes only, without pages or static files
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/statistics", get(get_statistics))
        .route("/api/active-trades", get(get_active_trades))
        .route("/api/historic-trades", get(get_historic_trades))
        .route("/api/trade/:id", get(get_trade))
        .route("/api/prices", get(get_prices))
        .with_state(state)
}

/// Full site: API, named pages, static assets, CORS and request tracing
pub fn create_router(state: AppState, static_dir: impl Into<PathBuf>) -> Router {
    let static_dir = static_dir.into();

    api_router(state)
        // Pages
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route_service("/trades", ServeFile::new(static_dir.join("trades.html")))
        .route_service("/algorithm", ServeFile::new(static_dir.join("algorithm.html")))
        // Everything else from the static dir
        .fallback_service(ServeDir::new(static_dir))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
}

// ─────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────

/// GET /api/statistics - Win rate, risk/reward, weekly ROI, signal count
async fn get_statistics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.desk.get_statistics())
}

/// GET /api/active-trades - Open positions marked to current prices
async fn get_active_trades(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.desk.list_active_trades().await)
}

/// GET /api/historic-trades?limit=25 - Most recent closed trades
///
/// Query pairs are decoded as a list so repeated keys never reject the
/// request; an undecodable query behaves like an absent one.
async fn get_historic_trades(
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let query = match query {
        Ok(Query(pairs)) => HistoricTradesQuery::from_pairs(pairs),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Ignoring malformed historic-trades query");
            HistoricTradesQuery::default()
        }
    };
    let limit = query.resolve_limit(state.default_historic_limit);
    Json(state.desk.list_historic_trades(limit).to_vec())
}

/// GET /api/trade/:id - One trade, historic or active
async fn get_trade(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let trade = state.desk.get_trade_by_id(&id)?;
    Ok(Json(trade))
}

/// GET /api/prices - Current price per asset
async fn get_prices(State(state): State<AppState>) -> impl IntoResponse {
    let prices: HashMap<String, f64> = state
        .desk
        .current_prices()
        .await
        .into_iter()
        .map(|(asset, price)| (asset.to_string(), price))
        .collect();
    Json(prices)
}
