use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::data::{
    HedgeRecommendation, OptionPosition, PortfolioSettings, PortfolioSummary, UnderlyingPosition,
};
use crate::portfolio::PortfolioLedger;

pub type SharedLedger = Arc<RwLock<PortfolioLedger>>;

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: &'static str,
    pub message: String,
}

impl CommandResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    pub id: String,
}

pub fn router(ledger: SharedLedger) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/summary", get(get_summary))
        .route(
            "/api/options",
            get(list_options).post(add_option).delete(remove_option),
        )
        .route(
            "/api/underlying",
            get(list_underlying)
                .post(add_underlying)
                .delete(remove_underlying),
        )
        .route("/api/hedge", get(get_hedge_recommendation))
        .route("/api/settings", get(get_settings).post(update_settings))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ledger)
}

async fn get_summary(State(ledger): State<SharedLedger>) -> Json<PortfolioSummary> {
    Json(ledger.read().await.summary())
}

async fn list_options(State(ledger): State<SharedLedger>) -> Json<Vec<OptionPosition>> {
    Json(ledger.read().await.options().to_vec())
}

async fn add_option(
    State(ledger): State<SharedLedger>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<CommandResponse>) {
    match ledger.write().await.add_option(&body) {
        Ok(_) => (
            StatusCode::OK,
            Json(CommandResponse::success("Option added successfully")),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(CommandResponse::error(e.to_string())),
        ),
    }
}

async fn remove_option(
    State(ledger): State<SharedLedger>,
    Json(req): Json<RemoveRequest>,
) -> Json<CommandResponse> {
    ledger.write().await.remove_option(&req.id);
    Json(CommandResponse::success("Option removed successfully"))
}

async fn list_underlying(State(ledger): State<SharedLedger>) -> Json<Vec<UnderlyingPosition>> {
    Json(ledger.read().await.underlying().to_vec())
}

async fn add_underlying(
    State(ledger): State<SharedLedger>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<CommandResponse>) {
    match ledger.write().await.add_underlying(&body) {
        Ok(_) => (
            StatusCode::OK,
            Json(CommandResponse::success("Position added successfully")),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(CommandResponse::error(e.to_string())),
        ),
    }
}

async fn remove_underlying(
    State(ledger): State<SharedLedger>,
    Json(req): Json<RemoveRequest>,
) -> Json<CommandResponse> {
    ledger.write().await.remove_underlying(&req.id);
    Json(CommandResponse::success("Position removed successfully"))
}

async fn get_hedge_recommendation(
    State(ledger): State<SharedLedger>,
) -> Json<HedgeRecommendation> {
    Json(ledger.read().await.hedge_recommendation())
}

async fn get_settings(State(ledger): State<SharedLedger>) -> Json<PortfolioSettings> {
    Json(ledger.read().await.settings().clone())
}

async fn update_settings(
    State(ledger): State<SharedLedger>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<CommandResponse>) {
    match ledger.write().await.update_settings(&body) {
        Ok(_) => (
            StatusCode::OK,
            Json(CommandResponse::success("Settings updated successfully")),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(CommandResponse::error(e.to_string())),
        ),
    }
}
