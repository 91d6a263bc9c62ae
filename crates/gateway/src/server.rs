use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        extract::{Path, State},
        response::{IntoResponse, Json},
        routing::{get, post},
    },
    serde::Deserialize,
    tower_http::cors::{Any, CorsLayer},
    tracing::info,
    vetrina_integrations::{IntegrationError, IntegrationService},
    vetrina_oauth::Provider,
};

use crate::error::ApiError;

// ── Shared app state ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub integrations: Arc<IntegrationService>,
}

// ── Router ───────────────────────────────────────────────────────────────────

/// Build the API router (shared between production startup and tests).
pub fn build_app(integrations: Arc<IntegrationService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/integrations/{provider}/auth-url/{user_id}",
            get(auth_url_handler),
        )
        .route(
            "/api/integrations/{provider}/callback",
            post(callback_handler),
        )
        .route(
            "/api/integrations/{provider}/disconnect/{user_id}",
            post(disconnect_handler),
        )
        .route("/api/campaigns/{id}/publish", post(publish_handler))
        .layer(cors)
        .with_state(AppState { integrations })
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "gateway listening");
    axum::serve(listener, app).await
}

// ── Handlers ─────────────────────────────────────────────────────────────────

fn parse_provider(raw: &str) -> Result<Provider, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::from(IntegrationError::not_found("provider", raw)))
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn auth_url_handler(
    State(state): State<AppState>,
    Path((provider, user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = parse_provider(&provider)?;
    let auth = state
        .integrations
        .authorization_url(&user_id, provider)
        .await?;
    Ok(Json(auth))
}

#[derive(Debug, Deserialize)]
struct CallbackBody {
    user_id: String,
    code: String,
    state: String,
}

async fn callback_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(body): Json<CallbackBody>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = parse_provider(&provider)?;
    let connection = state
        .integrations
        .connect(&body.user_id, provider, &body.code, &body.state)
        .await?;
    Ok(Json(connection))
}

async fn disconnect_handler(
    State(state): State<AppState>,
    Path((provider, user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = parse_provider(&provider)?;
    state.integrations.disconnect(&user_id, provider).await?;
    Ok(Json(serde_json::json!({ "status": "disconnected" })))
}

async fn publish_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.integrations.publish_campaign(&id).await?;
    Ok(Json(post))
}
