//! REST API and router assembly
//!
//! Serves the dashboard's JSON endpoints and mounts the WebSocket push
//! channel at `/ws`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::{future::Future, net::SocketAddr};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    complaints::{Complaint, NewComplaint},
    error::{Error, Result},
    monitoring::{Alert, AlertStats, CitySummary, Infrastructure},
    state::AppState,
    transport::websocket::{websocket_handler, PushStatistics},
};

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(health))
        .route("/api/infrastructure", get(list_infrastructure))
        .route("/api/infrastructure/{id}", get(get_infrastructure))
        .route("/api/alerts", get(active_alerts))
        .route("/api/alerts/history", get(alert_history))
        .route("/api/alerts/stats", get(alert_stats))
        .route("/api/complaints", get(list_complaints).post(submit_complaint))
        .route("/api/maintenance/{id}", post(schedule_maintenance))
        .route("/api/summary", get(summary))
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parse_origins(origins))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect()
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("Backend running on http://{}", addr);

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| Error::Server(format!("server error: {}", e)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
    push: PushStatistics,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        push: state.push.statistics().await,
    })
}

async fn list_infrastructure(State(state): State<AppState>) -> Json<Vec<Infrastructure>> {
    Json(state.store.infrastructure().await)
}

async fn get_infrastructure(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Infrastructure>> {
    Ok(Json(state.store.get(&id).await?))
}

async fn active_alerts(State(state): State<AppState>) -> Json<Vec<Alert>> {
    Json(state.store.active_alerts().await)
}

async fn alert_history(State(state): State<AppState>) -> Json<Vec<Alert>> {
    Json(state.store.alert_history().await)
}

async fn alert_stats(State(state): State<AppState>) -> Json<AlertStats> {
    Json(state.store.alert_stats().await)
}

async fn summary(State(state): State<AppState>) -> Json<CitySummary> {
    Json(state.store.summary().await)
}

async fn list_complaints(State(state): State<AppState>) -> Json<Vec<Complaint>> {
    Json(state.complaints.list().await)
}

async fn submit_complaint(
    State(state): State<AppState>,
    body: std::result::Result<Json<NewComplaint>, JsonRejection>,
) -> Result<Json<Complaint>> {
    let Json(report) = body.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;
    Ok(Json(state.complaints.submit(report).await?))
}

async fn schedule_maintenance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.store.schedule_maintenance(&id, &state.push).await?;

    Ok(Json(json!({ "success": true, "message": "Maintenance scheduled" })))
}
