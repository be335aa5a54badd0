//! Local realtime collector.
//!
//! A stand-in for the hosted webhook, useful for running the simulator
//! offline and for integration tests:
//! - Accepts readings via POST /webhook/realtime
//! - Keeps the latest realtime record per `X-User-Id` in memory
//! - Serves it back via GET /realtime
//!
//! # Architecture
//!
//! ```text
//! sleepy-sensor ──→ POST /webhook/realtime ──→ collector ──→ GET /realtime
//!                                                  ↓
//!                                       [latest record per user]
//! ```

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use crate::config::DEFAULT_USER_ID;
use crate::sensor::{SleepPhase, SLEEP_CYCLE_MINUTES};

/// Collector configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Bearer token required on ingest, if any
    pub token: Option<String>,
}

impl ServerConfig {
    pub fn new(port: u16, token: Option<String>) -> Self {
        Self { port, token }
    }
}

/// Shared collector state
pub struct ServerState {
    /// Latest record per user id
    latest: RwLock<HashMap<String, RealtimeRecord>>,
    /// Expected bearer token
    token: Option<String>,
}

impl ServerState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            latest: RwLock::new(HashMap::new()),
            token: config.token.clone(),
        }
    }

    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        match &self.token {
            None => true,
            Some(token) => headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(|v| v == format!("Bearer {token}"))
                .unwrap_or(false),
        }
    }
}

/// Webhook body as sent by a sensor. Every field is optional and the phase
/// is kept as sent, so other sensors' phase names are stored too.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookPayload {
    pub is_sleeping: Option<bool>,
    pub sleep_phase: Option<String>,
    pub heart_rate: Option<u32>,
    pub respiration_rate: Option<u32>,
    pub movement_count: Option<u32>,
    pub elapsed_minutes: Option<u32>,
}

/// Realtime view of a user's sensor, in the dashboard's field naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeRecord {
    pub is_asleep: bool,
    pub current_phase: String,
    pub heart_rate: u32,
    pub respiration_rate: u32,
    pub movements: u32,
    pub elapsed_time: u32,
    pub estimated_cycles: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl RealtimeRecord {
    /// Record returned before any reading has arrived.
    pub fn idle() -> Self {
        Self {
            is_asleep: false,
            current_phase: SleepPhase::Awake.to_string(),
            heart_rate: 0,
            respiration_rate: 0,
            movements: 0,
            elapsed_time: 0,
            estimated_cycles: 0,
            last_updated: None,
        }
    }

    fn from_payload(payload: &WebhookPayload) -> Self {
        let elapsed_time = payload.elapsed_minutes.unwrap_or(0);
        Self {
            is_asleep: payload.is_sleeping.unwrap_or(false),
            current_phase: payload
                .sleep_phase
                .clone()
                .filter(|phase| !phase.is_empty())
                .unwrap_or_else(|| SleepPhase::Awake.to_string()),
            heart_rate: payload.heart_rate.unwrap_or(0),
            respiration_rate: payload.respiration_rate.unwrap_or(0),
            movements: payload.movement_count.unwrap_or(0),
            elapsed_time,
            estimated_cycles: elapsed_time / SLEEP_CYCLE_MINUTES,
            last_updated: Some(Utc::now().to_rfc3339()),
        }
    }
}

/// Response from the webhook endpoint
#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub message: String,
    pub data: RealtimeRecord,
}

/// Response from the realtime endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeResponse {
    pub realtime_data: RealtimeRecord,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

fn user_id(headers: &HeaderMap) -> String {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_USER_ID)
        .to_string()
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn error_response(
    status: StatusCode,
    error: String,
    code: &str,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error,
            code: code.to_string(),
        }),
    )
}

/// POST /webhook/realtime
///
/// The token is checked before the body is looked at, so an unauthorized
/// caller always gets 401 whatever it sent.
async fn webhook_realtime(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, (StatusCode, Json<ErrorResponse>)> {
    if !state.is_authorized(&headers) {
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            "Missing or invalid bearer token".to_string(),
            "UNAUTHORIZED",
        ));
    }

    let payload: WebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "rejected malformed webhook body");
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid webhook body: {e}"),
            "INVALID_BODY",
        )
    })?;

    let user = user_id(&headers);
    let record = RealtimeRecord::from_payload(&payload);
    tracing::info!(user = %user, phase = %record.current_phase, "received realtime reading");

    state.latest.write().await.insert(user, record.clone());

    Ok(Json(WebhookResponse {
        message: "Realtime data updated successfully".to_string(),
        data: record,
    }))
}

/// GET /realtime
async fn realtime(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> Json<RealtimeResponse> {
    let user = user_id(&headers);
    let record = state
        .latest
        .read()
        .await
        .get(&user)
        .cloned()
        .unwrap_or_else(RealtimeRecord::idle);

    Json(RealtimeResponse {
        realtime_data: record,
    })
}

/// Build the collector router.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook/realtime", post(webhook_realtime))
        .route("/realtime", get(realtime))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the collector
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::new(&config));
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Realtime collector listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Collector shutdown signal received");
            })
            .await
        {
            tracing::error!("Collector error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_partial_payload() {
        let payload: WebhookPayload =
            serde_json::from_str(r#"{"is_sleeping": true, "elapsed_minutes": 200}"#).unwrap();
        let record = RealtimeRecord::from_payload(&payload);

        assert!(record.is_asleep);
        assert_eq!(record.current_phase, "awake");
        assert_eq!(record.heart_rate, 0);
        assert_eq!(record.elapsed_time, 200);
        assert_eq!(record.estimated_cycles, 2);
        assert!(record.last_updated.is_some());
    }

    #[test]
    fn test_record_keeps_unrecognised_phase() {
        let payload: WebhookPayload =
            serde_json::from_str(r#"{"sleep_phase": "REM", "heart_rate": 61}"#).unwrap();
        let record = RealtimeRecord::from_payload(&payload);
        assert_eq!(record.current_phase, "REM");
        assert_eq!(record.heart_rate, 61);

        let payload: WebhookPayload = serde_json::from_str(r#"{"sleep_phase": ""}"#).unwrap();
        assert_eq!(RealtimeRecord::from_payload(&payload).current_phase, "awake");
    }

    #[test]
    fn test_record_wire_names() {
        let json = serde_json::to_value(RealtimeRecord::idle()).unwrap();
        assert_eq!(json["isAsleep"], false);
        assert_eq!(json["currentPhase"], "awake");
        assert_eq!(json["estimatedCycles"], 0);
        assert!(json.get("lastUpdated").is_none());
    }

    #[test]
    fn test_authorization() {
        let open = ServerState::new(&ServerConfig::new(0, None));
        assert!(open.is_authorized(&HeaderMap::new()));

        let locked = ServerState::new(&ServerConfig::new(0, Some("s3cret".to_string())));
        let mut headers = HeaderMap::new();
        assert!(!locked.is_authorized(&headers));
        headers.insert("authorization", "Bearer s3cret".parse().unwrap());
        assert!(locked.is_authorized(&headers));
    }

    #[test]
    fn test_user_id_default() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_id(&headers), "default-user");
        headers.insert("x-user-id", "alice".parse().unwrap());
        assert_eq!(user_id(&headers), "alice");
    }
}
