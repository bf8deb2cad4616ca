use axum::{
    Router,
    extract::{DefaultBodyLimit, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{Next, from_fn},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
};
use claims_core::{ClaimStore, FraudScorer, InMemoryClaimStore, OrdsClient, PostgresClaimStore};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::handlers::{claims, reports};
use crate::uploads::{MAX_FILE_SIZE, MAX_FILES};

pub type ApiError = (StatusCode, Json<Value>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

pub fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "message": message })),
    )
}

pub fn not_found(message: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": message })),
    )
}

/// 500 envelope. `details` is only echoed when the service runs in development.
pub fn internal_error(message: &str, details: &str, expose: bool) -> ApiError {
    let mut body = json!({ "success": false, "message": message });
    if expose {
        body["error"] = json!(details);
    }
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ClaimStore>,
    pub ords: OrdsClient,
    pub scorer: FraudScorer,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wires the upstream clients around an already chosen store.
    pub fn from_parts(store: Arc<dyn ClaimStore>, settings: Settings) -> anyhow::Result<Self> {
        let ords = OrdsClient::new(settings.ords_base_url.clone(), settings.upstream_timeout)?;
        let scorer = FraudScorer::new(
            settings.fraud_model_url.clone(),
            settings.fraud_model_api_key.clone(),
            settings.upstream_timeout,
        )?;
        if !scorer.is_configured() {
            warn!("Fraud model not configured, insights will use the fallback heuristic");
        }
        Ok(Self {
            store,
            ords,
            scorer,
            settings: Arc::new(settings),
        })
    }

    pub fn expose_errors(&self) -> bool {
        self.settings.expose_errors
    }
}

pub fn create_app(settings: Settings) -> anyhow::Result<Router> {
    let store = create_store(&settings);
    let state = AppState::from_parts(store, settings)?;
    Ok(build_router(state))
}

fn create_store(settings: &Settings) -> Arc<dyn ClaimStore> {
    match settings.database_url.as_deref() {
        Some(database_url) => {
            info!("Using PostgreSQL claim storage");
            match PostgresClaimStore::connect_lazy(database_url) {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    error!(
                        "Failed to configure PostgreSQL: {}. Falling back to in-memory storage.",
                        e
                    );
                    Arc::new(InMemoryClaimStore::new())
                }
            }
        }
        None => {
            info!("Using in-memory claim storage (set DATABASE_URL to use PostgreSQL)");
            Arc::new(InMemoryClaimStore::new())
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Room for a full set of attachments plus the form fields.
    let submit_limit = MAX_FILES * MAX_FILE_SIZE + 1024 * 1024;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route(
            "/api/claims/submit",
            post(claims::submit_claim).layer(DefaultBodyLimit::max(submit_limit)),
        )
        .route("/api/claims-chatbot", get(claims::list_claims))
        .route("/api/claims/status/{claim_number}", get(claims::claim_status))
        .route("/api/claims/files/{filename}", get(claims::download_file))
        .route("/api/claims/{id}", patch(claims::update_claim))
        .route("/api/claims", get(reports::ords_claims))
        .route("/api/adjusters", get(reports::ords_adjusters))
        .route("/api/damages", get(reports::ords_damages))
        .route("/api/ai-insights", get(reports::ai_insights))
        .route("/api/dashboard", get(reports::dashboard))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(correlation_id_middleware))
        .with_state(state)
}

/// Tags each request with a fresh correlation id and runs it inside an
/// `http_request` span. The id is echoed on the response.
async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&correlation_id).ok();

    if let Some(value) = header.clone() {
        request.headers_mut().insert(CORRELATION_HEADER, value);
    }

    let span = tracing::info_span!(
        "http_request",
        correlation_id = %correlation_id,
        method = %request.method(),
        path = %request.uri().path()
    );
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Claims Portal Backend",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Claim intake, listing and reporting over PostgreSQL and ORDS",
        "endpoints": {
            "POST /api/claims/submit": "Submit a claim (JSON or multipart with files)",
            "GET /api/claims-chatbot": "List claims with customer details",
            "GET /api/claims/status/{claim_number}": "Claim status",
            "GET /api/claims/files/{filename}": "Download an attachment",
            "PATCH /api/claims/{id}": "Update status or assigned adjuster",
            "GET /api/claims": "ORDS claims",
            "GET /api/adjusters": "ORDS adjusters",
            "GET /api/damages": "ORDS damages",
            "GET /api/ai-insights": "Fraud insights",
            "GET /api/dashboard": "Aggregated dashboard metrics",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check(State(state): State<AppState>) -> Response {
    let (ords, database) = tokio::join!(state.ords.probe(), state.store.ping());

    let database_status = match &database {
        Ok(()) => "connected",
        Err(e) => {
            warn!(error = %e, "Database ping failed");
            "disconnected"
        }
    };

    match ords {
        Ok(()) => Json(json!({
            "status": "healthy",
            "backend": "connected",
            "ords": "connected",
            "database": database_status,
            "ordsUrl": state.ords.base_url(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
        .into_response(),
        Err(e) => {
            error!(error = %e, "ORDS probe failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "unhealthy",
                    "backend": "connected",
                    "ords": "disconnected",
                    "database": database_status,
                    "error": e.to_string(),
                    "ordsUrl": state.ords.base_url(),
                    "timestamp": chrono::Utc::now().to_rfc3339()
                })),
            )
                .into_response()
        }
    }
}
