//! ORDS-backed reporting endpoints used by the dashboard.

use axum::{extract::State, response::Json};
use chrono::Utc;
use claims_core::{
    AdjusterRecord, ClaimRecord, DamageRecord, DashboardMetrics, FraudInsight,
    fraud::{INSIGHT_LIMIT, build_insights, fallback_scores},
    normalize::{FromOrds, records},
};
use tracing::{error, info, warn};

use crate::models::{AdjusterSummary, ClaimSummary, DamageSummary};
use crate::service::{ApiError, ApiResult, AppState, internal_error};

async fn fetch_collection<T: FromOrds>(
    state: &AppState,
    collection: &str,
    failure: &str,
) -> Result<Vec<T>, ApiError> {
    match state.ords.fetch_all(collection).await {
        Ok(items) => Ok(records(items)),
        Err(e) => {
            error!(collection, error = %e, "ORDS fetch failed");
            Err(internal_error(failure, &e.to_string(), state.expose_errors()))
        }
    }
}

pub async fn ords_claims(State(state): State<AppState>) -> ApiResult<Vec<ClaimSummary>> {
    let claims: Vec<ClaimRecord> =
        fetch_collection(&state, "/claims/", "Failed to fetch claims").await?;
    Ok(Json(claims.into_iter().map(ClaimSummary::from).collect()))
}

pub async fn ords_adjusters(State(state): State<AppState>) -> ApiResult<Vec<AdjusterSummary>> {
    let adjusters: Vec<AdjusterRecord> =
        fetch_collection(&state, "/adjusters/", "Failed to fetch adjusters").await?;
    Ok(Json(adjusters.into_iter().map(AdjusterSummary::from).collect()))
}

pub async fn ords_damages(State(state): State<AppState>) -> ApiResult<Vec<DamageSummary>> {
    let damages: Vec<DamageRecord> =
        fetch_collection(&state, "/damages/", "Failed to fetch damages").await?;
    Ok(Json(damages.into_iter().map(DamageSummary::from).collect()))
}

/// Fraud insights for the first claims in the collection. Never fails: an
/// unreachable ORDS yields an empty list.
pub async fn ai_insights(State(state): State<AppState>) -> Json<Vec<FraudInsight>> {
    let claims: Vec<ClaimRecord> = match state.ords.fetch_all("/claims/").await {
        Ok(items) => records(items),
        Err(e) => {
            error!(error = %e, "Error fetching claims for insights");
            return Json(Vec::new());
        }
    };
    let scored = &claims[..claims.len().min(INSIGHT_LIMIT)];

    let (scores, model_scored) = match state.scorer.score(scored).await {
        Ok(scores) => {
            info!(count = scores.len(), "Fraud model scoring complete");
            (scores, true)
        }
        Err(e) => {
            warn!(error = %e, "Fraud model unavailable, using fallback heuristic");
            (fallback_scores(scored), false)
        }
    };

    Json(build_insights(
        scored,
        &scores,
        state.settings.fraud_thresholds,
        model_scored,
    ))
}

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<DashboardMetrics> {
    let (claims, adjusters, damages) = tokio::try_join!(
        state.ords.fetch_all("/claims/"),
        state.ords.fetch_all("/adjusters/"),
        state.ords.fetch_all("/damages/"),
    )
    .map_err(|e| {
        error!(error = %e, "Dashboard fetch failed");
        internal_error(
            "Failed to load dashboard metrics",
            &e.to_string(),
            state.expose_errors(),
        )
    })?;

    let claims: Vec<ClaimRecord> = records(claims);
    let adjusters: Vec<AdjusterRecord> = records(adjusters);
    let damages: Vec<DamageRecord> = records(damages);

    Ok(Json(DashboardMetrics::compute(
        &claims,
        &adjusters,
        &damages,
        Utc::now().date_naive(),
    )))
}
