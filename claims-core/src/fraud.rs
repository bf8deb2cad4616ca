use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{ClaimsError, Result};
use crate::model::ClaimRecord;

/// Number of claims turned into insights per request.
pub const INSIGHT_LIMIT: usize = 10;
const NEUTRAL_SCORE: f64 = 0.5;

/// Feature vector sent to the fraud model for one claim
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FraudFeatures {
    pub estimated_loss: f64,
    pub claim_type: String,
    pub status: String,
    pub peril_code: String,
    pub intake_channel: String,
    pub days_since_incident: i64,
}

impl FraudFeatures {
    pub fn from_claim(claim: &ClaimRecord, now: DateTime<Utc>) -> Self {
        let incident = claim.incident_date.or(claim.created_date).unwrap_or(now);
        Self {
            estimated_loss: claim.estimated_loss.unwrap_or(0.0),
            claim_type: claim.claim_type.clone().unwrap_or_else(|| "Unknown".into()),
            status: claim.status.clone().unwrap_or_else(|| "Unknown".into()),
            peril_code: claim.peril_code.clone().unwrap_or_else(|| "UNKNOWN".into()),
            intake_channel: claim
                .intake_channel
                .clone()
                .unwrap_or_else(|| "UNKNOWN".into()),
            days_since_incident: (now - incident).num_days().max(0),
        }
    }
}

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    instances: &'a [FraudFeatures],
}

#[derive(Debug, Default, Deserialize)]
struct ScoreResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Default, Deserialize)]
struct Prediction {
    #[serde(default)]
    score: Option<f64>,
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { NEUTRAL_SCORE } else { value.clamp(0.0, 1.0) }
}

/// Client for the external fraud scoring endpoint
#[derive(Clone)]
pub struct FraudScorer {
    client: reqwest::Client,
    endpoint: Option<(String, String)>,
}

impl FraudScorer {
    pub fn new(
        url: Option<String>,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let endpoint = match (url, api_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Some((url, key)),
            _ => None,
        };
        Ok(Self {
            client: builder.build()?,
            endpoint,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Scores `claims` in order. Returns one probability in [0, 1] per claim.
    pub async fn score(&self, claims: &[ClaimRecord]) -> Result<Vec<f64>> {
        let (url, key) = self
            .endpoint
            .as_ref()
            .ok_or(ClaimsError::ScorerNotConfigured)?;

        let now = Utc::now();
        let instances: Vec<FraudFeatures> = claims
            .iter()
            .map(|claim| FraudFeatures::from_claim(claim, now))
            .collect();

        let response = self
            .client
            .post(url)
            .bearer_auth(key)
            .json(&ScoreRequest {
                instances: &instances,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClaimsError::Upstream {
                endpoint: url.clone(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: ScoreResponse = response.json().await?;
        if body.predictions.len() != claims.len() {
            warn!(
                expected = claims.len(),
                received = body.predictions.len(),
                "Fraud model returned a misaligned prediction count"
            );
        }
        info!(scored = claims.len(), "Fraud scoring complete");

        Ok((0..claims.len())
            .map(|i| {
                let score = body
                    .predictions
                    .get(i)
                    .and_then(|p| p.score)
                    .unwrap_or(NEUTRAL_SCORE);
                clamp_unit(score)
            })
            .collect())
    }
}

/// Scores used when the model is unavailable: the confidence recorded at intake.
pub fn fallback_scores(claims: &[ClaimRecord]) -> Vec<f64> {
    claims
        .iter()
        .map(|claim| clamp_unit(claim.ai_confidence_score.unwrap_or(NEUTRAL_SCORE)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FraudThresholds {
    high: f64,
    medium: f64,
}

impl Default for FraudThresholds {
    fn default() -> Self {
        Self {
            high: 0.7,
            medium: 0.4,
        }
    }
}

impl FraudThresholds {
    /// Both thresholds are clamped to [0, 1]; medium never exceeds high.
    pub fn new(high: f64, medium: f64) -> Self {
        let high = clamp_unit(high);
        let medium = clamp_unit(medium).min(high);
        Self { high, medium }
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn medium(&self) -> f64 {
        self.medium
    }

    pub fn bucket(&self, score: f64) -> RiskLevel {
        if score >= self.high {
            RiskLevel::High
        } else if score >= self.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudInsight {
    pub insight_id: String,
    pub claim_id: Option<String>,
    pub insight_type: &'static str,
    pub title: &'static str,
    pub description: String,
    pub confidence: RiskLevel,
    pub generated_date: DateTime<Utc>,
}

pub fn build_insights(
    claims: &[ClaimRecord],
    scores: &[f64],
    thresholds: FraudThresholds,
    model_scored: bool,
) -> Vec<FraudInsight> {
    let source = if model_scored {
        "fraud model"
    } else {
        "fallback heuristic"
    };
    claims
        .iter()
        .take(INSIGHT_LIMIT)
        .enumerate()
        .map(|(idx, claim)| {
            let probability = clamp_unit(scores.get(idx).copied().unwrap_or(NEUTRAL_SCORE));
            let confidence = thresholds.bucket(probability);
            let title = match confidence {
                RiskLevel::High => "High Fraud Risk - Requires Review",
                RiskLevel::Medium => "Potential Fraud Indicators",
                RiskLevel::Low => "Low Fraud Risk Detected",
            };
            FraudInsight {
                insight_id: format!("INS-{}", claim.claim_id.as_deref().unwrap_or_default()),
                claim_id: claim.claim_number.clone(),
                insight_type: "Fraud Detection",
                title,
                description: format!(
                    "Fraud probability: {:.0}%. Generated by {source}.",
                    probability * 100.0
                ),
                confidence,
                generated_date: claim.created_date.unwrap_or_else(Utc::now),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, routing::post};
    use chrono::TimeZone;
    use serde_json::{Value, json};

    fn claim(id: &str, score: Option<f64>) -> ClaimRecord {
        ClaimRecord {
            claim_id: Some(id.to_string()),
            claim_number: Some(format!("CLM-2024-{id}")),
            ai_confidence_score: score,
            ..Default::default()
        }
    }

    #[test]
    fn thresholds_are_clamped_and_ordered() {
        let t = FraudThresholds::new(1.4, 0.9);
        assert_eq!(t.high(), 1.0);
        assert_eq!(t.medium(), 0.9);

        let t = FraudThresholds::new(0.5, 0.8);
        assert_eq!(t.medium(), 0.5);

        let t = FraudThresholds::default();
        assert_eq!(t.bucket(0.7), RiskLevel::High);
        assert_eq!(t.bucket(0.69), RiskLevel::Medium);
        assert_eq!(t.bucket(0.4), RiskLevel::Medium);
        assert_eq!(t.bucket(0.39), RiskLevel::Low);
    }

    #[test]
    fn features_default_missing_fields() {
        let now = Utc.with_ymd_and_hms(2024, 6, 11, 0, 0, 0).unwrap();
        let record = ClaimRecord {
            estimated_loss: Some(4_000.0),
            incident_date: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let features = FraudFeatures::from_claim(&record, now);
        assert_eq!(features.days_since_incident, 10);
        assert_eq!(features.claim_type, "Unknown");
        assert_eq!(features.peril_code, "UNKNOWN");

        let future = ClaimRecord {
            incident_date: Some(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        assert_eq!(FraudFeatures::from_claim(&future, now).days_since_incident, 0);
    }

    #[test]
    fn insights_limit_and_describe() {
        let claims: Vec<ClaimRecord> = (0..12).map(|i| claim(&format!("{i}"), None)).collect();
        let mut scores = vec![0.1; 12];
        scores[0] = 0.93;
        scores[1] = 0.45;

        let insights = build_insights(&claims, &scores, FraudThresholds::default(), false);
        assert_eq!(insights.len(), INSIGHT_LIMIT);
        assert_eq!(insights[0].insight_id, "INS-0");
        assert_eq!(insights[0].claim_id.as_deref(), Some("CLM-2024-0"));
        assert_eq!(insights[0].confidence, RiskLevel::High);
        assert_eq!(insights[0].title, "High Fraud Risk - Requires Review");
        assert_eq!(
            insights[0].description,
            "Fraud probability: 93%. Generated by fallback heuristic."
        );
        assert_eq!(insights[1].confidence, RiskLevel::Medium);
        assert_eq!(insights[2].confidence, RiskLevel::Low);
    }

    #[test]
    fn fallback_uses_intake_confidence() {
        let scores = fallback_scores(&[claim("1", Some(0.9)), claim("2", None)]);
        assert_eq!(scores, vec![0.9, 0.5]);
    }

    #[tokio::test]
    async fn unconfigured_scorer_errors() {
        let scorer = FraudScorer::new(Some("http://localhost".into()), None, None).unwrap();
        assert!(!scorer.is_configured());
        assert!(matches!(
            scorer.score(&[claim("1", None)]).await,
            Err(ClaimsError::ScorerNotConfigured)
        ));
    }

    #[tokio::test]
    async fn scorer_pads_and_clamps_predictions() {
        async fn predict(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
            assert_eq!(headers["authorization"], "Bearer secret");
            assert_eq!(body["instances"].as_array().map(Vec::len), Some(3));
            Json(json!({ "predictions": [{ "score": 1.7 }, { "score": 0.25 }] }))
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().route("/score", post(predict)))
                .await
                .unwrap();
        });

        let scorer = FraudScorer::new(
            Some(format!("http://{addr}/score")),
            Some("secret".into()),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        let claims = [claim("1", None), claim("2", None), claim("3", None)];

        let scores = scorer.score(&claims).await.unwrap();
        assert_eq!(scores, vec![1.0, 0.25, 0.5]);
    }
}
