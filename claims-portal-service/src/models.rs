use chrono::{DateTime, Utc};
use claims_core::{AdjusterRecord, ClaimRecord, DamageRecord, intake::adjuster_by_id};
use serde::Serialize;

use crate::uploads::StoredFile;

pub const NEXT_STEPS: [&str; 3] = [
    "You will receive a confirmation email shortly",
    "An adjuster will be assigned within 24 hours",
    "You can track your claim status in the portal",
];

#[derive(Debug, Serialize)]
pub struct AttachmentInfo {
    pub filename: String,
    pub originalname: String,
    pub size: usize,
}

impl From<&StoredFile> for AttachmentInfo {
    fn from(file: &StoredFile) -> Self {
        Self {
            filename: file.filename.clone(),
            originalname: file.original_name.clone(),
            size: file.size,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitClaimResponse {
    pub success: bool,
    pub claim_number: String,
    pub claim_id: String,
    pub status: String,
    pub priority: String,
    pub assigned_adjuster: String,
    pub uploaded_files: usize,
    pub estimated_loss: f64,
    pub message: &'static str,
    pub estimated_processing_time: &'static str,
    pub next_steps: [&'static str; 3],
    pub attachments: Vec<AttachmentInfo>,
}

/// Listing row in the upper-snake shape the claims tab reads.
#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ClaimView {
    pub claim_id: Option<String>,
    pub claim_number: Option<String>,
    pub policy_id: Option<String>,
    pub customer_id: Option<String>,
    pub claim_type: Option<String>,
    pub claim_subtype: Option<String>,
    pub peril_code: Option<String>,
    pub incident_date: Option<DateTime<Utc>>,
    pub incident_description: Option<String>,
    pub incident_location: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_adjuster_id: Option<String>,
    pub assigned_date: Option<DateTime<Utc>>,
    pub estimated_loss: f64,
    pub approved_amount: f64,
    pub paid_amount: f64,
    pub intake_channel: String,
    pub ai_confidence_score: f64,
    pub requires_human_review: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

impl ClaimView {
    pub fn from_record(claim: ClaimRecord, now: DateTime<Utc>) -> Self {
        let not_available = || "N/A".to_string();
        Self {
            created_at: claim.created_at.or(claim.created_date).unwrap_or(now),
            claim_id: claim.claim_id,
            claim_number: claim.claim_number,
            policy_id: claim.policy_id,
            customer_id: claim.customer_id,
            claim_type: claim.claim_type,
            claim_subtype: claim.claim_subtype,
            peril_code: claim.peril_code,
            incident_date: claim.incident_date,
            incident_description: claim.incident_description,
            incident_location: claim.incident_location,
            status: claim.status,
            priority: claim.priority,
            assigned_adjuster_id: claim.assigned_adjuster_id,
            assigned_date: claim.assigned_date,
            estimated_loss: claim.estimated_loss.unwrap_or(0.0),
            approved_amount: claim.approved_amount.unwrap_or(0.0),
            paid_amount: claim.paid_amount.unwrap_or(0.0),
            intake_channel: claim.intake_channel.unwrap_or_else(|| "CHATBOT".into()),
            ai_confidence_score: claim.ai_confidence_score.unwrap_or(0.9),
            requires_human_review: claim.requires_human_review.unwrap_or_else(|| "N".into()),
            updated_at: claim.updated_at,
            closed_at: claim.closed_at,
            customer_name: claim.customer_name.unwrap_or_else(not_available),
            customer_email: claim.customer_email.unwrap_or_else(not_available),
            customer_phone: claim.customer_phone.unwrap_or_else(not_available),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClaimListResponse {
    pub success: bool,
    pub claims: Vec<ClaimView>,
    pub count: usize,
    pub source: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStatusResponse {
    pub claim_number: String,
    pub status: String,
    pub assigned_adjuster: String,
    pub priority: String,
    pub last_update: DateTime<Utc>,
    pub estimated_loss: f64,
    pub description: String,
}

impl ClaimStatusResponse {
    /// The same pending status for every claim number.
    pub fn placeholder(claim_number: String, now: DateTime<Utc>) -> Self {
        Self {
            claim_number,
            status: "Pending".to_string(),
            assigned_adjuster: "Michael Rodriguez".to_string(),
            priority: "Medium".to_string(),
            last_update: now,
            estimated_loss: 5000.0,
            description: "Claim is being reviewed by adjuster".to_string(),
        }
    }
}

fn adjuster_name(adjuster_id: Option<&str>) -> String {
    match adjuster_id {
        None => "Unassigned".to_string(),
        Some(id) => adjuster_by_id(id)
            .map(|a| a.name.to_string())
            .unwrap_or_else(|| id.to_string()),
    }
}

/// Row of `GET /api/claims`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSummary {
    pub claim_id: Option<String>,
    pub claim_number: Option<String>,
    pub claim_type: Option<String>,
    pub policy_number: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub status: Option<String>,
    pub claim_amount: f64,
    pub date_filed: Option<DateTime<Utc>>,
    pub adjuster_name: String,
}

impl From<ClaimRecord> for ClaimSummary {
    fn from(claim: ClaimRecord) -> Self {
        Self {
            adjuster_name: adjuster_name(claim.assigned_adjuster_id.as_deref()),
            claim_id: claim.claim_id,
            claim_number: claim.claim_number,
            claim_type: claim.claim_type,
            policy_number: claim.policy_id,
            customer_name: claim.customer_name.unwrap_or_else(|| "Customer".into()),
            customer_email: claim.customer_email.unwrap_or_default(),
            status: claim.status,
            claim_amount: claim.estimated_loss.unwrap_or(0.0),
            date_filed: claim.created_date,
        }
    }
}

/// Row of `GET /api/adjusters`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjusterSummary {
    pub adjuster_id: Option<String>,
    pub adjuster_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub active_claims: f64,
    pub status: &'static str,
}

impl From<AdjusterRecord> for AdjusterSummary {
    fn from(adjuster: AdjusterRecord) -> Self {
        Self {
            adjuster_name: adjuster.full_name(),
            status: if adjuster.is_available() {
                "Active"
            } else {
                "Inactive"
            },
            active_claims: adjuster.current_workload.unwrap_or(0.0),
            adjuster_id: adjuster.adjuster_id,
            email: adjuster.email,
            phone: adjuster.phone,
            specialization: adjuster.specialization,
        }
    }
}

/// Row of `GET /api/damages`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageSummary {
    pub damage_id: Option<String>,
    pub claim_id: Option<String>,
    pub damage_type: Option<String>,
    pub severity: Option<String>,
    pub repair_cost: f64,
    pub assessment_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

impl From<DamageRecord> for DamageSummary {
    fn from(damage: DamageRecord) -> Self {
        Self {
            damage_id: damage.damage_id,
            claim_id: damage.claim_id,
            damage_type: damage.damage_type,
            severity: damage.severity,
            repair_cost: damage.estimated_repair_cost.unwrap_or(0.0),
            assessment_date: damage.assessment_date,
            description: damage.damage_description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn claim_view_fills_defaults_in_upper_snake() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let view = ClaimView::from_record(
            ClaimRecord {
                claim_id: Some("CLM111".into()),
                ..Default::default()
            },
            now,
        );
        let value = serde_json::to_value(&view).unwrap();

        assert_eq!(value["CLAIM_ID"], "CLM111");
        assert_eq!(value["ESTIMATED_LOSS"], 0.0);
        assert_eq!(value["INTAKE_CHANNEL"], "CHATBOT");
        assert_eq!(value["AI_CONFIDENCE_SCORE"], 0.9);
        assert_eq!(value["REQUIRES_HUMAN_REVIEW"], "N");
        assert_eq!(value["CUSTOMER_NAME"], "N/A");
        assert_eq!(value["CREATED_AT"], json!(now));
        assert_eq!(value["CLOSED_AT"], serde_json::Value::Null);
    }

    #[test]
    fn adjuster_summary_status_and_name() {
        let summary = AdjusterSummary::from(AdjusterRecord {
            adjuster_id: Some("ADJ010".into()),
            first_name: Some("Kim".into()),
            is_available: Some("Y".into()),
            ..Default::default()
        });
        assert_eq!(summary.adjuster_name, "Kim");
        assert_eq!(summary.status, "Active");
        assert_eq!(summary.active_claims, 0.0);
    }

    #[test]
    fn placeholder_status_echoes_the_number_only() {
        let now = Utc::now();
        let status = serde_json::to_value(ClaimStatusResponse::placeholder(
            "CLM-2024-111111".into(),
            now,
        ))
        .unwrap();
        assert_eq!(status["claimNumber"], "CLM-2024-111111");
        assert_eq!(status["status"], "Pending");
        assert_eq!(status["assignedAdjuster"], "Michael Rodriguez");
        assert_eq!(status["priority"], "Medium");
        assert_eq!(status["estimatedLoss"], 5000.0);
        assert!(status.get("source").is_none());
    }
}
