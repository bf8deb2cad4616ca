use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::normalize::lenient;

/// Priority tier derived from the estimated loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry of the static adjuster roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Adjuster {
    pub id: &'static str,
    pub name: &'static str,
}

/// Row written by a claim submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClaim {
    pub claim_id: String,
    pub claim_number: String,
    pub policy_id: Option<String>,
    pub customer_id: Option<String>,
    pub claim_type: String,
    pub claim_subtype: String,
    pub peril_code: String,
    pub incident_date: DateTime<Utc>,
    pub incident_description: String,
    pub incident_location: String,
    pub status: String,
    pub priority: Priority,
    pub assigned_adjuster_id: String,
    pub estimated_loss: f64,
    pub ai_confidence_score: f64,
    pub intake_channel: String,
    pub requires_human_review: String,
    pub created_at: DateTime<Utc>,
}

/// Canonical read shape of a claim, whatever source it came from.
///
/// ORDS items are fed through [`crate::normalize::canonical_keys`] first, so
/// every field here is addressed by its lower-snake name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub claim_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub claim_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub policy_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub customer_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub claim_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub claim_subtype: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub peril_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub incident_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub incident_description: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub incident_location: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub assigned_adjuster_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub assigned_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub estimated_loss: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub approved_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub paid_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub intake_channel: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub ai_confidence_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub requires_human_review: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub customer_email: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub customer_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_name: Option<String>,
}

impl ClaimRecord {
    /// Read shape of a freshly inserted claim, with no customer attached.
    pub fn from_new_claim(claim: &NewClaim) -> Self {
        Self {
            claim_id: Some(claim.claim_id.clone()),
            claim_number: Some(claim.claim_number.clone()),
            policy_id: claim.policy_id.clone(),
            customer_id: claim.customer_id.clone(),
            claim_type: Some(claim.claim_type.clone()),
            claim_subtype: Some(claim.claim_subtype.clone()),
            peril_code: Some(claim.peril_code.clone()),
            incident_date: Some(claim.incident_date),
            incident_description: Some(claim.incident_description.clone()),
            incident_location: Some(claim.incident_location.clone()),
            status: Some(claim.status.clone()),
            priority: Some(claim.priority.to_string()),
            assigned_adjuster_id: Some(claim.assigned_adjuster_id.clone()),
            estimated_loss: Some(claim.estimated_loss),
            ai_confidence_score: Some(claim.ai_confidence_score),
            intake_channel: Some(claim.intake_channel.clone()),
            requires_human_review: Some(claim.requires_human_review.clone()),
            created_at: Some(claim.created_at),
            created_date: Some(claim.created_at),
            ..Default::default()
        }
    }

    /// Timestamp used to place the claim on a timeline.
    pub fn timeline_date(&self) -> Option<DateTime<Utc>> {
        self.created_date.or(self.incident_date).or(self.created_at)
    }
}

/// Partial update applied by `PATCH /api/claims/{id}`.
///
/// Both fields distinguish "absent" (`None`) from an explicit null
/// (`Some(None)`). A null adjuster clears the assignment; a null status
/// leaves the status untouched but still counts as a supplied field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimUpdate {
    #[serde(default, deserialize_with = "lenient::present")]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::present")]
    pub assigned_adjuster_id: Option<Option<String>>,
}

impl ClaimUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.assigned_adjuster_id.is_none()
    }

    /// The status to write, if one was supplied and is neither null nor blank.
    pub fn new_status(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|status| status.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// The adjuster to write; empty strings clear the assignment.
    pub fn new_adjuster(&self) -> Option<Option<&str>> {
        self.assigned_adjuster_id
            .as_ref()
            .map(|adj| adj.as_deref().filter(|s| !s.is_empty()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub customer_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub state: Option<String>,
}

impl CustomerRecord {
    pub fn full_name(&self) -> String {
        join_name(self.first_name.as_deref(), self.last_name.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjusterRecord {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub adjuster_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub specialization: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub current_workload: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub is_available: Option<String>,
}

impl AdjusterRecord {
    pub fn full_name(&self) -> String {
        join_name(self.first_name.as_deref(), self.last_name.as_deref())
    }

    pub fn is_available(&self) -> bool {
        self.is_available.as_deref() == Some("Y")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageRecord {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub damage_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub claim_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub damage_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub estimated_repair_cost: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub assessment_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub damage_description: Option<String>,
}

pub(crate) fn join_name(first: Option<&str>, last: Option<&str>) -> String {
    format!(
        "{} {}",
        first.unwrap_or("").trim(),
        last.unwrap_or("").trim()
    )
    .trim()
    .to_string()
}
