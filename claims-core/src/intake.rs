use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::model::{Adjuster, NewClaim, Priority};
use crate::normalize::lenient::parse_timestamp;

pub const STATUS_PENDING: &str = "Pending";
pub const INTAKE_CHANNEL: &str = "CHATBOT";

const HIGH_PRIORITY_THRESHOLD: f64 = 50_000.0;
const MEDIUM_PRIORITY_THRESHOLD: f64 = 10_000.0;
const PERIL_CODE_MAX_LEN: usize = 20;

/// Fields a submission must carry, in the order they are reported.
pub const REQUIRED_FIELDS: [&str; 9] = [
    "claimType",
    "claimSubtype",
    "incidentDate",
    "incidentDescription",
    "location",
    "estimatedLoss",
    "policyNumber",
    "customerName",
    "customerEmail",
];

pub const DEFAULT_ADJUSTER: Adjuster = Adjuster {
    id: "ADJ001",
    name: "Michael Rodriguez",
};

const ADJUSTER_ROSTER: [(&str, Priority, Adjuster); 9] = [
    ("Auto", Priority::High, DEFAULT_ADJUSTER),
    ("Auto", Priority::Medium, Adjuster { id: "ADJ002", name: "Sarah Chen" }),
    ("Auto", Priority::Low, Adjuster { id: "ADJ003", name: "David Martinez" }),
    ("Property", Priority::High, Adjuster { id: "ADJ004", name: "Emily Johnson" }),
    ("Property", Priority::Medium, Adjuster { id: "ADJ005", name: "James Wilson" }),
    ("Property", Priority::Low, Adjuster { id: "ADJ006", name: "Lisa Anderson" }),
    ("Liability", Priority::High, Adjuster { id: "ADJ007", name: "Robert Taylor" }),
    ("Liability", Priority::Medium, Adjuster { id: "ADJ008", name: "Jennifer Davis" }),
    ("Liability", Priority::Low, Adjuster { id: "ADJ009", name: "Christopher Brown" }),
];

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex is valid"));

/// `CLM-<year>-<6 digits>`
pub fn generate_claim_number(year: i32) -> String {
    let serial: u32 = rand::rng().random_range(100_000..=999_999);
    format!("CLM-{year}-{serial}")
}

/// `CLM<3 digits>`
pub fn generate_claim_id() -> String {
    let serial: u32 = rand::rng().random_range(100..=999);
    format!("CLM{serial:03}")
}

pub fn calculate_priority(estimated_loss: f64) -> Priority {
    if estimated_loss > HIGH_PRIORITY_THRESHOLD {
        Priority::High
    } else if estimated_loss > MEDIUM_PRIORITY_THRESHOLD {
        Priority::Medium
    } else {
        Priority::Low
    }
}

pub fn assign_adjuster(claim_type: &str, priority: Priority) -> Adjuster {
    ADJUSTER_ROSTER
        .iter()
        .find(|(kind, tier, _)| *kind == claim_type && *tier == priority)
        .map(|(_, _, adjuster)| *adjuster)
        .unwrap_or(DEFAULT_ADJUSTER)
}

pub fn adjuster_by_id(adjuster_id: &str) -> Option<Adjuster> {
    ADJUSTER_ROSTER
        .iter()
        .map(|(_, _, adjuster)| *adjuster)
        .find(|adjuster| adjuster.id == adjuster_id)
}

pub fn peril_code(claim_subtype: &str) -> String {
    WHITESPACE
        .replace_all(&claim_subtype.to_uppercase(), "_")
        .chars()
        .take(PERIL_CODE_MAX_LEN)
        .collect()
}

/// Confidence recorded at intake, uniform in [0.85, 1.0).
pub fn ai_confidence_score() -> f64 {
    rand::rng().random_range(0.85..1.0)
}

/// Parses an amount typed by a person; anything unreadable counts as zero.
pub fn parse_amount(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .unwrap_or(0.0)
}

/// Identifiers allocated for one insert attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimIds {
    pub claim_id: String,
    pub claim_number: String,
}

impl ClaimIds {
    pub fn generate(now: DateTime<Utc>) -> Self {
        use chrono::Datelike;
        Self {
            claim_id: generate_claim_id(),
            claim_number: generate_claim_number(now.year()),
        }
    }
}

/// A validated claim submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSubmission {
    pub claim_type: String,
    pub claim_subtype: String,
    pub incident_date: String,
    pub incident_description: String,
    pub location: String,
    pub estimated_loss: String,
    pub policy_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
}

impl ClaimSubmission {
    /// Validates presence of every required field.
    ///
    /// Blank values count as missing. On failure the error lists the missing
    /// field names in [`REQUIRED_FIELDS`] order.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, Vec<&'static str>> {
        let value = |name: &str| {
            fields
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|name| value(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }

        let required = |name: &str| value(name).unwrap_or_default();
        Ok(Self {
            claim_type: required("claimType"),
            claim_subtype: required("claimSubtype"),
            incident_date: required("incidentDate"),
            incident_description: required("incidentDescription"),
            location: required("location"),
            estimated_loss: required("estimatedLoss"),
            policy_number: required("policyNumber"),
            customer_name: required("customerName"),
            customer_email: required("customerEmail"),
            customer_phone: value("customerPhone"),
        })
    }

    pub fn loss_amount(&self) -> f64 {
        parse_amount(&self.estimated_loss)
    }

    pub fn priority(&self) -> Priority {
        calculate_priority(self.loss_amount())
    }

    pub fn adjuster(&self) -> Adjuster {
        assign_adjuster(&self.claim_type, self.priority())
    }

    /// Builds the row to insert. Unreadable incident dates fall back to `now`.
    pub fn to_new_claim(&self, ids: &ClaimIds, now: DateTime<Utc>) -> NewClaim {
        let priority = self.priority();
        NewClaim {
            claim_id: ids.claim_id.clone(),
            claim_number: ids.claim_number.clone(),
            policy_id: None,
            customer_id: None,
            claim_type: self.claim_type.clone(),
            claim_subtype: self.claim_subtype.clone(),
            peril_code: peril_code(&self.claim_subtype),
            incident_date: parse_timestamp(&self.incident_date).unwrap_or(now),
            incident_description: self.incident_description.clone(),
            incident_location: self.location.clone(),
            status: STATUS_PENDING.to_string(),
            priority,
            assigned_adjuster_id: assign_adjuster(&self.claim_type, priority).id.to_string(),
            estimated_loss: self.loss_amount(),
            ai_confidence_score: ai_confidence_score(),
            intake_channel: INTAKE_CHANNEL.to_string(),
            requires_human_review: "N".to_string(),
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn complete_fields() -> HashMap<String, String> {
        [
            ("claimType", "Auto"),
            ("claimSubtype", "Rear End Collision"),
            ("incidentDate", "2024-05-01"),
            ("incidentDescription", "Hit from behind at a light"),
            ("location", "Springfield, IL"),
            ("estimatedLoss", "12000"),
            ("policyNumber", "POL-1001"),
            ("customerName", "Jane Doe"),
            ("customerEmail", "jane@example.com"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn generated_identifiers_match_formats() {
        let number = Regex::new(r"^CLM-2025-\d{6}$").unwrap();
        let id = Regex::new(r"^CLM\d{3}$").unwrap();
        for _ in 0..200 {
            assert!(number.is_match(&generate_claim_number(2025)));
            assert!(id.is_match(&generate_claim_id()));
        }
    }

    #[test]
    fn priority_thresholds_are_exclusive() {
        assert_eq!(calculate_priority(0.0), Priority::Low);
        assert_eq!(calculate_priority(10_000.0), Priority::Low);
        assert_eq!(calculate_priority(10_000.01), Priority::Medium);
        assert_eq!(calculate_priority(50_000.0), Priority::Medium);
        assert_eq!(calculate_priority(50_001.0), Priority::High);
    }

    #[test]
    fn adjuster_roster_lookup() {
        assert_eq!(assign_adjuster("Auto", Priority::Medium).name, "Sarah Chen");
        assert_eq!(assign_adjuster("Property", Priority::Low).id, "ADJ006");
        assert_eq!(assign_adjuster("Liability", Priority::High).id, "ADJ007");
        assert_eq!(assign_adjuster("Marine", Priority::Low), DEFAULT_ADJUSTER);
        assert_eq!(adjuster_by_id("ADJ009").map(|a| a.name), Some("Christopher Brown"));
        assert_eq!(adjuster_by_id("ADJ042"), None);
    }

    #[test]
    fn peril_code_is_upper_snake_and_truncated() {
        assert_eq!(peril_code("Rear End  Collision"), "REAR_END_COLLISION");
        assert_eq!(peril_code("water damage from burst pipe"), "WATER_DAMAGE_FROM_BU");
    }

    #[test]
    fn confidence_score_range() {
        for _ in 0..500 {
            let score = ai_confidence_score();
            assert!((0.85..1.0).contains(&score));
        }
    }

    #[test]
    fn amounts_parse_leniently() {
        assert_eq!(parse_amount("12,500.75"), 12_500.75);
        assert_eq!(parse_amount("$900"), 900.0);
        assert_eq!(parse_amount("lots"), 0.0);
    }

    #[test]
    fn missing_fields_are_reported_in_order() {
        let mut fields = complete_fields();
        fields.remove("location");
        fields.insert("claimType".into(), "   ".into());
        fields.remove("customerEmail");

        let missing = ClaimSubmission::from_fields(&fields).unwrap_err();
        assert_eq!(missing, vec!["claimType", "location", "customerEmail"]);
    }

    #[test]
    fn submission_builds_pending_claim() {
        let submission = ClaimSubmission::from_fields(&complete_fields()).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let ids = ClaimIds {
            claim_id: "CLM123".into(),
            claim_number: "CLM-2024-654321".into(),
        };

        let claim = submission.to_new_claim(&ids, now);
        assert_eq!(claim.priority, Priority::Medium);
        assert_eq!(claim.assigned_adjuster_id, "ADJ002");
        assert_eq!(claim.peril_code, "REAR_END_COLLISION");
        assert_eq!(claim.status, STATUS_PENDING);
        assert_eq!(claim.estimated_loss, 12_000.0);
        assert_eq!(
            claim.incident_date,
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(claim.customer_id, None);
    }

    #[test]
    fn unreadable_incident_date_uses_submission_time() {
        let mut fields = complete_fields();
        fields.insert("incidentDate".into(), "last tuesday".into());
        let submission = ClaimSubmission::from_fields(&fields).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let claim = submission.to_new_claim(&ClaimIds::generate(now), now);
        assert_eq!(claim.incident_date, now);
        assert!(claim.claim_number.starts_with("CLM-2024-"));
    }
}
