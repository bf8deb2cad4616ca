//! Normalization boundary for upstream JSON.
//!
//! ORDS returns column names in whichever case the table was created with,
//! and sometimes both. Items are canonicalized once here and deserialized
//! into typed records; nothing downstream looks at raw keys.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::warn;

use crate::error::Result;
use crate::model::{AdjusterRecord, ClaimRecord, CustomerRecord, DamageRecord};

/// Lower-cases every key of a JSON object.
///
/// When two keys collapse onto the same name, the first one carrying a
/// non-empty value is kept. Non-object values are returned untouched.
pub fn canonical_keys(value: Value) -> Value {
    let Value::Object(map) = value else {
        return value;
    };

    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        let key = key.to_ascii_lowercase();
        match out.get(&key) {
            Some(existing) if !is_blank(existing) => {}
            _ => {
                out.insert(key, value);
            }
        }
    }
    Value::Object(out)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Typed conversion of one upstream item.
pub trait FromOrds: DeserializeOwned {
    fn from_ords(item: Value) -> Result<Self> {
        Ok(serde_json::from_value(canonical_keys(item))?)
    }
}

impl FromOrds for ClaimRecord {}
impl FromOrds for AdjusterRecord {}
impl FromOrds for DamageRecord {}

impl FromOrds for CustomerRecord {
    fn from_ords(item: Value) -> Result<Self> {
        let mut item = canonical_keys(item);
        if let Value::Object(map) = &mut item {
            let missing_id = map.get("customer_id").is_none_or(is_blank);
            if missing_id {
                if let Some(id) = map.get("id").cloned() {
                    map.insert("customer_id".to_string(), id);
                }
            }
        }
        Ok(serde_json::from_value(item)?)
    }
}

/// Converts a page of upstream items, dropping the ones that are not objects.
pub fn records<T: FromOrds>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match T::from_ords(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, record_type = std::any::type_name::<T>(), "Skipping malformed upstream item");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Customer contacts keyed by customer id, used to enrich ORDS claim items.
#[derive(Debug, Clone, Default)]
pub struct CustomerDirectory {
    contacts: HashMap<String, CustomerContact>,
}

impl CustomerDirectory {
    pub fn from_records(customers: Vec<CustomerRecord>) -> Self {
        let contacts = customers
            .into_iter()
            .filter_map(|customer| {
                let name = customer.full_name();
                let id = customer.customer_id.filter(|id| !id.is_empty())?;
                if name.is_empty() {
                    return None;
                }
                Some((
                    id,
                    CustomerContact {
                        name,
                        email: customer.email.unwrap_or_default().trim().to_string(),
                        phone: customer.phone.unwrap_or_default().trim().to_string(),
                    },
                ))
            })
            .collect();
        Self { contacts }
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, customer_id: &str) -> Option<&CustomerContact> {
        self.contacts.get(customer_id)
    }

    /// Fills missing customer fields from the directory.
    ///
    /// The record's own values win. A name can also come from the record's
    /// `first_name`/`last_name` when the directory has no entry.
    pub fn enrich(&self, claim: &mut ClaimRecord) {
        let contact = claim.customer_id.as_deref().and_then(|id| self.get(id));

        if claim.customer_name.is_none() {
            claim.customer_name = contact.map(|c| c.name.clone()).or_else(|| {
                let name = crate::model::join_name(
                    claim.first_name.as_deref(),
                    claim.last_name.as_deref(),
                );
                (!name.is_empty()).then_some(name)
            });
        }
        if claim.customer_email.is_none() {
            claim.customer_email = contact
                .map(|c| c.email.clone())
                .filter(|email| !email.is_empty());
        }
        if claim.customer_phone.is_none() {
            claim.customer_phone = contact
                .map(|c| c.phone.clone())
                .filter(|phone| !phone.is_empty());
        }
    }
}

/// Field deserializers that accept the loose typing of upstream JSON.
pub mod lenient {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.and_then(|v| match v {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }))
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }))
    }

    pub fn opt_datetime<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.and_then(|v| match v {
            Value::String(s) => parse_timestamp(&s),
            _ => None,
        }))
    }

    /// Wraps any present value, including `null`, in `Some`.
    pub fn present<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        T::deserialize(d).map(Some)
    }

    /// Parses RFC 3339, naive date-times (taken as UTC) and plain dates.
    pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
        let text = text.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
            return Some(ts.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
                return Some(ts.and_utc());
            }
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|ts| ts.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn canonical_keys_merges_casings() {
        let value = canonical_keys(json!({
            "CLAIM_ID": null,
            "claim_id": "CLM101",
            "STATUS": "",
            "status": "Pending",
        }));
        assert_eq!(value["claim_id"], "CLM101");
        assert_eq!(value["status"], "Pending");
    }

    #[test]
    fn claim_record_from_upper_snake_item() {
        let record = ClaimRecord::from_ords(json!({
            "CLAIM_ID": "CLM204",
            "CLAIM_NUMBER": "CLM-2024-123456",
            "ESTIMATED_LOSS": "12500.50",
            "AI_CONFIDENCE_SCORE": 0.91,
            "CREATED_DATE": "2024-03-05T10:00:00Z",
            "INCIDENT_DATE": "not a date",
            "STATUS": ""
        }))
        .unwrap();

        assert_eq!(record.claim_id.as_deref(), Some("CLM204"));
        assert_eq!(record.claim_number.as_deref(), Some("CLM-2024-123456"));
        assert_eq!(record.estimated_loss, Some(12500.50));
        assert_eq!(record.ai_confidence_score, Some(0.91));
        assert_eq!(
            record.created_date,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap())
        );
        assert_eq!(record.incident_date, None);
        assert_eq!(record.status, None);
    }

    #[test]
    fn claim_record_from_lower_snake_item() {
        let record = ClaimRecord::from_ords(json!({
            "claim_id": 17,
            "claim_type": "Auto",
            "incident_date": "2024-01-02"
        }))
        .unwrap();

        assert_eq!(record.claim_id.as_deref(), Some("17"));
        assert_eq!(record.claim_type.as_deref(), Some("Auto"));
        assert_eq!(
            record.incident_date,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn records_skips_non_objects() {
        let claims: Vec<ClaimRecord> = records(vec![json!({"claim_id": "CLM1"}), json!("junk")]);
        assert_eq!(claims.len(), 1);
    }

    #[test]
    fn customer_id_falls_back_to_id() {
        let customer = CustomerRecord::from_ords(json!({
            "ID": "CUST9",
            "FIRST_NAME": " Ada ",
            "last_name": "Lovelace"
        }))
        .unwrap();
        assert_eq!(customer.customer_id.as_deref(), Some("CUST9"));
        assert_eq!(customer.full_name(), "Ada Lovelace");
    }

    #[test]
    fn directory_drops_nameless_customers_and_enriches_claims() {
        let directory = CustomerDirectory::from_records(vec![
            CustomerRecord {
                customer_id: Some("C1".into()),
                first_name: Some("Jane".into()),
                last_name: Some("Doe".into()),
                email: Some("jane@example.com".into()),
                ..Default::default()
            },
            CustomerRecord {
                customer_id: Some("C2".into()),
                ..Default::default()
            },
        ]);
        assert_eq!(directory.len(), 1);

        let mut known = ClaimRecord {
            customer_id: Some("C1".into()),
            ..Default::default()
        };
        directory.enrich(&mut known);
        assert_eq!(known.customer_name.as_deref(), Some("Jane Doe"));
        assert_eq!(known.customer_email.as_deref(), Some("jane@example.com"));
        assert_eq!(known.customer_phone, None);

        let mut inline = ClaimRecord {
            customer_id: Some("C2".into()),
            first_name: Some("Sam".into()),
            ..Default::default()
        };
        directory.enrich(&mut inline);
        assert_eq!(inline.customer_name.as_deref(), Some("Sam"));
    }

    #[test]
    fn claim_update_distinguishes_null_from_absent() {
        use crate::model::ClaimUpdate;

        let absent: ClaimUpdate = serde_json::from_value(json!({ "status": "Approved" })).unwrap();
        assert_eq!(absent.assigned_adjuster_id, None);
        assert_eq!(absent.new_status(), Some("Approved"));

        let cleared: ClaimUpdate =
            serde_json::from_value(json!({ "assignedAdjusterId": null })).unwrap();
        assert_eq!(cleared.assigned_adjuster_id, Some(None));
        assert_eq!(cleared.new_adjuster(), Some(None));
        assert!(!cleared.is_empty());

        let null_status: ClaimUpdate =
            serde_json::from_value(json!({ "status": null })).unwrap();
        assert_eq!(null_status.status, Some(None));
        assert_eq!(null_status.new_status(), None);
        assert!(!null_status.is_empty());

        let empty: ClaimUpdate = serde_json::from_value(json!({})).unwrap();
        assert!(empty.is_empty());
    }
}
