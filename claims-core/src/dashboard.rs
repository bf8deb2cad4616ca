use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

use crate::model::{AdjusterRecord, ClaimRecord, DamageRecord};

const TREND_DAYS: u64 = 7;
const TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub claims: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageTypeCount {
    pub damage_type: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjusterLoad {
    pub adjuster_name: String,
    pub claims_count: usize,
}

/// Aggregates served by `/api/dashboard`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_claims: usize,
    pub total_amount: f64,
    pub avg_claim_amount: f64,
    pub pending_claims: usize,
    pub approved_claims: usize,
    pub active_adjusters: usize,
    pub claims_by_status: Vec<NamedCount>,
    pub claims_trend: Vec<TrendPoint>,
    pub top_damage_types: Vec<DamageTypeCount>,
    pub top_adjusters: Vec<AdjusterLoad>,
}

impl DashboardMetrics {
    pub fn compute(
        claims: &[ClaimRecord],
        adjusters: &[AdjusterRecord],
        damages: &[DamageRecord],
        today: NaiveDate,
    ) -> Self {
        let total_claims = claims.len();
        let total_amount: f64 = claims.iter().filter_map(|c| c.estimated_loss).sum();
        let avg_claim_amount = if total_claims > 0 {
            total_amount / total_claims as f64
        } else {
            0.0
        };

        let with_status = |wanted: &str| {
            claims
                .iter()
                .filter(|c| c.status.as_deref() == Some(wanted))
                .count()
        };

        let claims_by_status = count_in_order(
            claims
                .iter()
                .map(|c| c.status.clone().unwrap_or_else(|| "Unknown".into())),
        )
        .into_iter()
        .map(|(name, value)| NamedCount { name, value })
        .collect();

        let top_damage_types = top_n(count_in_order(
            damages
                .iter()
                .map(|d| d.damage_type.clone().unwrap_or_else(|| "Unknown".into())),
        ))
        .into_iter()
        .map(|(damage_type, count)| DamageTypeCount { damage_type, count })
        .collect();

        Self {
            total_claims,
            total_amount,
            avg_claim_amount,
            pending_claims: with_status("Pending"),
            approved_claims: with_status("Approved"),
            active_adjusters: adjusters.iter().filter(|a| a.is_available()).count(),
            claims_by_status,
            claims_trend: claims_trend(claims, today),
            top_damage_types,
            top_adjusters: top_adjusters(claims, adjusters),
        }
    }
}

/// Counts occurrences, keeping first-seen order.
fn count_in_order(keys: impl Iterator<Item = String>) -> Vec<(String, usize)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for key in keys {
        match index.get(&key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }
    counts
}

/// Highest counts first; ties keep first-seen order.
fn top_n(mut counts: Vec<(String, usize)>) -> Vec<(String, usize)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(TOP_N);
    counts
}

fn claims_trend(claims: &[ClaimRecord], today: NaiveDate) -> Vec<TrendPoint> {
    let mut by_day: HashMap<NaiveDate, usize> = HashMap::new();
    for claim in claims {
        let day = claim
            .timeline_date()
            .map(|ts| ts.date_naive())
            .unwrap_or(today);
        *by_day.entry(day).or_default() += 1;
    }

    (0..TREND_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|day| TrendPoint {
            date: day.format("%m/%d").to_string(),
            claims: by_day.get(&day).copied().unwrap_or(0),
        })
        .collect()
}

fn top_adjusters(claims: &[ClaimRecord], adjusters: &[AdjusterRecord]) -> Vec<AdjusterLoad> {
    let names: HashMap<&str, String> = adjusters
        .iter()
        .filter_map(|a| {
            let id = a.adjuster_id.as_deref()?;
            let name = a.full_name();
            Some((id, if name.is_empty() { id.to_string() } else { name }))
        })
        .collect();

    let counts = count_in_order(
        claims
            .iter()
            .filter_map(|c| c.assigned_adjuster_id.clone()),
    );

    top_n(counts)
        .into_iter()
        .map(|(id, claims_count)| AdjusterLoad {
            adjuster_name: names.get(id.as_str()).cloned().unwrap_or(id),
            claims_count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn claim(status: &str, loss: f64, adjuster: Option<&str>, day: Option<u32>) -> ClaimRecord {
        ClaimRecord {
            status: Some(status.to_string()),
            estimated_loss: Some(loss),
            assigned_adjuster_id: adjuster.map(str::to_string),
            created_date: day.map(|d| Utc.with_ymd_and_hms(2024, 6, d, 9, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    fn adjuster(id: &str, first: &str, last: &str, available: &str) -> AdjusterRecord {
        AdjusterRecord {
            adjuster_id: Some(id.to_string()),
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            is_available: Some(available.to_string()),
            ..Default::default()
        }
    }

    fn damage(kind: &str) -> DamageRecord {
        DamageRecord {
            damage_type: Some(kind.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_inputs_produce_zeroes() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let metrics = DashboardMetrics::compute(&[], &[], &[], today);
        assert_eq!(metrics.total_claims, 0);
        assert_eq!(metrics.avg_claim_amount, 0.0);
        assert_eq!(metrics.claims_trend.len(), 7);
        assert!(metrics.claims_trend.iter().all(|p| p.claims == 0));
        assert!(metrics.top_adjusters.is_empty());
    }

    #[test]
    fn aggregates_claims_adjusters_and_damages() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let claims = vec![
            claim("Pending", 1_000.0, Some("ADJ001"), Some(10)),
            claim("Approved", 3_000.0, Some("ADJ002"), Some(9)),
            claim("Pending", 2_000.0, Some("ADJ002"), Some(4)),
            claim("Denied", 6_000.0, Some("ADJ777"), Some(1)),
            ClaimRecord::default(),
        ];
        let adjusters = vec![
            adjuster("ADJ001", "Michael", "Rodriguez", "Y"),
            adjuster("ADJ002", "Sarah", "Chen", "Y"),
            adjuster("ADJ003", "David", "Martinez", "N"),
        ];
        let damages = vec![
            damage("Hail"),
            damage("Collision"),
            damage("Collision"),
            DamageRecord::default(),
        ];

        let m = DashboardMetrics::compute(&claims, &adjusters, &damages, today);
        assert_eq!(m.total_claims, 5);
        assert_eq!(m.total_amount, 12_000.0);
        assert_eq!(m.avg_claim_amount, 2_400.0);
        assert_eq!(m.pending_claims, 2);
        assert_eq!(m.approved_claims, 1);
        assert_eq!(m.active_adjusters, 2);

        let statuses: Vec<_> = m
            .claims_by_status
            .iter()
            .map(|s| (s.name.as_str(), s.value))
            .collect();
        assert_eq!(
            statuses,
            vec![("Pending", 2), ("Approved", 1), ("Denied", 1), ("Unknown", 1)]
        );

        let trend: Vec<_> = m
            .claims_trend
            .iter()
            .map(|p| (p.date.as_str(), p.claims))
            .collect();
        assert_eq!(
            trend,
            vec![
                ("06/04", 1),
                ("06/05", 0),
                ("06/06", 0),
                ("06/07", 0),
                ("06/08", 0),
                ("06/09", 1),
                ("06/10", 2),
            ]
        );

        assert_eq!(m.top_damage_types[0].damage_type, "Collision");
        assert_eq!(m.top_damage_types[0].count, 2);
        assert_eq!(m.top_damage_types.len(), 3);

        assert_eq!(m.top_adjusters[0].adjuster_name, "Sarah Chen");
        assert_eq!(m.top_adjusters[0].claims_count, 2);
        assert_eq!(m.top_adjusters[1].adjuster_name, "Michael Rodriguez");
        assert_eq!(m.top_adjusters[2].adjuster_name, "ADJ777");
    }
}
