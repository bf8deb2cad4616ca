use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use std::sync::Arc;

use crate::{
    error::{ClaimsError, Result},
    model::{ClaimRecord, ClaimUpdate, CustomerRecord, NewClaim},
};

/// Trait for persisting and querying claims
#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Insert one claim. Identifier clashes report [`ClaimsError::DuplicateClaim`].
    async fn insert(&self, claim: &NewClaim) -> Result<()>;

    /// All claims with customer identity attached where known, ordered by claim id.
    async fn list_with_customers(&self) -> Result<Vec<ClaimRecord>>;

    /// Apply a partial update and return the number of rows affected.
    async fn update(&self, claim_id: &str, update: &ClaimUpdate) -> Result<u64>;

    async fn ping(&self) -> Result<()>;
}

/// In-memory implementation of ClaimStore
#[derive(Default)]
pub struct InMemoryClaimStore {
    claims: Arc<DashMap<String, ClaimRecord>>,
    claim_numbers: Arc<DashMap<String, String>>,
    customers: Arc<DashMap<String, CustomerRecord>>,
}

impl InMemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_customer(&self, customer: CustomerRecord) {
        if let Some(id) = customer.customer_id.clone() {
            self.customers.insert(id, customer);
        }
    }

    /// Seeds an existing claim row, bypassing intake.
    pub fn add_claim(&self, claim: ClaimRecord) {
        if let Some(id) = claim.claim_id.clone() {
            if let Some(number) = claim.claim_number.clone() {
                self.claim_numbers.insert(number, id.clone());
            }
            self.claims.insert(id, claim);
        }
    }

    fn with_customer(&self, mut claim: ClaimRecord) -> ClaimRecord {
        let customer = claim
            .customer_id
            .as_deref()
            .and_then(|id| self.customers.get(id));
        if let Some(customer) = customer {
            let name = customer.full_name();
            claim.customer_name = (!name.is_empty()).then_some(name);
            claim.customer_email = customer.email.clone();
            claim.customer_phone = customer.phone.clone();
        }
        claim
    }
}

#[async_trait]
impl ClaimStore for InMemoryClaimStore {
    async fn insert(&self, claim: &NewClaim) -> Result<()> {
        // Numbers are reserved before the id slot is taken.
        match self.claim_numbers.entry(claim.claim_number.clone()) {
            Entry::Occupied(_) => {
                return Err(ClaimsError::DuplicateClaim(claim.claim_number.clone()));
            }
            Entry::Vacant(slot) => {
                slot.insert(claim.claim_id.clone());
            }
        }

        match self.claims.entry(claim.claim_id.clone()) {
            Entry::Occupied(_) => {
                self.claim_numbers.remove(&claim.claim_number);
                Err(ClaimsError::DuplicateClaim(claim.claim_id.clone()))
            }
            Entry::Vacant(slot) => {
                slot.insert(ClaimRecord::from_new_claim(claim));
                Ok(())
            }
        }
    }

    async fn list_with_customers(&self) -> Result<Vec<ClaimRecord>> {
        let mut claims: Vec<ClaimRecord> = self
            .claims
            .iter()
            .map(|entry| self.with_customer(entry.value().clone()))
            .collect();
        claims.sort_by(|a, b| a.claim_id.cmp(&b.claim_id));
        Ok(claims)
    }

    async fn update(&self, claim_id: &str, update: &ClaimUpdate) -> Result<u64> {
        let Some(mut claim) = self.claims.get_mut(claim_id) else {
            return Ok(0);
        };

        let now = Utc::now();
        if let Some(status) = update.new_status() {
            claim.status = Some(status.to_string());
        }
        if let Some(adjuster) = update.new_adjuster() {
            claim.assigned_adjuster_id = adjuster.map(str::to_string);
            claim.assigned_date = Some(now);
        }
        claim.updated_at = Some(now);
        Ok(1)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
