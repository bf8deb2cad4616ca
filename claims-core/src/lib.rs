pub mod dashboard;
pub mod error;
pub mod fraud;
pub mod intake;
pub mod model;
pub mod normalize;
pub mod ords;
pub mod storage;
pub mod storage_postgres;

// Re-export commonly used types
pub use dashboard::DashboardMetrics;
pub use error::{ClaimsError, Result};
pub use fraud::{FraudInsight, FraudScorer, FraudThresholds, RiskLevel};
pub use intake::{ClaimIds, ClaimSubmission};
pub use model::{
    Adjuster, AdjusterRecord, ClaimRecord, ClaimUpdate, CustomerRecord, DamageRecord, NewClaim,
    Priority,
};
pub use normalize::{CustomerDirectory, FromOrds};
pub use ords::OrdsClient;
pub use storage::{ClaimStore, InMemoryClaimStore};
pub use storage_postgres::PostgresClaimStore;
