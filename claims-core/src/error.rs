use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClaimsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Duplicate claim identifier: {0}")]
    DuplicateClaim(String),

    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream error {status} from {endpoint}: {body}")]
    Upstream {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Fraud model not configured (FRAUD_MODEL_URL, FRAUD_MODEL_API_KEY)")]
    ScorerNotConfigured,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, ClaimsError>;
