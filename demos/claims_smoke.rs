//! Smoke checks against a running claims portal backend.
//!
//! ```text
//! claims_smoke --base-url http://localhost:3001 all
//! claims_smoke status CLM-2025-123456
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "claims_smoke", version, about = "Smoke checks for the claims portal API")]
struct Args {
    #[arg(long, default_value = "http://localhost:3001")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// GET /health
    Health,
    /// Submit a sample claim
    Submit {
        #[arg(long, default_value = "Auto")]
        claim_type: String,
        #[arg(long, default_value = "15000")]
        estimated_loss: String,
    },
    /// List claims and report the source
    List,
    /// Fetch the status of one claim
    Status { claim_number: String },
    /// Update the status of one claim
    Update {
        claim_id: String,
        #[arg(long, default_value = "Under Review")]
        status: String,
    },
    /// Run every check in sequence
    All,
}

struct Smoke {
    client: Client,
    base_url: String,
    failures: usize,
}

impl Smoke {
    fn new(base_url: String) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            failures: 0,
        })
    }

    fn report(&mut self, name: &str, outcome: Result<String>) -> Option<String> {
        match outcome {
            Ok(detail) => {
                println!("PASS {name}: {detail}");
                Some(detail)
            }
            Err(e) => {
                println!("FAIL {name}: {e:#}");
                self.failures += 1;
                None
            }
        }
    }

    async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await.with_context(|| url.clone())?;
        let status = response.status();
        Ok((status, response.json().await.unwrap_or(Value::Null)))
    }

    async fn health(&self) -> Result<String> {
        let (status, body) = self.get("/health").await?;
        if status != StatusCode::OK {
            bail!("status {status}: {}", body["error"]);
        }
        Ok(format!("ords {} / database {}", body["ords"], body["database"]))
    }

    /// Returns `(claim_id, claim_number)` of the created claim.
    async fn submit(&self, claim_type: &str, estimated_loss: &str) -> Result<(String, String)> {
        let payload = json!({
            "claimType": claim_type,
            "claimSubtype": "Smoke Test",
            "incidentDate": "2025-01-15",
            "incidentDescription": "Submitted by claims_smoke",
            "location": "Bloomington, IL",
            "estimatedLoss": estimated_loss,
            "policyNumber": "POL-SMOKE-1",
            "customerName": "Smoke Tester",
            "customerEmail": "smoke@example.com"
        });
        let url = format!("{}/api/claims/submit", self.base_url);
        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        let body: Value = response.json().await?;
        if status != StatusCode::CREATED {
            bail!("status {status}: {}", body["message"]);
        }

        let field = |name: &str| {
            body[name]
                .as_str()
                .map(str::to_string)
                .with_context(|| format!("response has no {name}"))
        };
        Ok((field("claimId")?, field("claimNumber")?))
    }

    async fn list(&self) -> Result<String> {
        let (status, body) = self.get("/api/claims-chatbot").await?;
        if status != StatusCode::OK {
            bail!("status {status}: {}", body["message"]);
        }
        Ok(format!("{} claims from {}", body["count"], body["source"]))
    }

    async fn status(&self, claim_number: &str) -> Result<String> {
        let (status, body) = self
            .get(&format!("/api/claims/status/{claim_number}"))
            .await?;
        if status != StatusCode::OK {
            bail!("status {status}");
        }
        Ok(format!("{} assigned to {}", body["status"], body["assignedAdjuster"]))
    }

    async fn update(&self, claim_id: &str, new_status: &str) -> Result<String> {
        let url = format!("{}/api/claims/{claim_id}", self.base_url);
        let response = self
            .client
            .patch(&url)
            .json(&json!({ "status": new_status }))
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await?;
        if status != StatusCode::OK {
            bail!("status {status}: {}", body["message"]);
        }
        Ok(format!("{} row(s) affected", body["rowsAffected"]))
    }

    async fn all(&mut self) {
        let health = self.health().await;
        self.report("health", health);

        let submitted = self.submit("Auto", "15000").await;
        let ids = submitted.as_ref().ok().cloned();
        self.report("submit", submitted.map(|(id, number)| format!("{number} ({id})")));

        let list = self.list().await;
        self.report("list", list);

        if let Some((claim_id, claim_number)) = ids {
            let status = self.status(&claim_number).await;
            self.report("status", status);
            let update = self.update(&claim_id, "Under Review").await;
            self.report("update", update);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "claims_smoke=info".into()),
        )
        .init();

    let args = Args::parse();
    let mut smoke = Smoke::new(args.base_url)?;
    info!(base_url = %smoke.base_url, "Running smoke checks");

    match args.command {
        Command::Health => {
            let outcome = smoke.health().await;
            smoke.report("health", outcome);
        }
        Command::Submit {
            claim_type,
            estimated_loss,
        } => {
            let outcome = smoke
                .submit(&claim_type, &estimated_loss)
                .await
                .map(|(id, number)| format!("{number} ({id})"));
            smoke.report("submit", outcome);
        }
        Command::List => {
            let outcome = smoke.list().await;
            smoke.report("list", outcome);
        }
        Command::Status { claim_number } => {
            let outcome = smoke.status(&claim_number).await;
            smoke.report("status", outcome);
        }
        Command::Update { claim_id, status } => {
            let outcome = smoke.update(&claim_id, &status).await;
            smoke.report("update", outcome);
        }
        Command::All => smoke.all().await,
    }

    if smoke.failures > 0 {
        bail!("{} check(s) failed", smoke.failures);
    }
    Ok(())
}
