use claims_portal_service::{Settings, create_app};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured JSON tracing based on environment variables
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "claims_portal_service=debug,claims_core=debug,tower_http=debug".into()
    });

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = Settings::from_env();
    tokio::fs::create_dir_all(&settings.upload_dir).await?;
    let port = settings.port;
    let upload_dir = settings.upload_dir.display().to_string();
    let ords_base_url = settings.ords_base_url.clone();

    let app = create_app(settings)?;
    let listener = TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    let addr = listener.local_addr()?;

    info!(%addr, ords = %ords_base_url, upload_dir = %upload_dir, "Claims portal backend listening");
    info!("Health check endpoint: http://{}/health", addr);
    info!("Submission endpoint: POST http://{}/api/claims/submit", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
