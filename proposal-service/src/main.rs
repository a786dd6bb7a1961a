use proposal_service::create_app;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured tracing based on environment variables.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "proposal_service=debug,proposal_flow=debug,tower_http=debug".into());

    match log_format.as_str() {
        "pretty" => {
            // Human-readable logging for development
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            // Structured JSON logging for production
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
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // The generation routines cannot run without a key; refusing to start
    // beats failing on the first drafting request.
    if std::env::var("OPENROUTER_API_KEY").is_err() {
        error!("OPENROUTER_API_KEY not set");
        eprintln!("Error: OPENROUTER_API_KEY environment variable is required");
        std::process::exit(1);
    }

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);

    let app = create_app().await;
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    let addr = listener.local_addr()?;

    info!("Proposal Drafting Service starting on {}", addr);
    info!("Health check endpoint: http://{}/health", addr);
    info!("Session endpoint: POST http://{}/proposal/sessions", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
