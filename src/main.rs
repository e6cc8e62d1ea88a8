use std::sync::Arc;

use anyhow::Context;
use chatform::api;
use chatform::config::ServiceConfig;
use chatform::service::IntakeService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServiceConfig::from_env().context("reading configuration")?;

    eprintln!("ChatForm API v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Chat model: {}", config.openai.model);
    match &config.perplexity {
        Some(perplexity) => eprintln!("   Web search: {}", perplexity.model),
        None => eprintln!("   Web search: disabled"),
    }
    eprintln!("   Distance limit: {} km", config.distance_limit_km);
    match &config.alignment_matrix_path {
        Some(path) => eprintln!("   Alignment matrix: {}", path.display()),
        None => eprintln!("   Alignment matrix: built-in"),
    }
    eprintln!("   CORS origins: {}", config.cors_origins.join(", "));
    eprintln!("   API: http://0.0.0.0:{}/api\n", config.port);

    let service = IntakeService::from_config(&config).context("building intake service")?;
    let app = api::router(Arc::new(service), &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("binding port {}", config.port))?;
    tracing::info!(port = config.port, "ChatForm API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
