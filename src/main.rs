use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use voice_agent::{create_router, AppState, Config, Services};

#[derive(Debug, Parser)]
#[command(name = "voice-agent", about = "Half-duplex voice assistant server")]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/voice-agent")]
    config: String,

    /// Override the configured HTTP port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("Loaded config: {}", cfg.service.name);
    info!("Default client sample rate: {}Hz", cfg.audio.default_sample_rate);
    info!("Serving frontend from {}", cfg.service.static_dir);

    let services = Services::from_config(&cfg)?;
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let app = create_router(AppState::new(cfg, services));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
