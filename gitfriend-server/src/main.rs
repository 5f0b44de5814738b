use clap::Parser;
use gitfriend_core::{GitFriendConfig, GitHubClient, GroqClient, TrendingClient};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use gitfriend_server::http::{self, HttpState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "gitfriend.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience; production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match GitFriendConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG overrides the configured level
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level)),
        )
        .init();

    // Connect to DB
    let pool = match gitfriend_core::db::create_pool(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match gitfriend_core::db::health_check(&pool).await {
            Ok(v) => println!("✅ PostgreSQL connected: {}", v),
            Err(e) => {
                println!("❌ PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        }

        println!("✅ Git Friend DB health check passed");
        return Ok(());
    }

    if let Err(e) = gitfriend_core::store::init_schema(&pool).await {
        eprintln!("Failed to initialize database schema: {}", e);
        std::process::exit(1);
    }

    // Outbound clients. Missing credentials fail here, not on first request.
    let github = match GitHubClient::from_config(&config.github) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create GitHub client (set GITHUB_TOKEN): {}", e);
            std::process::exit(1);
        }
    };

    let oracle = match GroqClient::from_config(&config.oracle) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create Groq client (set GROQ_API_KEY): {}", e);
            std::process::exit(1);
        }
    };

    let trending = match TrendingClient::new(&config.trending) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create trending client: {}", e);
            std::process::exit(1);
        }
    };

    // Shutdown signal
    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    let state = HttpState {
        pool: pool.clone(),
        config,
        github,
        oracle,
        trending,
    };

    http::start_http_server(state, tx.subscribe()).await?;

    pool.close().await;

    Ok(())
}
