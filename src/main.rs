use clap::Parser;
use storefront_api::cli::Cli;
use storefront_api::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("storefront_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    if let Err(e) = storefront_api::cli::run(cli, config).await {
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }
}
