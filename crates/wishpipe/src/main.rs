use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use wishpipe::server::{self, AppState};
use wishpipe_core::pipeline::{self, ExtractOptions};
use wishpipe_core::ExtractionRequest;
use wishpipe_local::auth::UserinfoValidator;
use wishpipe_local::HttpFetcher;

#[derive(Parser, Debug)]
#[command(name = "wishpipe")]
#[command(about = "Product-metadata extraction for wishlist entries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API (`GET /api/scrape?url=...`).
    Serve(ServeCmd),
    /// Scrape a single URL and print the record as JSON.
    Scrape(ScrapeCmd),
}

#[derive(clap::Args, Debug)]
struct ServeCmd {
    /// Address to listen on.
    #[arg(long, env = "WISHPIPE_BIND", default_value = "127.0.0.1:8787")]
    bind: SocketAddr,
    /// Budget for each upstream fetch, in milliseconds.
    #[arg(long, env = "WISHPIPE_TIMEOUT_MS", default_value_t = 10_000)]
    timeout_ms: u64,
    /// Hard cap on bytes read from an upstream response body.
    #[arg(long, env = "WISHPIPE_MAX_BYTES", default_value_t = 5_000_000)]
    max_bytes: usize,
    /// Identity provider userinfo endpoint for bearer-token validation.
    /// Without it the API serves unauthenticated.
    #[arg(long, env = "WISHPIPE_AUTH_ENDPOINT")]
    auth_endpoint: Option<String>,
    /// Skip the SSRF guard. Only for tests and private dev fixtures.
    #[arg(long, env = "WISHPIPE_ALLOW_UNSAFE_TARGETS", default_value_t = false)]
    allow_unsafe_targets: bool,
}

#[derive(clap::Args, Debug)]
struct ScrapeCmd {
    /// Product page URL.
    #[arg(long)]
    url: String,
    /// Budget for each upstream fetch, in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,
    /// Hard cap on bytes read from an upstream response body.
    #[arg(long, default_value_t = 5_000_000)]
    max_bytes: usize,
    /// Skip the SSRF guard. Only for tests and private dev fixtures.
    #[arg(long, default_value_t = false)]
    allow_unsafe_targets: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Scrape(args) => run_scrape(args).await,
    }
}

async fn run_serve(args: ServeCmd) -> Result<()> {
    let fetcher = Arc::new(HttpFetcher::new()?.with_max_bytes(args.max_bytes));

    let validator: Option<Arc<dyn wishpipe_core::TokenValidator>> = match args
        .auth_endpoint
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
    {
        Some(endpoint) => Some(Arc::new(UserinfoValidator::new(endpoint)?)),
        None => {
            tracing::warn!("no auth endpoint configured; /api/scrape serves unauthenticated");
            None
        }
    };

    if args.allow_unsafe_targets {
        tracing::warn!("SSRF guard disabled (--allow-unsafe-targets)");
    }

    let state = Arc::new(AppState {
        fetcher: fetcher.clone(),
        pages: fetcher,
        validator,
        options: ExtractOptions {
            timeout: Duration::from_millis(args.timeout_ms),
            allow_unsafe_targets: args.allow_unsafe_targets,
        },
    });

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    server::serve(state, listener).await?;
    Ok(())
}

async fn run_scrape(args: ScrapeCmd) -> Result<()> {
    let fetcher = HttpFetcher::new()?.with_max_bytes(args.max_bytes);
    let opts = ExtractOptions {
        timeout: Duration::from_millis(args.timeout_ms),
        allow_unsafe_targets: args.allow_unsafe_targets,
    };
    let req = ExtractionRequest { url: args.url };
    let record = pipeline::extract(&req, &fetcher, &fetcher, &opts).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
