//! policyQA server
//!
//! Question answering over PDF policy documents: extract, chunk, embed,
//! rank by cosine similarity, and answer through a remote LLM with a
//! rule-based fallback.
//!
//! Two modes share one binary:
//! - one-shot: `--policy <path-or-url> --query <text>` prints the decision
//!   JSON to stdout (logs stay on stderr)
//! - API: `--api --port <n>` serves the HTTP endpoints

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::{CommandFactory, Parser};
use policyqa_core::{DocumentSource, RagConfig, RagPipeline};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
mod state;
#[cfg(test)]
mod tests;

use api::{handle_health, handle_query, handle_run, handle_stats};
use state::{AppState, DEFAULT_CACHE_CAPACITY};

/// Command-line arguments for the policyQA server
#[derive(Parser, Debug)]
#[command(name = "policyqa-server")]
#[command(about = "Policy document Q&A over a retrieval pipeline")]
struct Args {
    /// Path or URL of the policy PDF (one-shot mode)
    #[arg(long)]
    policy: Option<String>,

    /// Natural-language query (one-shot mode)
    #[arg(long)]
    query: Option<String>,

    /// Run as an HTTP API
    #[arg(long)]
    api: bool,

    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// API key for the remote reasoning service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_key: Option<String>,

    /// Retrieval depth override
    #[arg(long)]
    top_k: Option<usize>,

    /// Number of document indexes kept in memory
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // Logs go to stderr so one-shot mode keeps stdout clean for JSON
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = RagConfig::from_env()?;
    if let Some(key) = &args.openai_key {
        config = config.with_api_key(key);
    }
    if let Some(top_k) = args.top_k {
        config = config.with_top_k(top_k);
    }
    config.validate()?;

    if args.api {
        serve(args, config).await
    } else if let (Some(policy), Some(query)) = (&args.policy, &args.query) {
        run_once(policy, query, config).await
    } else {
        Args::command().print_help()?;
        std::process::exit(2);
    }
}

/// One-shot mode: process the document, answer, print JSON to stdout.
async fn run_once(policy: &str, query: &str, config: RagConfig) -> anyhow::Result<()> {
    let pipeline = RagPipeline::new(config)?;

    let outcome = async {
        let source = DocumentSource::parse(policy)?;
        let index = pipeline.process_document(&source).await?;
        pipeline.query(&index, query, None).await
    }
    .await;

    match outcome {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(err) => {
            let body = serde_json::json!({
                "success": false,
                "error": err.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            std::process::exit(1);
        }
    }
}

/// API mode: build shared state and serve the router.
async fn serve(args: Args, config: RagConfig) -> anyhow::Result<()> {
    info!("initializing pipeline");
    let pipeline = RagPipeline::new(config)?;
    let state = Arc::new(AppState::new(pipeline, args.cache_capacity));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/query", post(handle_query))
        .route("/api/v1/hackrx/run", post(handle_run))
        .route("/stats", get(handle_stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
