use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use printpoka_offline::domain::entities::{OfflineActionDraft, Request};
use printpoka_offline::domain::value_objects::{
    OfflineActionKind, OfflineActionVerb, OfflinePayload, ReplayPolicy,
};
use printpoka_offline::{init_logging, AppConfig, AppState, ConnectivityEvent, FetchDisposition};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "printpoka-offline")]
#[command(about = "PrintPoka offline queue and cache router", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Site origin used to resolve relative URLs
    #[arg(long, env = "PRINTPOKA_ORIGIN")]
    origin: Option<String>,

    /// SQLite URL of the offline action store
    #[arg(long, env = "PRINTPOKA_DATABASE_URL")]
    database_url: Option<String>,

    /// Replay policy (clear-all, retain-failed)
    #[arg(long, env = "PRINTPOKA_REPLAY_POLICY")]
    replay_policy: Option<ReplayPolicy>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show connectivity and pending action count
    Status,
    /// Submit a cart / wishlist / order mutation
    Enqueue {
        #[arg(long)]
        kind: OfflineActionKind,
        #[arg(long)]
        verb: OfflineActionVerb,
        /// JSON payload, e.g. '{"productId":7,"size":"M","quantity":1}'
        #[arg(long)]
        data: String,
        /// Treat the client as offline so the action is persisted
        #[arg(long)]
        offline: bool,
    },
    /// Replay every pending action as if connectivity came back
    Replay,
    /// Install and activate the worker, then route each URL through it
    Fetch {
        urls: Vec<String>,
        /// Mark requests as top-level navigations
        #[arg(long)]
        navigate: bool,
        /// Mark requests as images
        #[arg(long, conflicts_with = "navigate")]
        image: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut config = AppConfig::from_env();
    if let Some(origin) = cli.origin {
        config.network.origin = origin;
    }
    if let Some(url) = cli.database_url {
        config.storage.database_url = Some(url);
    }
    if let Some(policy) = cli.replay_policy {
        config.queue.replay_policy = policy;
    }

    info!("Starting printpoka-offline v{}", env!("CARGO_PKG_VERSION"));
    let state = AppState::new(config)
        .await
        .context("failed to initialize application state")?;

    match cli.command {
        Commands::Status => run_status(&state).await?,
        Commands::Enqueue {
            kind,
            verb,
            data,
            offline,
        } => run_enqueue(&state, kind, verb, &data, offline).await?,
        Commands::Replay => run_replay(&state).await?,
        Commands::Fetch {
            urls,
            navigate,
            image,
        } => run_fetch(&state, urls, navigate, image).await?,
    }

    Ok(())
}

async fn run_status(state: &AppState) -> Result<()> {
    let status = state.queue.status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);
    for action in state.queue.pending_actions().await {
        println!("{}", serde_json::to_string(&action)?);
    }
    Ok(())
}

async fn run_enqueue(
    state: &AppState,
    kind: OfflineActionKind,
    verb: OfflineActionVerb,
    data: &str,
    offline: bool,
) -> Result<()> {
    let payload = OfflinePayload::from_json_str(data).map_err(anyhow::Error::msg)?;
    if offline {
        state.observer.handle(ConnectivityEvent::Offline).await;
    }

    let outcome = state
        .queue
        .enqueue(OfflineActionDraft::new(kind, verb, payload))
        .await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn run_replay(state: &AppState) -> Result<()> {
    let report = state
        .observer
        .handle(ConnectivityEvent::Online)
        .await
        .unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(&report)?);
    println!("{}", serde_json::to_string_pretty(&state.queue.metrics())?);
    Ok(())
}

async fn run_fetch(state: &AppState, urls: Vec<String>, navigate: bool, image: bool) -> Result<()> {
    match state.router.start().await {
        Ok(deleted) => info!(deleted = deleted.len(), "Worker activated"),
        Err(e) => warn!("Worker did not activate, requests will pass through: {}", e),
    }

    for url in urls {
        let request = if navigate {
            Request::navigate(url.as_str())
        } else if image {
            Request::image(url.as_str())
        } else {
            Request::get(url.as_str())
        };

        match state.router.fetch(&request).await {
            FetchDisposition::PassThrough => println!("{url}\tpass-through"),
            FetchDisposition::Respond {
                response,
                source,
                class,
            } => println!(
                "{url}\t{class}\t{source:?}\t{} {}\t{} bytes",
                response.status,
                response.status_text,
                response.body_len()
            ),
        }
    }
    Ok(())
}
