use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use config::Config;
use flags::AlgorithmFlag;
use kanaja_protocol::{serialize_json, SearchRequest, StoreRequest};
use kanaja_vector_store::{
    HnswParams, DEFAULT_BREADTH, DEFAULT_EF_CONSTRUCTION, DEFAULT_MAX_NEIGHBORS,
};
use service::Service;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod flags;
mod http_api;
mod service;

#[derive(Parser)]
#[command(name = "kanaja")]
#[command(about = "Word-vector similarity search over short texts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Word-vector table (`word f1 ... fD` per line)
    #[arg(
        long,
        global = true,
        env = "KANAJA_WORD_VECTORS",
        default_value = "glove.6B.50d.txt"
    )]
    words: PathBuf,

    /// Persistence file; loaded at startup and rewritten after every store
    #[arg(long, global = true, env = "KANAJA_STORE")]
    store: Option<PathBuf>,

    /// Default explore-width for approximate search
    #[arg(long, global = true, env = "KANAJA_BREADTH", default_value_t = DEFAULT_BREADTH)]
    breadth: usize,

    /// Maximum links per node in the approximate index
    #[arg(long, global = true, env = "KANAJA_MAX_NEIGHBORS", default_value_t = DEFAULT_MAX_NEIGHBORS)]
    max_neighbors: usize,

    /// Frontier width used while building the approximate index
    #[arg(long, global = true, env = "KANAJA_EF_CONSTRUCTION", default_value_t = DEFAULT_EF_CONSTRUCTION)]
    ef_construction: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the store over HTTP (POST /store, POST /search, GET /health)
    Serve(ServeArgs),

    /// Embed a text and add it to the store
    Add(AddArgs),

    /// Search the store for texts similar to a query
    Search(SearchArgs),

    /// Print the number of stored vectors and their dimension
    Stats,
}

#[derive(Args)]
struct ServeArgs {
    /// Address to bind (default: 0.0.0.0:$PORT, PORT defaults to 8080)
    #[arg(long)]
    bind: Option<String>,
}

#[derive(Args)]
struct AddArgs {
    /// Text to embed and store
    text: String,
}

#[derive(Args)]
struct SearchArgs {
    /// Query text
    text: String,

    /// Number of results
    #[arg(short, long, default_value_t = 5, allow_negative_numbers = true)]
    k: i64,

    /// Search algorithm
    #[arg(short, long, value_enum, default_value_t = AlgorithmFlag::Exact)]
    algorithm: AlgorithmFlag,

    /// Explore-width for this query (approximate only)
    #[arg(long = "query-breadth")]
    query_breadth: Option<usize>,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Offline subcommands print JSON on stdout; keep the log noise down.
    if !matches!(cli.command, Commands::Serve(_)) && !cli.verbose {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = Config {
        words: cli.words,
        store: cli.store,
        default_breadth: cli.breadth,
        hnsw: HnswParams {
            max_neighbors: cli.max_neighbors,
            ef_construction: cli.ef_construction,
        },
    };

    match cli.command {
        Commands::Serve(args) => serve_http(args, config).await?,
        Commands::Add(args) => run_add(args, &config)?,
        Commands::Search(args) => run_search(args, &config)?,
        Commands::Stats => run_stats(&config)?,
    }

    Ok(())
}

async fn serve_http(args: ServeArgs, config: Config) -> Result<()> {
    let service = Arc::new(
        tokio::task::spawn_blocking(move || Service::open(&config))
            .await
            .context("Startup worker failed")??,
    );

    let bind = args.bind.unwrap_or_else(config::default_bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    let local_addr = listener.local_addr()?;
    log::info!(
        "Server listening on http://{local_addr} ({} vectors loaded)",
        service.health().vectors
    );

    let app = http_api::router(service.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Shutting down");
    let persisted = service.clone();
    tokio::task::spawn_blocking(move || persisted.persist())
        .await
        .context("Shutdown worker failed")?
        .context("Failed to save store on shutdown")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
}

fn run_add(args: AddArgs, config: &Config) -> Result<()> {
    if config.store.is_none() {
        log::warn!("No --store configured; the vector will not be persisted");
    }
    let service = Service::open(config)?;
    let response = service.store(&StoreRequest { text: args.text })?;
    print_json(&response)
}

fn run_search(args: SearchArgs, config: &Config) -> Result<()> {
    let service = Service::open(config)?;
    let response = service.search(&SearchRequest {
        text: args.text,
        k: args.k,
        algorithm: args.algorithm.as_str().to_string(),
        breadth: args.query_breadth,
    })?;
    print_json(&response)
}

fn run_stats(config: &Config) -> Result<()> {
    let service = Service::open(config)?;
    print_json(&service.health())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", serialize_json(value)?)?;
    Ok(())
}
