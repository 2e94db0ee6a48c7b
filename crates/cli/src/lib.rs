use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use config::FileConfig;
use flags::EdgeModeFlag;
use http_api::HttpState;
use psgc_graph::SnapshotFile;
use psgc_importer::{ImportOptions, ImportStats, Importer};
use psgc_protocol::{serialize_json, serialize_json_pretty, ApiResponse, ResponseMeta};
use serde::Serialize;
use service::{PsgcService, ServiceError};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

mod cache;
mod config;
mod flags;
mod http_api;
mod server_security;
mod service;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "psgc")]
#[command(about = "Philippine Standard Geographic Code hierarchy graph", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,

    /// TOML config file with snapshot, bind, batch_size, hierarchy_cache_size, edge_mode
    #[arg(long, global = true, env = "PSGC_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import PSGC records (JSON array or JSON Lines) into the graph snapshot
    Import(ImportArgs),

    /// Print the root-to-node hierarchy path for a PSGC code
    Hierarchy(LookupArgs),

    /// Print a node with its direct parents, children and hierarchy path
    Node(LookupArgs),

    /// Serve the read API over HTTP
    ServeHttp(ServeArgs),
}

#[derive(Args)]
struct ImportArgs {
    /// Cleaned PSGC records produced by the publication pre-processor
    input: PathBuf,

    /// Graph snapshot to extend (or replace with --clear)
    #[arg(long, env = "PSGC_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Start from an empty graph instead of extending the snapshot
    #[arg(long)]
    clear: bool,

    /// Entities per store write
    #[arg(long)]
    batch_size: Option<usize>,

    /// How relationship passes treat existing edges
    #[arg(long, value_enum)]
    edge_mode: Option<EdgeModeFlag>,

    /// Print import statistics as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct LookupArgs {
    /// 10-digit PSGC code (9 digits accepted for regions 01-09)
    code: String,

    /// Graph snapshot to read
    #[arg(long, env = "PSGC_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Pretty-print JSON response
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address (default 127.0.0.1:7710)
    #[arg(long)]
    bind: Option<String>,

    /// Allow binding to non-loopback addresses (requires --auth-token)
    #[arg(long)]
    public: bool,

    /// Require Authorization: Bearer <token> on all requests
    #[arg(long, env = "PSGC_AUTH_TOKEN")]
    auth_token: Option<String>,

    /// Graph snapshot to serve
    #[arg(long, env = "PSGC_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Hierarchy cache entries (0 disables)
    #[arg(long)]
    cache_size: Option<usize>,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Lookups print JSON and import --json must stay parseable.
    let json_output = match &cli.command {
        Commands::Import(args) => args.json,
        Commands::Hierarchy(_) | Commands::Node(_) => true,
        Commands::ServeHttp(_) => false,
    };
    if json_output {
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

    let config = FileConfig::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Import(args) => run_import(args, &config).await?,
        Commands::Hierarchy(args) => {
            run_lookup(args, &config, |service, code| {
                let resolved = service.hierarchy(code)?;
                Ok((resolved.path, Some(resolved.cached)))
            })
            .await?
        }
        Commands::Node(args) => {
            run_lookup(args, &config, |service, code| Ok((service.node(code)?, None))).await?
        }
        Commands::ServeHttp(args) => serve_http(args, &config).await?,
    }

    Ok(())
}

async fn run_import(args: ImportArgs, config: &FileConfig) -> Result<()> {
    let snapshot = SnapshotFile::new(config.snapshot(args.snapshot));
    let options = ImportOptions {
        batch_size: config.batch_size(args.batch_size),
        clear: args.clear,
        edge_mode: config.edge_mode(args.edge_mode.map(EdgeModeFlag::as_domain)),
    };
    let importer = Importer::new(options)?;
    let stats = importer
        .import_file(&args.input, &snapshot)
        .await
        .with_context(|| format!("Import of {} failed", args.input.display()))?;

    if args.json {
        print_stdout(&serialize_json(&stats)?)?;
    } else {
        print_stdout(&render_import_stats(&stats, &snapshot))?;
    }
    Ok(())
}

fn render_import_stats(stats: &ImportStats, snapshot: &SnapshotFile) -> String {
    let mut lines = vec![format!(
        "Imported {} of {} records into {} ({} ms)",
        stats.total_inserted(),
        stats.records,
        snapshot.path().display(),
        stats.time_ms
    )];
    for (kind, count) in &stats.inserted {
        lines.push(format!("  {kind}: {count}"));
    }
    for pass in &stats.relationships {
        lines.push(format!(
            "  {} ({} -> {}): {} edges",
            pass.relationship, pass.parent, pass.child, pass.created
        ));
    }
    if stats.duplicates > 0 {
        lines.push(format!("  duplicates: {}", stats.duplicates));
    }
    if stats.skipped > 0 {
        lines.push(format!("  skipped: {}", stats.skipped));
        for skip in &stats.skipped_records {
            lines.push(format!(
                "    #{} {}: {}",
                skip.index,
                skip.code.as_deref().unwrap_or("-"),
                skip.reason
            ));
        }
    }
    lines.join("\n")
}

/// Run one read operation against the snapshot and print the envelope.
/// Error envelopes are printed too, then the process exits non-zero.
async fn run_lookup<T, F>(args: LookupArgs, config: &FileConfig, op: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&PsgcService, &str) -> std::result::Result<(T, Option<bool>), ServiceError>,
{
    let started = Instant::now();
    let snapshot = SnapshotFile::new(config.snapshot(args.snapshot));
    let outcome = match snapshot.load().await {
        Ok(graph) => op(&PsgcService::new(graph, 0), &args.code),
        Err(err) => Err(ServiceError::from(err)),
    };
    let meta = |cached| ResponseMeta {
        duration_ms: Some(started.elapsed().as_millis() as u64),
        cached,
    };

    let response = match outcome {
        Ok((data, cached)) => ApiResponse::ok(&data)?.with_meta(meta(cached)),
        Err(err) => ApiResponse::error(err.envelope()).with_meta(meta(None)),
    };
    let text = if args.pretty {
        serialize_json_pretty(&response)?
    } else {
        serialize_json(&response)?
    };
    print_stdout(&text)?;

    if !response.is_ok() {
        std::process::exit(1);
    }
    Ok(())
}

async fn serve_http(args: ServeArgs, config: &FileConfig) -> Result<()> {
    let bind = config.bind(args.bind);
    let addrs = server_security::resolve_guarded_bind_addrs(&bind, args.public).await?;
    let auth_token = server_security::AuthToken::parse(args.auth_token.as_deref())?;
    if args.public && auth_token.is_none() {
        anyhow::bail!(
            "--public requires an auth token: set --auth-token or export {}",
            server_security::AUTH_TOKEN_ENV
        );
    }

    let snapshot = SnapshotFile::new(config.snapshot(args.snapshot));
    let graph = snapshot
        .load()
        .await
        .context("Cannot serve without a graph snapshot; run `psgc import` first")?;
    log::info!(
        "Loaded {} entities and {} edges from {}",
        graph.node_count(),
        graph.edge_count(),
        snapshot.path().display()
    );

    let state = Arc::new(HttpState {
        service: PsgcService::new(graph, config.hierarchy_cache_size(args.cache_size)),
        auth_token,
    });
    let auth_enabled = state.auth_token.is_some();
    let app = http_api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");

    print_stdout(&format!("Serving PSGC API: {base_url}"))?;
    for route in http_api::ROUTES {
        print_stdout(&format!("  GET {route}"))?;
    }
    if auth_enabled {
        print_stdout(&format!(
            "Auth enabled: add header 'Authorization: Bearer ${}'",
            server_security::AUTH_TOKEN_ENV
        ))?;
    }
    if args.public {
        let addrs = addrs
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        print_stdout(&format!(
            "Public bind enabled (--public). Resolved addresses: {addrs}"
        ))?;
    }

    print_stdout(&format!("Try: curl {base_url}/hierarchy/0301401007"))?;
    axum::serve(listener, app).await?;
    Ok(())
}
