use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use netbox_client::{Backend, Settings};
use netbox_protocol::{codes, ErrorEnvelope};
use netbox_topology::{path_mermaid, tree_mermaid, TraceError, Tracer};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "netbox-trace")]
#[command(about = "Trace physical cable paths through NetBox", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (TOML); overrides NETBOX_MCP_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Offline inventory snapshot (JSON); overrides NETBOX_INVENTORY and the live API
    #[arg(long, global = true)]
    inventory: Option<PathBuf>,

    /// Trace timeout in milliseconds (0 disables it)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Shortest cable path between two devices
    Devices(DevicesArgs),
    /// Everything reachable from one interface
    Interface(InterfaceArgs),
    /// One cable by id
    Cable(CableArgs),
}

#[derive(Args)]
struct DevicesArgs {
    source: String,
    target: String,

    /// Cable levels explored from each side
    #[arg(long)]
    max_depth: Option<usize>,

    /// Continue through intermediate endpoint devices
    #[arg(long)]
    via_devices: bool,

    /// Paths to return (shortest first)
    #[arg(long, default_value_t = 1)]
    max_results: usize,
}

#[derive(Args)]
struct InterfaceArgs {
    device: String,
    interface: String,

    /// Depth budget (cable hops plus panel pass-throughs)
    #[arg(long)]
    max_depth: Option<usize>,
}

#[derive(Args)]
struct CableArgs {
    cable_id: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// `{"status": "ok", "result": ...}` on stdout
    Json,
    /// Mermaid flowchart only (traces)
    Mermaid,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Response<T: Serialize> {
    Ok { result: T },
    Error { error: ErrorEnvelope },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(path) = &cli.inventory {
        settings.inventory = Some(path.clone());
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        settings.trace.timeout_ms = timeout_ms;
    }
    let backend = Backend::from_settings(&settings).context("Failed to initialise backend")?;
    log::debug!("netbox-trace using {} backend", backend.kind.as_str());
    if let Some(reference) = &backend.reference {
        if let Err(err) = reference.refresh().await {
            log::warn!("reference data unavailable, using role policy only: {err}");
        }
    }
    let tracer = backend.tracer(&settings);

    match cli.command {
        Commands::Devices(args) => run_devices(&tracer, args, cli.format).await,
        Commands::Interface(args) => run_interface(&tracer, args, cli.format).await,
        Commands::Cable(args) => run_cable(&tracer, args).await,
    }
}

async fn run_devices(tracer: &Tracer, args: DevicesArgs, format: OutputFormat) -> Result<ExitCode> {
    let trace = tracer
        .trace_devices_paths(
            &args.source,
            &args.target,
            args.max_depth,
            args.via_devices,
            args.max_results,
        )
        .await;
    match (trace, format) {
        (Ok(trace), OutputFormat::Mermaid) => {
            println!("{}", path_mermaid(&trace));
            Ok(ExitCode::SUCCESS)
        }
        (Ok(trace), OutputFormat::Json) => {
            let mermaid = path_mermaid(&trace);
            let mut result = serde_json::to_value(&trace)?;
            result["mermaid"] = json!(mermaid);
            emit(Response::Ok { result })
        }
        (Err(err), _) => emit_error(&err),
    }
}

async fn run_interface(
    tracer: &Tracer,
    args: InterfaceArgs,
    format: OutputFormat,
) -> Result<ExitCode> {
    let tree = tracer
        .trace_from_interface(&args.device, &args.interface, args.max_depth)
        .await;
    match (tree, format) {
        (Ok(tree), OutputFormat::Mermaid) => {
            println!("{}", tree_mermaid(&tree));
            Ok(ExitCode::SUCCESS)
        }
        (Ok(tree), OutputFormat::Json) => {
            let mermaid = tree_mermaid(&tree);
            let mut result = serde_json::to_value(&tree)?;
            result["mermaid"] = json!(mermaid);
            emit(Response::Ok { result })
        }
        (Err(err), _) => emit_error(&err),
    }
}

async fn run_cable(tracer: &Tracer, args: CableArgs) -> Result<ExitCode> {
    match tracer.cable(args.cable_id).await {
        Ok(cable) => emit(Response::Ok { result: cable }),
        Err(err) => emit_error(&err),
    }
}

fn emit<T: Serialize>(response: Response<T>) -> Result<ExitCode> {
    let failed = matches!(response, Response::Error { .. });
    println!(
        "{}",
        serde_json::to_string_pretty(&response).context("Failed to serialize response")?
    );
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn emit_error(err: &TraceError) -> Result<ExitCode> {
    let mut envelope = ErrorEnvelope::new(err.code(), err.to_string());
    if err.code() == codes::BACKEND_UNAVAILABLE {
        envelope = envelope.with_hint(
            "Set NETBOX_URL and NETBOX_API_TOKEN, or pass --inventory with a snapshot",
        );
    }
    emit::<()>(Response::Error { error: envelope })
}
