/// Version injected at compile time via SLO_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("SLO_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use slo_binding::api::list_all_service_level_objectives;
use slo_binding::aws::auth;
use slo_binding::aws::client::AwsClient;
use slo_binding::aws::http::format_api_error;
use slo_binding::config::{load_model, read_document, Config};
use slo_binding::error::ResourceError;
use slo_binding::resource::{
    service_level_objective_schema, sweep, ReadOutcome, ServiceLevelObjectiveModel,
    ServiceLevelObjectiveResource,
};
use slo_binding::state::StateStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Manage Application Signals service level objectives declaratively
#[derive(Parser, Debug)]
#[command(name = "slo", version = VERSION, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// AWS region to use
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Override the service endpoint (e.g. a local emulator)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Directory holding state files
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a configuration file against the schema
    Validate {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Create or update the SLO described by a configuration file
    Apply {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Refresh stored state from the service
    Refresh { name: String },
    /// Start managing an existing SLO
    Import { name: String },
    /// Delete an SLO and its state
    Destroy { name: String },
    /// List all SLOs in the region
    List,
    /// Delete every SLO whose name starts with a prefix
    Sweep {
        #[arg(long)]
        prefix: String,
    },
    /// Print the resource schema as JSON
    Schema,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: cannot open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("slo {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("slo-binding").join("slo.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".slo-binding").join("slo.log");
    }
    PathBuf::from("slo.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);
    let config = Config::load();

    run(&args, &config).await.map_err(|err| {
        tracing::error!("{:#}", err);
        err
    })
}

async fn run(args: &Args, config: &Config) -> Result<()> {
    match &args.command {
        Command::Validate { file } => validate(file),
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&service_level_objective_schema())?);
            Ok(())
        }
        Command::Apply { file } => {
            let plan = load_model(file)
                .with_context(|| format!("loading configuration {}", file.display()))?;
            let store = config.state_store(args.state_dir.as_deref());
            let resource = build_resource(args, config).await?;
            let state = apply(&resource, &store, &plan).await?;
            print_state(&state)
        }
        Command::Refresh { name } => {
            let store = config.state_store(args.state_dir.as_deref());
            let Some(state) = store.load(name)? else {
                bail!("no state stored for {}", name);
            };
            let resource = build_resource(args, config).await?;
            match resource.read(&state).await.map_err(describe)? {
                ReadOutcome::Found(current) => {
                    store.save(&current)?;
                    print_state(&current)
                }
                ReadOutcome::Removed(diag) => {
                    eprintln!("{}", diag);
                    store.remove(name)?;
                    Ok(())
                }
            }
        }
        Command::Import { name } => {
            let store = config.state_store(args.state_dir.as_deref());
            if store.load(name)?.is_some() {
                bail!("{} is already managed; refresh it instead", name);
            }
            let resource = build_resource(args, config).await?;
            let seed = resource.import_state(name)?;
            match resource.read(&seed).await.map_err(describe)? {
                ReadOutcome::Found(state) => {
                    store.save(&state)?;
                    print_state(&state)
                }
                ReadOutcome::Removed(diag) => bail!("cannot import {}: {}", name, diag.detail),
            }
        }
        Command::Destroy { name } => {
            let store = config.state_store(args.state_dir.as_deref());
            let state = store
                .load(name)?
                .unwrap_or_else(|| ServiceLevelObjectiveModel::new(name.as_str()));
            let resource = build_resource(args, config).await?;
            resource.delete(&state).await.map_err(describe)?;
            store.remove(name)?;
            println!("Destroyed {}", name);
            Ok(())
        }
        Command::List => {
            let resource = build_resource(args, config).await?;
            let summaries = list_all_service_level_objectives(resource.api())
                .await
                .map_err(|e| anyhow::anyhow!(format_api_error(&e)))
                .context("listing service level objectives")?;
            for summary in summaries {
                println!(
                    "{:<40} {:<14} {}",
                    summary.name,
                    summary.evaluation_type.as_deref().unwrap_or("-"),
                    summary.arn
                );
            }
            Ok(())
        }
        Command::Sweep { prefix } => {
            if prefix.is_empty() {
                bail!("refusing to sweep with an empty prefix");
            }
            let resource = build_resource(args, config).await?;
            let report = sweep(&resource, prefix)
                .await
                .map_err(|e| anyhow::anyhow!(format_api_error(&e)))
                .context("listing service level objectives")?;
            for name in &report.deleted {
                println!("Deleted {}", name);
            }
            for (name, message) in &report.failed {
                eprintln!("Failed {}: {}", name, message);
            }
            if !report.is_success() {
                bail!("{} service level objectives could not be swept", report.failed.len());
            }
            Ok(())
        }
    }
}

fn validate(file: &Path) -> Result<()> {
    let document = read_document(file)?;
    let diags = service_level_objective_schema().validate(&document);
    for diag in &diags {
        println!("{}", diag);
    }
    if slo_binding::resource::has_errors(&diags) {
        bail!("{} is invalid", file.display());
    }
    println!("{} is valid", file.display());
    Ok(())
}

/// Create when nothing is stored or the SLO vanished, otherwise update
async fn apply(
    resource: &ServiceLevelObjectiveResource,
    store: &StateStore,
    plan: &ServiceLevelObjectiveModel,
) -> Result<ServiceLevelObjectiveModel> {
    let state = match store.load(&plan.name)? {
        None => resource.create(plan).await.map_err(describe)?,
        Some(prior) => match resource.read(&prior).await.map_err(describe)? {
            ReadOutcome::Found(current) => {
                resource.update(plan, &current).await.map_err(describe)?
            }
            ReadOutcome::Removed(diag) => {
                eprintln!("{}", diag);
                resource.create(plan).await.map_err(describe)?
            }
        },
    };
    let path = store.save(&state)?;
    tracing::info!("State written to {:?}", path);
    Ok(state)
}

async fn build_resource(args: &Args, config: &Config) -> Result<ServiceLevelObjectiveResource> {
    let region = config.explicit_region(args.region.as_deref())?;
    let endpoint = config.effective_endpoint(args.endpoint.as_deref());
    let aws = auth::resolve(region)
        .await
        .context("resolving AWS credentials")?;
    let client = AwsClient::new(aws.credentials, &aws.region, endpoint.as_deref())?;
    tracing::debug!("Using {:?}", client);
    Ok(ServiceLevelObjectiveResource::new(Arc::new(client)))
}

/// Keep the lifecycle context, but show service errors the friendly way
fn describe(err: ResourceError) -> anyhow::Error {
    let friendly = match &err {
        ResourceError::Api { source, .. } => Some(format_api_error(source)),
        _ => None,
    };
    match friendly {
        Some(message) => anyhow::Error::new(err).context(message),
        None => anyhow::Error::new(err),
    }
}

fn print_state(state: &ServiceLevelObjectiveModel) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}
