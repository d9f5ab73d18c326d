//! certmeta-sync - certificate custom metadata sync between the CA and the CLM
//!
//! Runs one sync in the requested direction:
//! - `dctokf`: CA order data into CLM certificate metadata
//! - `kftodc`: CLM certificate metadata into CA order custom fields
//!
//! Secrets may come from the environment (or a `.env` file) instead of the
//! configuration file.

use std::path::PathBuf;
use std::time::Duration;

use certmeta_client::{CaClient, ClmClient, SyncEngine, SyncMode, SyncSummary};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod config;
mod error;

use config::{AppConfig, DEFAULT_CONFIG_PATH};
use error::{CliError, CliResult};

const DEFAULT_LOG_FILTER: &str = "info,certmeta_client=debug,certmeta_core=info";

/// Synchronize certificate custom metadata between the CA and the CLM
#[derive(Parser)]
#[command(name = "certmeta-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Sync direction: dctokf (CA to CLM) or kftodc (CLM to CA)
    mode: SyncMode,

    /// Configuration file
    #[arg(long, env = "CERTMETA_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Fields file, overrides paths.fields_file
    #[arg(long)]
    fields: Option<PathBuf>,

    /// Banned-character registry, overrides paths.banned_characters_file
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "info,certmeta_client=trace" (default: RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match run(cli).await {
        Ok(summary) => {
            println!("{summary}");
            std::process::exit(0);
        }
        Err((e, registry_path)) => {
            e.print(registry_path.as_deref());
            std::process::exit(e.exit_code());
        }
    }
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run one sync. On failure the registry path is returned with the error so
/// the banned-character hint can point at the right file.
async fn run(cli: Cli) -> Result<SyncSummary, (CliError, Option<PathBuf>)> {
    let config = load_config(&cli).map_err(|e| (e, None))?;
    let registry_path = config.paths.banned_characters_file.clone();
    sync(config, cli.mode)
        .await
        .map_err(|e| (e, Some(registry_path)))
}

fn load_config(cli: &Cli) -> CliResult<AppConfig> {
    let mut config = AppConfig::from_file(&cli.config)?;
    config.apply_env_overrides();
    if let Some(fields) = &cli.fields {
        config.paths.fields_file = fields.clone();
    }
    if let Some(registry) = &cli.registry {
        config.paths.banned_characters_file = registry.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn sync(config: AppConfig, mode: SyncMode) -> CliResult<SyncSummary> {
    let fields = config::load_fields_file(&config.paths.fields_file)?;

    tracing::info!(
        mode = %mode,
        ca_url = %config.ca.base_url,
        clm_url = %config.clm.base_url,
        fields_file = %config.paths.fields_file.display(),
        manual_fields = fields.manual_fields.len(),
        custom_fields = fields.custom_fields.len(),
        "starting certmeta-sync"
    );

    let ca = CaClient::new(
        &config.ca.base_url,
        &config.ca.api_key,
        Duration::from_secs(config.ca.timeout_secs),
        config.retry.clone(),
    )?;
    let clm = ClmClient::new(
        &config.clm.base_url,
        &config.clm.username,
        &config.clm.password,
        Duration::from_secs(config.clm.timeout_secs),
        config.retry,
    )?;

    let engine = SyncEngine::new(ca, clm, config.sync, fields, config.paths.banned_characters_file);
    Ok(engine.run(mode).await?)
}
