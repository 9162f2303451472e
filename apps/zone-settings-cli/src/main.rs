//! `zone-settings` - manage zone setting overrides from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use zone_settings::domain::codec;
use zone_settings::infra::cloudflare::CloudflareGateway;
use zone_settings::infra::storage::{FileZoneRepository, ManagedZoneDocument};
use zone_settings::{Config, ManagedZone, NativeClient, Service, ZoneSettings, ZoneSettingsApi};

#[derive(Parser)]
#[command(name = "zone-settings")]
#[command(about = "Declarative zone settings overrides with baseline restore")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture the zone's baseline and apply the desired settings
    Manage {
        zone: String,
        /// YAML or JSON document of desired settings
        #[arg(long)]
        desired: PathBuf,
    },
    /// Replace the desired settings of a managed zone and apply them
    Update {
        zone: String,
        #[arg(long)]
        desired: PathBuf,
    },
    /// Re-read a managed zone and store what it reports
    Refresh { zone: String },
    /// Restore the baseline and stop managing the zone
    Release { zone: String },
    /// Stop managing the zone without touching it
    Forget { zone: String },
    /// Print the stored record of a managed zone
    Show { zone: String },
    /// List managed zones
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "Loaded configuration");

    let gateway = CloudflareGateway::new(&config.api).context("Failed to set up the API gateway")?;
    let repo = FileZoneRepository::new(config.state_dir.clone());
    let service = Arc::new(Service::new(Arc::new(gateway), Arc::new(repo)));
    let client = NativeClient::new(service);

    match cli.command {
        Command::Manage { zone, desired } => {
            let desired = load_desired(&desired)?;
            print_zone(&client.manage(&zone, desired).await?)?;
        }
        Command::Update { zone, desired } => {
            let desired = load_desired(&desired)?;
            print_zone(&client.update(&zone, desired).await?)?;
        }
        Command::Refresh { zone } => match client.refresh(&zone).await? {
            Some(managed) => print_zone(&managed)?,
            None => tracing::warn!(zone = %zone, "Zone no longer exists, dropped its record"),
        },
        Command::Release { zone } => {
            client.release(&zone).await?;
            tracing::info!(zone = %zone, "Released zone");
        }
        Command::Forget { zone } => {
            if !client.forget(&zone).await? {
                tracing::warn!(zone = %zone, "Zone was not managed");
            }
        }
        Command::Show { zone } => print_zone(&client.get(&zone).await?)?,
        Command::List => {
            let docs: Vec<ManagedZoneDocument> = client
                .list()
                .await?
                .iter()
                .map(ManagedZoneDocument::from)
                .collect();
            println!("{}", serde_json::to_string_pretty(&docs)?);
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_desired(path: &Path) -> Result<ZoneSettings> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document: Value = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?
    };
    Ok(codec::parse_desired(&document)?)
}

fn print_zone(zone: &ManagedZone) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&ManagedZoneDocument::from(zone))?);
    Ok(())
}
