pub mod types;
pub mod config;
pub mod party;
pub mod data;
pub mod style;
pub mod legend;
pub mod map;
pub mod session;
pub mod render;
pub mod server;

use clap::{Parser, Subcommand};
use config::AppConfig;
use render::LeafletPage;
use session::MapSession;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const PAGE_TITLE: &str = "Electoral Districts";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the district map page
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Build the district map page and serve it
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

async fn build_map(app_config: &AppConfig) -> anyhow::Result<MapSession<LeafletPage>> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = app_config.input.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build()?;

    let mut session = MapSession::new(LeafletPage::new(PAGE_TITLE), &app_config.map);
    session.run(&client, &app_config.input).await;
    info!(
        "Map built with {} results and {} districts",
        session.results().len(),
        session.districts().map_or(0, |fc| fc.features.len())
    );
    session.surface().write_to(&app_config.output.dir)?;
    Ok(session)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config } => {
            info!("Generating map with config: {:?}", config);
            let app_config = AppConfig::load_or_default(config)?;
            let session = build_map(&app_config).await?;
            info!("Generation complete ({:?})", session.stage());
        }
        Commands::Serve { config } => {
            info!("Serving map with config: {:?}", config);
            let app_config = AppConfig::load_or_default(config)?;
            let session = build_map(&app_config).await?;

            let (_, results, districts) = session.into_parts();
            let state = server::AppState::new(districts.as_ref(), results);
            server::start_server(&app_config, state).await?;
        }
    }

    Ok(())
}
