//! Skycast command line interface
//!
//! Two-day city forecasts corrected by a locally trained temperature
//! model. Every displayed forecast feeds the observation log; `train`
//! turns that log into a new model artifact.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use skycast_core::Config;

mod app;
mod render;

#[derive(Parser)]
#[command(name = "skycast")]
#[command(about = "Two-day forecasts with a locally trained temperature model")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the forecast for tomorrow and the day after
    Forecast {
        /// City name, for example "Lyon"
        city: String,
    },
    /// Retrain the temperature model from the observation log
    Train,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    skycast_core::init(cli.verbose);

    let (config, _) = Config::load_validated().context("Failed to load configuration")?;

    match cli.command {
        Commands::Forecast { city } => {
            let app = app::App::new(&config)?;
            match app.forecast(&city).await {
                Ok(view) => render::print_forecast(&view),
                Err(e) => {
                    tracing::info!("Forecast unavailable: {}", e);
                    println!("{}", e.user_message());
                }
            }
        }
        Commands::Train => {
            let outcome =
                skycast_model::train(&config.observation_log_path(), &config.models_dir())?;
            render::print_training_outcome(&outcome);
        }
    }

    Ok(())
}
