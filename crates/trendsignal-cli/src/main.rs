mod analyze;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trendsignal_analysis::OpenAiClient;

#[derive(Debug, Parser)]
#[command(name = "trendsignal")]
#[command(about = "Turn a YouTube homepage screenshot into a creator trend report")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full pipeline on a screenshot
    Analyze {
        /// Path to a PNG, JPEG, WebP or GIF screenshot
        image: PathBuf,
    },
    /// Extract video records from a screenshot
    Extract {
        /// Path to a PNG, JPEG, WebP or GIF screenshot
        image: PathBuf,
    },
    /// Group videos (output of `extract`) into trending topics
    Topics {
        /// JSON file holding `{"videos": [...]}` or a bare array
        videos: PathBuf,
    },
    /// Estimate how far along a topic is
    Strength {
        /// Topic name, e.g. "AI & Job Insecurity"
        topic: String,
        /// JSON file holding `{"videos": [...]}` or a bare array
        videos: PathBuf,
    },
    /// Generate posting advice and hooks for a topic
    Advice {
        /// Topic name, e.g. "AI & Job Insecurity"
        topic: String,
        /// EARLY, HEATING_UP or SATURATED (anything else is treated as HEATING_UP)
        #[arg(default_value = "HEATING_UP")]
        strength: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = trendsignal_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let client = OpenAiClient::from_config(&config)
        .map_err(|e| anyhow::anyhow!("cannot reach the model: {e}"))?;

    match cli.command {
        Commands::Analyze { image } => analyze::run_analyze(&client, &image).await,
        Commands::Extract { image } => analyze::run_extract(&client, &image).await,
        Commands::Topics { videos } => analyze::run_topics(&client, &videos).await,
        Commands::Strength { topic, videos } => {
            analyze::run_strength(&client, &topic, &videos).await
        }
        Commands::Advice { topic, strength } => {
            analyze::run_advice(&client, &topic, &strength).await
        }
    }
}
