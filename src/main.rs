use askdocs::Result;
use askdocs::commands::{build_index, serve_web, show_status};
use askdocs::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "askdocs")]
#[command(about = "Retrieval-augmented question answering over a local document collection")]
#[command(version)]
struct Cli {
    /// Base directory holding the settings file, documents folder, and index
    #[arg(long, default_value = ".", global = true)]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the vector index from the documents folder
    Build,
    /// Start the web form, fetching the prebuilt index if none is present
    Serve,
    /// Show the state of the local index
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.dir)
        .map_err(|e| askdocs::AskError::Config(format!("{:#}", e)))?;

    match cli.command {
        Commands::Build => {
            build_index(config).await?;
        }
        Commands::Serve => {
            serve_web(config).await?;
        }
        Commands::Status => {
            show_status(config).await?;
        }
    }

    Ok(())
}
