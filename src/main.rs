use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use appdb::{AppDbClient, Config};
use commands::{CollectionCommand, ConfigCommand, DocCommand, MirrorCommand, PermissionCommand};

#[derive(Parser)]
#[command(name = "appdb")]
#[command(version)]
#[command(about = "Command-line client for the AppDb document store", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read and write documents
    Doc(DocCommand),

    /// Manage collections and exports
    Collection(CollectionCommand),

    /// Manage collection permissions
    Permission(PermissionCommand),

    /// Manage the local offline mirror
    Mirror(MirrorCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "appdb=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Doc(cmd)) => {
            let client = AppDbClient::from_config(&config);
            cmd.run(&client).await?;
        }
        Some(Commands::Collection(cmd)) => {
            let client = AppDbClient::from_config(&config);
            cmd.run(&client).await?;
        }
        Some(Commands::Permission(cmd)) => {
            let client = AppDbClient::from_config(&config);
            cmd.run(&client).await?;
        }
        Some(Commands::Mirror(cmd)) => {
            let client = AppDbClient::from_config(&config);
            cmd.run(&client, &config.mirror_path.value).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
