mod config;
mod context;
mod dispatch;
mod domain;
mod error;
mod infra;
mod registry;
mod services;
mod surface;
mod web;
mod workflow;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::discord::DiscordApi;
use crate::registry::TicketStore;
use crate::services::{ChannelAdminService, MessagingService};

#[derive(Parser)]
#[command(name = "ticketd", author, version, about = "Support-ticket bot for the community server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot's webhook server.
    Run(RunArgs),
    /// Inspect the resolved configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Override the listening port from the environment.
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the stored configuration (secrets masked).
    Show,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ticketd=info")),
        )
        .init();

    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => match args.command {
            ConfigCommand::Show => config::show(),
        },
        Commands::Run(args) => run_server(args).await,
    }
}

async fn run_server(args: RunArgs) -> AppResult<()> {
    let mut config = AppConfig::load()?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let api = Arc::new(DiscordApi::new(&config));
    let channel_admin: Arc<dyn ChannelAdminService> = api.clone();
    let messaging: Arc<dyn MessagingService> = api;

    let context = AppContext::new(config, channel_admin, messaging, TicketStore::new());
    web::serve(context).await
}
