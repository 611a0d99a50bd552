use anyhow::Result;
use clap::{Parser, Subcommand};
use spongebook_backend::cli;
use spongebook_backend::config::SpongebookConfig;
use spongebook_backend::node::SpongebookNode;
use spongebook_backend::telemetry;
use spongebook_backend::utils;

#[derive(Parser)]
#[command(author, version, about = "Spongebook social backend daemon and CLI")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (Axum) for REST/API access
    Serve,
    /// Start the interactive CLI for friend requests and posts
    Cli {
        /// Act as this user from the start
        #[arg(long = "as")]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::print_banner();
    telemetry::init_tracing();

    let args = Args::parse();

    let config = SpongebookConfig::from_env()?;
    let node = SpongebookNode::start(config)?;

    match args.command.unwrap_or(Command::Cli { user: None }) {
        Command::Serve => node.run_http_server().await,
        Command::Cli { user } => cli::run_cli(node.database(), user).await,
    }
}
