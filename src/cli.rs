use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "relaybox")]
#[command(about = "Telegram bot that downloads links and uploads them back to the chat", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bot and the health endpoint
    Run(ConfigArgs),
    /// Load and validate configuration, then print it
    CheckConfig(ConfigArgs),
}

#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    /// Path to the TOML configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}
