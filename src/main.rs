mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use relaybox::config::Config;
use relaybox::messaging::TelegramTransport;
use relaybox::observability::{self, Metrics};
use relaybox::queue::WorkerState;
use relaybox::worker::{HttpDownloader, QueueWorker, Remuxer, UploadAgent};
use relaybox::{handlers, server};
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    observability::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(Config::load(args.config)?).await?,
        Commands::CheckConfig(args) => {
            let config = Config::load_without_secrets(args.config)?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

async fn run(config: Config) -> Result<(), AnyError> {
    tokio::fs::create_dir_all(&config.download.dir).await?;

    let token = config
        .telegram
        .bot_token
        .clone()
        .ok_or("bot token missing")?;

    let mut bot = Bot::new(token);
    if let Some(api_url) = &config.telegram.api_url {
        bot = bot.set_api_url(reqwest::Url::parse(api_url)?);
    }

    let transport = TelegramTransport::new(bot.clone());
    let remuxer = config
        .remux
        .enabled
        .then(|| Remuxer::new(config.remux.ffmpeg_path.clone()));
    let agent = UploadAgent::new(
        HttpDownloader::new(config.http_config())?,
        remuxer,
        transport.clone(),
        config.telegram.upload_limit,
    );

    let worker = QueueWorker::new(
        Arc::new(WorkerState::new()),
        Arc::new(agent),
        Arc::new(transport),
        Arc::new(Metrics::new()),
    );

    if config.health.enabled {
        let address = config.health.bind_addr;
        let health_worker = worker.clone();
        tokio::spawn(async move {
            if let Err(e) = server::run(address, health_worker).await {
                error!(%address, error = %e, "Health server stopped");
            }
        });
    }

    info!(download_dir = %config.download.dir.display(), "Bot started");

    Dispatcher::builder(bot, handlers::schema())
        .dependencies(dptree::deps![worker])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");
    Ok(())
}
