use super::links::extract_urls;
use crate::queue::{Job, StatusScope, SubmitterId};
use crate::worker::QueueWorker;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info};

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type HandlerResult = Result<(), HandlerError>;

const START_TEXT: &str = "Hi! I am a URL uploader bot.\n\n\
Send me any direct link and I will download it and upload it here as a file or video.\n\n\
Use /help to see what else I can do.";

const QUEUE_PROMPT: &str = "Send me all your links in one message, separated by space.\n\n\
Example:\nhttps://a.com/1.mp4 https://b.com/2.mkv https://c.com/file.zip";

const NO_LINKS_TEXT: &str = "❌ No valid URLs found. Send again.";
const UNAVAILABLE_TEXT: &str = "⚠️ The queue is unavailable right now, please try again later.";

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "snake_case", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "show the welcome message.")]
    Start,
    #[command(description = "show this help.")]
    Help,
    #[command(description = "add several links at once.")]
    Queue,
    #[command(description = "show queue status.")]
    QueueStatus,
    #[command(description = "show queue status.")]
    Status,
    #[command(description = "skip your next job that has not started yet.")]
    Cancel,
    #[command(description = "remove all your pending jobs.")]
    Clear,
}

/// Dispatcher tree: commands first, then plain text carrying links
///
/// Only private chats are served.
pub fn schema() -> UpdateHandler<HandlerError> {
    let private = Update::filter_message().filter(|msg: Message| msg.chat.is_private());

    private
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::endpoint(handle_links))
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    worker: QueueWorker,
) -> HandlerResult {
    let submitter = SubmitterId::from(msg.chat.id);
    let reply = command_reply(&cmd, submitter, &worker);
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Execute `cmd` against the queue and produce the reply text
pub fn command_reply(cmd: &Command, submitter: SubmitterId, worker: &QueueWorker) -> String {
    match cmd {
        Command::Start => START_TEXT.to_string(),
        Command::Help => Command::descriptions().to_string(),
        Command::Queue => QUEUE_PROMPT.to_string(),
        Command::QueueStatus | Command::Status => {
            let all = worker.status(StatusScope::All);
            let mine = worker.status(StatusScope::Submitter(submitter));
            match (all, mine) {
                (Ok(all), Ok(mine)) => format!(
                    "📊 Queue Status\n• Status: {}\n• Pending tasks: {}\n• Yours: {}",
                    if all.running { "🟢 Running" } else { "🔴 Idle" },
                    all.pending,
                    mine.pending
                ),
                (Err(e), _) | (_, Err(e)) => {
                    error!(%submitter, error = %e, "Status read failed");
                    UNAVAILABLE_TEXT.to_string()
                }
            }
        }
        Command::Cancel => match worker.request_cancel(submitter) {
            Ok(()) => {
                info!(%submitter, "Cancel requested");
                "🛑 Your next job that has not started yet will be skipped.".to_string()
            }
            Err(e) => {
                error!(%submitter, error = %e, "Cancel request failed");
                UNAVAILABLE_TEXT.to_string()
            }
        },
        Command::Clear => match worker.remove_all_for(submitter) {
            Ok(removed) => {
                info!(%submitter, removed, "Pending jobs cleared");
                format!("🧹 Queue cleared.\n{} pending task(s) removed.", removed)
            }
            Err(e) => {
                error!(%submitter, error = %e, "Clear failed");
                UNAVAILABLE_TEXT.to_string()
            }
        },
    }
}

async fn handle_links(bot: Bot, msg: Message, worker: QueueWorker) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let submitter = SubmitterId::from(msg.chat.id);
    let reply = enqueue_links(text, submitter, &worker);
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Queue one job per link in `text` and kick the worker
pub fn enqueue_links(text: &str, submitter: SubmitterId, worker: &QueueWorker) -> String {
    let urls = extract_urls(text);
    if urls.is_empty() {
        return NO_LINKS_TEXT.to_string();
    }

    let count = urls.len();
    for url in urls {
        if let Err(e) = worker.enqueue(Job::new(submitter, url)) {
            error!(%submitter, error = %e, "Enqueue failed");
            return UNAVAILABLE_TEXT.to_string();
        }
    }

    if let Err(e) = worker.start_drain_if_idle() {
        error!(error = %e, "Could not start drain");
        return UNAVAILABLE_TEXT.to_string();
    }

    info!(%submitter, count, "Links queued");
    format!("✅ Added {} link(s) to queue. Processing…", count)
}
