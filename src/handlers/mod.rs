//! Bot command surface
//!
//! Parses chat messages into queue operations:
//!
//! - plain text with links - one job per link, then start the drain
//! - `/queue_status`, `/status` - run flag and pending counts
//! - `/cancel` - skip the caller's next not-yet-started job
//! - `/clear` - drop all of the caller's pending jobs

mod commands;
mod links;

pub use commands::{Command, HandlerError, HandlerResult, command_reply, enqueue_links, schema};
pub use links::extract_urls;
