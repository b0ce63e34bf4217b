pub mod config;
pub mod handlers;
pub mod humanize;
pub mod messaging;
pub mod observability;
pub mod queue;
pub mod server;
pub mod worker;
