pub mod backend;
pub mod commands;
pub mod config;
pub mod errors;
pub mod flow;
pub mod http;
pub mod models;
pub mod notifier;
pub mod relay;
pub mod session_store;
pub mod watchdog;
