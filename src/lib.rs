pub mod ai_provider;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod core;
pub mod scheduler;
pub mod session;
pub mod status;
pub mod store;
