pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod friends;
pub mod node;
pub mod posts;
pub mod remote;
pub mod telemetry;
pub mod utils;
pub mod visibility;
