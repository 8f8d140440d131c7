//! `salesbook` command-line front end.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod output;

pub use app::App;
pub use cli::{Cli, Command};
pub use config::AppConfig;
