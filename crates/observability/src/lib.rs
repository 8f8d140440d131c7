//! Process-wide logging setup.

pub mod logging;

pub use logging::{LogConfig, LogFormat};
