//! Runtime configuration resolved from arguments and environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};

use salesbook_observability::LogConfig;
use salesbook_store::StoreConfig;

use crate::cli::{BackendKind, GlobalArgs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Local,
    Remote { url: String, auth: Option<String> },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Local files: invoices (local backend) and settings (always).
    pub data_dir: PathBuf,
    pub backend: BackendConfig,
    pub store: StoreConfig,
    pub refresh_interval: Duration,
}

/// Logging comes up before the rest of the configuration is validated, so
/// it is derived from the raw arguments.
pub fn log_config(args: &GlobalArgs) -> LogConfig {
    LogConfig::default().with_format(args.log_format)
}

impl AppConfig {
    pub fn from_args(args: &GlobalArgs) -> anyhow::Result<Self> {
        let data_dir = match &args.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };

        let backend = match args.backend {
            BackendKind::Local => BackendConfig::Local,
            BackendKind::Remote => {
                let Some(url) = args.remote_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
                    bail!("the remote backend needs --remote-url or SALESBOOK_REMOTE_URL");
                };
                if args.remote_auth.is_none() {
                    tracing::warn!("SALESBOOK_REMOTE_AUTH not set; remote requests are unauthenticated");
                }
                BackendConfig::Remote {
                    url: url.to_string(),
                    auth: args.remote_auth.clone(),
                }
            }
        };

        if args.refresh_secs == 0 {
            bail!("--refresh-secs must be at least 1");
        }

        Ok(Self {
            data_dir,
            backend,
            store: StoreConfig::default().with_missing_record(args.missing_record),
            refresh_interval: Duration::from_secs(args.refresh_secs),
        })
    }
}

/// `{app_data_dir}/salesbook`.
pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;
    Ok(base.join("salesbook"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use salesbook_observability::LogFormat;
    use salesbook_store::MissingRecordPolicy;

    fn args(extra: &[&str]) -> GlobalArgs {
        let mut argv = vec!["salesbook"];
        argv.extend_from_slice(extra);
        argv.push("report");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn local_backend_with_explicit_dir() {
        let args = args(&[
            "--data-dir",
            "/tmp/sb",
            "--backend",
            "local",
            "--missing-record",
            "upsert",
            "--log-format",
            "pretty",
        ]);
        let config = AppConfig::from_args(&args).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/sb"));
        assert_eq!(config.backend, BackendConfig::Local);
        assert_eq!(config.store.missing_record, MissingRecordPolicy::Upsert);
        assert_eq!(log_config(&args).format, LogFormat::Pretty);
    }

    #[test]
    fn remote_backend_requires_url() {
        let err = AppConfig::from_args(&args(&["--data-dir", "/tmp/sb", "--backend", "remote", "--remote-url", " "]));
        assert!(err.is_err());

        let config = AppConfig::from_args(&args(&[
            "--data-dir",
            "/tmp/sb",
            "--backend",
            "remote",
            "--remote-url",
            "https://shop.example.com",
            "--remote-auth",
            "secret",
            "--refresh-secs",
            "2",
        ]))
        .unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Remote {
                url: "https://shop.example.com".to_string(),
                auth: Some("secret".to_string()),
            }
        );
        assert_eq!(config.refresh_interval, Duration::from_secs(2));
    }

    #[test]
    fn zero_refresh_interval_is_rejected() {
        assert!(AppConfig::from_args(&args(&["--data-dir", "/tmp/sb", "--refresh-secs", "0"])).is_err());
    }
}
