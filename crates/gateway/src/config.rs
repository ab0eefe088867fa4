//! Gateway configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, `LEDGERQL_*` environment variables (`__` separates nested keys, e.g.
//! `LEDGERQL_HEADERS__APP_ID`), then command-line flags.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::{Args, ValueEnum};
use config::{Config, Environment, File};
use ledgerql_client::{LedgerClientConfig, DEFAULT_LEDGER_URL};
use ledgerql_graphql::SchemaLimits;
use serde::Deserialize;
use url::Url;

const ENV_PREFIX: &str = "LEDGERQL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// Flags that take precedence over every other source.
#[derive(Debug, Clone, Default, Args)]
pub struct CliOverrides {
    /// Ledger node API root
    #[arg(long)]
    pub ledger_url: Option<String>,

    /// Bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log level or filter directive
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub ledger_url: String,
    /// Extra headers sent to the ledger, e.g. `app_id` and `app_key`.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub commit_poll_interval_ms: u64,
    pub commit_timeout_secs: u64,
    pub max_query_depth: usize,
    pub max_query_complexity: usize,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl GatewayConfig {
    /// Load and validate configuration from every source.
    pub fn load(path: Option<&Path>, overrides: &CliOverrides) -> Result<Self> {
        Self::load_with_env(path, overrides, None)
    }

    /// Like [`load`](Self::load), reading variables from `env` instead of the
    /// process environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        overrides: &CliOverrides,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let limits = SchemaLimits::default();
        let mut builder = Config::builder()
            .set_default("ledger_url", DEFAULT_LEDGER_URL)?
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("request_timeout_secs", 90)?
            .set_default("http_timeout_secs", 10)?
            .set_default("commit_poll_interval_ms", 500)?
            .set_default("commit_timeout_secs", 60)?
            .set_default("max_query_depth", limits.max_depth as i64)?
            .set_default("max_query_complexity", limits.max_complexity as i64)?
            .set_default("log_level", "info")?
            .set_default("log_format", LogFormat::Pretty.as_str())?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        builder = builder
            .set_override_option("ledger_url", overrides.ledger_url.clone())?
            .set_override_option("host", overrides.host.clone())?
            .set_override_option("port", overrides.port.map(i64::from))?
            .set_override_option("log_level", overrides.log_level.clone())?
            .set_override_option("log_format", overrides.log_format.map(|f| f.as_str()))?;

        let config: GatewayConfig = builder
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.ledger_url)
            .with_context(|| format!("ledger_url `{}` is not a valid URL", self.ledger_url))?;
        ensure!(
            matches!(url.scheme(), "http" | "https"),
            "ledger_url must use http or https"
        );
        ensure!(self.request_timeout_secs > 0, "request_timeout_secs must be positive");
        ensure!(self.http_timeout_secs > 0, "http_timeout_secs must be positive");
        ensure!(
            self.commit_poll_interval_ms > 0,
            "commit_poll_interval_ms must be positive"
        );
        ensure!(self.commit_timeout_secs > 0, "commit_timeout_secs must be positive");
        ensure!(self.max_query_depth > 0, "max_query_depth must be positive");
        ensure!(
            self.max_query_complexity > 0,
            "max_query_complexity must be positive"
        );
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn client_config(&self) -> LedgerClientConfig {
        let mut client = LedgerClientConfig::new(&self.ledger_url).with_commit_polling(
            Duration::from_millis(self.commit_poll_interval_ms),
            Duration::from_secs(self.commit_timeout_secs),
        );
        client.http_timeout = Duration::from_secs(self.http_timeout_secs);
        client.headers = self.headers.clone();
        client
    }

    pub fn schema_limits(&self) -> SchemaLimits {
        SchemaLimits {
            max_depth: self.max_query_depth,
            max_complexity: self.max_query_complexity,
        }
    }
}
