//! Process configuration, read from a TOML file.
//!
//! ```toml
//! day_history = 7
//! listen_addr = "0.0.0.0:8080"
//! poll_interval_secs = 20
//! persist_interval_secs = 60
//!
//! [store]
//! kind = "redis"
//! url = "redis://127.0.0.1:6379/"
//!
//! [[repos]]
//! owner = "octocat"
//! name = "hello-world"
//! ```
//!
//! The file is parsed into a raw form with defaults filled in, environment
//! overrides are applied, and the result is validated as a whole.
//!
//! # Environment Overrides
//!
//! - `GITHUB_TOKEN` replaces `github_token`
//! - `REDIS_ADDR` (`host:port` or a `redis://` URL) replaces `store.url`
//! - `BUILD_GRID_POLL_INTERVAL_SECS` / `BUILD_GRID_PERSIST_INTERVAL_SECS`
//!   replace the intervals

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::classify::MissingConclusion;
use crate::persistence::{
    AnyStore, FileSnapshotStore, MemorySnapshotStore, RedisSnapshotStore, StoreError,
};
use crate::scheduler::SchedulerConfig;
use crate::scheduler::config::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_PERSIST_INTERVAL_SECS, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_STORE_TIMEOUT_SECS,
};
use crate::types::{RepoId, TrackedRepo};

/// Default number of days shown per repository.
pub const DEFAULT_DAY_HISTORY: usize = 7;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "BUILD_GRID_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

// ─── Raw TOML structure ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigRaw {
    #[serde(default = "default_day_history")]
    day_history: usize,
    #[serde(default)]
    github_token: Option<String>,
    #[serde(default = "default_listen_addr")]
    listen_addr: SocketAddr,
    #[serde(default = "default_poll_interval_secs")]
    poll_interval_secs: u64,
    #[serde(default = "default_persist_interval_secs")]
    persist_interval_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    fetch_timeout_secs: u64,
    #[serde(default = "default_store_timeout_secs")]
    store_timeout_secs: u64,
    #[serde(default)]
    missing_conclusion: MissingConclusion,
    #[serde(default)]
    store: StoreRaw,
    #[serde(default)]
    repos: Vec<RepoRaw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoreRaw {
    #[serde(default)]
    kind: StoreKind,
    path: Option<PathBuf>,
    url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StoreKind {
    #[default]
    File,
    Redis,
    Memory,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RepoRaw {
    owner: String,
    name: String,
    #[serde(default = "default_branch")]
    default_branch: String,
}

fn default_day_history() -> usize {
    DEFAULT_DAY_HISTORY
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_persist_interval_secs() -> u64 {
    DEFAULT_PERSIST_INTERVAL_SECS
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_store_timeout_secs() -> u64 {
    DEFAULT_STORE_TIMEOUT_SECS
}

fn default_branch() -> String {
    "main".to_string()
}

// ─── Resolved configuration ───────────────────────────────────────────────────

/// Where persisted histories live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    File { path: PathBuf },
    Redis { url: String },
    Memory,
}

impl StoreConfig {
    /// Creates the configured store. Redis is not contacted until first use.
    pub fn open(&self) -> std::result::Result<AnyStore, StoreError> {
        Ok(match self {
            StoreConfig::File { path } => AnyStore::File(FileSnapshotStore::new(path)),
            StoreConfig::Redis { url } => AnyStore::Redis(RedisSnapshotStore::open(url)?),
            StoreConfig::Memory => AnyStore::Memory(MemorySnapshotStore::new()),
        })
    }
}

/// Resolved, validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub day_history: usize,
    pub github_token: String,
    pub listen_addr: SocketAddr,
    pub scheduler: SchedulerConfig,
    pub store: StoreConfig,
    pub repos: Vec<TrackedRepo>,
}

impl Config {
    /// Reads and parses a config file, applying environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    /// The config file path from [`CONFIG_PATH_ENV`], or the default.
    pub fn path_from_env() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Parses `toml_str`, taking overrides from `env` instead of the process
    /// environment.
    pub fn from_toml_with_env(
        toml_str: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let raw: ConfigRaw = toml::from_str(toml_str)?;

        let env_var = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let github_token = env_var("GITHUB_TOKEN")
            .or(raw.github_token)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::Invalid(
                    "a GitHub token is required (github_token or GITHUB_TOKEN)".to_string(),
                )
            })?;

        let store = match raw.store.kind {
            StoreKind::File => StoreConfig::File {
                path: raw.store.path.unwrap_or_else(|| PathBuf::from("state")),
            },
            StoreKind::Redis => {
                let url = env_var("REDIS_ADDR")
                    .map(|addr| redis_url(&addr))
                    .or(raw.store.url)
                    .ok_or_else(|| {
                        ConfigError::Invalid(
                            "store.url (or REDIS_ADDR) is required for the redis store"
                                .to_string(),
                        )
                    })?;
                StoreConfig::Redis { url }
            }
            StoreKind::Memory => StoreConfig::Memory,
        };

        let scheduler = SchedulerConfig {
            poll_interval: Duration::from_secs(raw.poll_interval_secs),
            persist_interval: Duration::from_secs(raw.persist_interval_secs),
            fetch_timeout: Duration::from_secs(raw.fetch_timeout_secs),
            store_timeout: Duration::from_secs(raw.store_timeout_secs),
            missing_conclusion: raw.missing_conclusion,
        }
        .with_overrides(&env);

        let repos = raw
            .repos
            .into_iter()
            .map(|r| TrackedRepo::new(RepoId::new(r.owner, r.name), r.default_branch))
            .collect();

        let config = Config {
            day_history: raw.day_history,
            github_token,
            listen_addr: raw.listen_addr,
            scheduler,
            store,
            repos,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.repos.is_empty() {
            return invalid("at least one [[repos]] entry is required".to_string());
        }
        if self.day_history == 0 {
            return invalid("day_history must be at least 1".to_string());
        }
        for (name, value) in [
            ("poll_interval_secs", self.scheduler.poll_interval),
            ("persist_interval_secs", self.scheduler.persist_interval),
            ("fetch_timeout_secs", self.scheduler.fetch_timeout),
            ("store_timeout_secs", self.scheduler.store_timeout),
        ] {
            if value.is_zero() {
                return invalid(format!("{name} must be greater than zero"));
            }
        }
        for (i, tracked) in self.repos.iter().enumerate() {
            let repo = &tracked.repo;
            if repo.owner.trim().is_empty() || repo.repo.trim().is_empty() {
                return invalid(format!("repos[{i}]: owner and name must be non-empty"));
            }
            if repo.owner.contains('/') || repo.repo.contains('/') {
                return invalid(format!("repos[{i}]: owner and name must not contain '/'"));
            }
            if tracked.default_branch.trim().is_empty() {
                return invalid(format!("repos[{i}]: default_branch must be non-empty"));
            }
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    /// Parses a TOML string, applying overrides from the process environment.
    fn from_str(toml_str: &str) -> Result<Self> {
        Config::from_toml_with_env(toml_str, |name| std::env::var(name).ok())
    }
}

/// Accepts either a bare `host:port` or a full redis URL.
fn redis_url(addr: &str) -> String {
    let addr = addr.trim();
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("redis://{addr}/")
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
