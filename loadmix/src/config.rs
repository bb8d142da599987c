//! Configuration for the load generator.
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. Environment variables (prefixed with `LOADMIX__`)
//! 2. YAML configuration file (specified via `-c` or `--config` flag)
//! 3. Defaults
//!
//! Environment variables use double underscores (`__`) to denote nested configuration
//! structures. For example:
//!
//! - `LOADMIX__CLIENTS=500` sets the number of simulated clients
//! - `LOADMIX__WORKLOAD__WRITE_FRACTION=0.2` sets the fraction of writes
//! - `LOADMIX__STORE__TYPE=memory` runs against the in-process store
//!
//! The same configuration in YAML:
//!
//! ```yaml
//! clients: 500
//! workload:
//!   write_fraction: 0.2
//! store:
//!   type: memory
//! ```

use std::fmt;
use std::num::NonZeroU64;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use loadmix_store::{BoxedStore, MemoryStore, MongoStore};
use secrecy::{CloneableSecret, ExposeSecret, SecretBox, SerializableSecret, zeroize::Zeroize};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::workload::{Workload, WorkloadError};

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "LOADMIX__";

/// Newtype around `String` that keeps secrets such as credentials in connection strings out of
/// logs. Use with [`secrecy::SecretBox`].
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigSecret(String);

impl ConfigSecret {
    /// Returns the secret value.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ConfigSecret {
    fn from(str: &str) -> Self {
        ConfigSecret(str.to_string())
    }
}

impl fmt::Debug for ConfigSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "[redacted]")
    }
}

impl CloneableSecret for ConfigSecret {}
impl SerializableSecret for ConfigSecret {}
impl Zeroize for ConfigSecret {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Errors detected when validating a [`Config`] before a run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The operation mix is invalid.
    #[error("invalid workload: {0}")]
    Workload(#[from] WorkloadError),

    /// The id counter must start above zero so that reads have a target range.
    #[error("start_id must be greater than zero")]
    ZeroStartId,

    /// At least one simulated client is required.
    #[error("clients must be greater than zero")]
    NoClients,

    /// The runtime needs at least one worker thread.
    #[error("runtime.worker_threads must be greater than zero")]
    NoWorkerThreads,
}

/// The data store to run against.
///
/// The `type` field in YAML or `__TYPE` in environment variables determines which variant is
/// used.
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Store {
    /// A MongoDB deployment (type `"mongodb"`).
    ///
    /// ```yaml
    /// store:
    ///   type: mongodb
    ///   uri: mongodb://127.0.0.1:30000
    ///   database: test
    ///   collection: workload
    /// ```
    MongoDb {
        /// Connection string, redacted from logs.
        ///
        /// # Environment Variable
        ///
        /// `LOADMIX__STORE__URI`
        uri: SecretBox<ConfigSecret>,
        /// Database holding the workload collection.
        database: String,
        /// Collection that records are written to.
        collection: String,
    },

    /// An in-process store (type `"memory"`), useful for dry runs of the load generator itself.
    Memory,
}

impl Store {
    /// Creates the store described by this configuration.
    pub fn open(&self) -> BoxedStore {
        match self {
            Store::MongoDb {
                uri,
                database,
                collection,
            } => Arc::new(MongoStore::new(
                uri.expose_secret().as_str(),
                database.as_str(),
                collection.as_str(),
            )),
            Store::Memory => Arc::new(MemoryStore::new()),
        }
    }
}

/// The operation mix, see [`Workload`].
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct WorkloadConfig {
    /// Fraction of all operations that are writes.
    ///
    /// # Default
    ///
    /// `0.6`
    pub write_fraction: f64,

    /// Fraction of writes that are deletes.
    ///
    /// # Default
    ///
    /// `0.1`
    pub delete_fraction: f64,

    /// Fraction of writes that are updates. Updates are currently a no-op.
    ///
    /// # Default
    ///
    /// `0.1`
    pub update_fraction: f64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        let workload = Workload::default();
        Self {
            write_fraction: workload.write_fraction(),
            delete_fraction: workload.delete_fraction(),
            update_fraction: workload.update_fraction(),
        }
    }
}

/// Runtime configuration for the async executor.
#[derive(Debug, Deserialize, Serialize)]
pub struct Runtime {
    /// Number of worker threads the simulated clients are scheduled on.
    ///
    /// # Default
    ///
    /// The number of logical CPUs.
    ///
    /// # Environment Variable
    ///
    /// `LOADMIX__RUNTIME__WORKER_THREADS`
    pub worker_threads: usize,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get(),
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pretty printing with colors when stderr is a terminal, otherwise simplified.
    #[default]
    Auto,
    /// Pretty printing with colors.
    Pretty,
    /// Compact single-line output without colors.
    Simplified,
    /// JSON lines.
    Json,
}

/// Logging configuration. Logs are always written to stderr.
#[derive(Debug, Deserialize, Serialize)]
pub struct Logging {
    /// Minimum log level to output.
    ///
    /// `RUST_LOG` overrides this when set.
    ///
    /// # Default
    ///
    /// `INFO`
    ///
    /// # Environment Variable
    ///
    /// `LOADMIX__LOGGING__LEVEL`
    #[serde(with = "display_fromstr")]
    pub level: LevelFilter,

    /// Log output format.
    ///
    /// # Default
    ///
    /// `auto`
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

mod display_fromstr {
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: std::fmt::Display,
    {
        serializer.collect_str(&value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: std::str::FromStr,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        use serde::Deserialize;
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Main configuration struct for the load generator.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// The data store to run against.
    ///
    /// # Default
    ///
    /// MongoDB at `mongodb://127.0.0.1:30000`, collection `test.workload`.
    pub store: Store,

    /// Number of concurrently simulated clients, each with its own session.
    ///
    /// # Default
    ///
    /// `100`
    pub clients: usize,

    /// First record number handed out by the id counter. Must be greater than zero.
    ///
    /// # Default
    ///
    /// `1000`
    pub start_id: u64,

    /// The operation mix.
    pub workload: WorkloadConfig,

    /// Base seed for the simulated clients' random choices.
    ///
    /// Client `i` is seeded with `seed + i`. A random seed is used when unset.
    pub seed: Option<u64>,

    /// Stop after this duration, in addition to stopping on SIGINT or SIGTERM.
    ///
    /// # Example
    ///
    /// `LOADMIX__DURATION=5m`
    #[serde(default, with = "humantime_serde")]
    pub duration: Option<Duration>,

    /// Runtime configuration.
    pub runtime: Runtime,

    /// Logging configuration.
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: Store::MongoDb {
                uri: SecretBox::new(Box::new(ConfigSecret::from("mongodb://127.0.0.1:30000"))),
                database: "test".to_owned(),
                collection: "workload".to_owned(),
            },
            clients: 100,
            start_id: 1000,
            workload: WorkloadConfig::default(),
            seed: None,
            duration: None,
            runtime: Runtime::default(),
            logging: Logging::default(),
        }
    }
}

impl Config {
    /// Loads configuration from defaults, an optional YAML file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML file cannot be read or parsed, or if values have the wrong
    /// type. Semantic checks happen in [`Config::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Checks the parts of the configuration a run depends on.
    pub fn validate(&self) -> Result<Validated, ConfigError> {
        let workload = Workload::builder()
            .write_fraction(self.workload.write_fraction)
            .delete_fraction(self.workload.delete_fraction)
            .update_fraction(self.workload.update_fraction)
            .build()?;
        let start_id = NonZeroU64::new(self.start_id).ok_or(ConfigError::ZeroStartId)?;
        if self.clients == 0 {
            return Err(ConfigError::NoClients);
        }
        if self.runtime.worker_threads == 0 {
            return Err(ConfigError::NoWorkerThreads);
        }

        Ok(Validated {
            workload,
            start_id,
            clients: self.clients,
        })
    }
}

/// The validated subset of a [`Config`] required to start a run.
#[derive(Clone, Copy, Debug)]
pub struct Validated {
    /// The operation mix.
    pub workload: Workload,
    /// First record number handed out by the id counter.
    pub start_id: NonZeroU64,
    /// Number of simulated clients.
    pub clients: usize,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::load(None).unwrap();

            let Store::MongoDb {
                uri,
                database,
                collection,
            } = &config.store
            else {
                panic!("expected mongodb store");
            };
            assert_eq!(uri.expose_secret().as_str(), "mongodb://127.0.0.1:30000");
            assert_eq!(database, "test");
            assert_eq!(collection, "workload");

            assert_eq!(config.clients, 100);
            assert_eq!(config.start_id, 1000);
            assert_eq!(config.workload.write_fraction, 0.6);
            assert_eq!(config.seed, None);
            assert_eq!(config.duration, None);
            assert_eq!(config.logging.level, LevelFilter::INFO);

            let validated = config.validate().unwrap();
            assert_eq!(validated.workload, Workload::default());
            Ok(())
        });
    }

    #[test]
    fn configurable_via_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("LOADMIX__STORE__TYPE", "memory");
            jail.set_env("LOADMIX__CLIENTS", "8");
            jail.set_env("LOADMIX__START_ID", "1");
            jail.set_env("LOADMIX__WORKLOAD__WRITE_FRACTION", "0.25");
            jail.set_env("LOADMIX__SEED", "42");
            jail.set_env("LOADMIX__DURATION", "1m 30s");
            jail.set_env("LOADMIX__RUNTIME__WORKER_THREADS", "2");
            jail.set_env("LOADMIX__LOGGING__LEVEL", "debug");
            jail.set_env("LOADMIX__LOGGING__FORMAT", "json");

            let config = Config::load(None).unwrap();

            assert!(matches!(config.store, Store::Memory));
            assert_eq!(config.clients, 8);
            assert_eq!(config.start_id, 1);
            assert_eq!(config.workload.write_fraction, 0.25);
            assert_eq!(config.workload.delete_fraction, 0.1);
            assert_eq!(config.seed, Some(42));
            assert_eq!(config.duration, Some(Duration::from_secs(90)));
            assert_eq!(config.runtime.worker_threads, 2);
            assert_eq!(config.logging.level, LevelFilter::DEBUG);
            assert_eq!(config.logging.format, LogFormat::Json);
            Ok(())
        });
    }

    #[test]
    fn configured_with_env_and_yaml() {
        let mut tempfile = tempfile::NamedTempFile::new().unwrap();
        tempfile
            .write_all(
                br#"
            store:
                type: mongodb
                uri: mongodb://user:secret@db:27017
                database: bench
                collection: records
            clients: 250
            workload:
                write_fraction: 0.9
                update_fraction: 0.0
            "#,
            )
            .unwrap();

        figment::Jail::expect_with(|jail| {
            jail.set_env("LOADMIX__CLIENTS", "300");

            let config = Config::load(Some(tempfile.path())).unwrap();

            let Store::MongoDb {
                uri, collection, ..
            } = &dbg!(&config).store
            else {
                panic!("expected mongodb store");
            };
            assert_eq!(uri.expose_secret().as_str(), "mongodb://user:secret@db:27017");
            assert_eq!(collection, "records");

            // Env should overwrite the yaml config
            assert_eq!(config.clients, 300);
            assert_eq!(config.workload.write_fraction, 0.9);
            assert_eq!(config.workload.update_fraction, 0.0);
            assert_eq!(config.workload.delete_fraction, 0.1);
            Ok(())
        });
    }

    #[test]
    fn secrets_are_redacted() {
        let config = Config::default();
        let debug = format!("{config:?}");

        assert!(!debug.contains("127.0.0.1:30000"));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = Config::default();
        config.workload.delete_fraction = 0.7;
        config.workload.update_fraction = 0.3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Workload(WorkloadError::NoInserts { .. }))
        ));

        let mut config = Config::default();
        config.start_id = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroStartId)));

        let mut config = Config::default();
        config.clients = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoClients)));

        let mut config = Config::default();
        config.runtime.worker_threads = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoWorkerThreads)));
    }
}
