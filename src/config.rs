//! YAML configuration for seeding runs.
//!
//! Three sections, all optional: `database` (connection), `load` (dataset
//! size and encoder tuning) and `schema` (table and column names). Command
//! line flags override values read from the file.

use crate::encoder::{CsvFormat, DEFAULT_CHUNK_SIZE};
use crate::error::SeedError;
use crate::loader::DEFAULT_PREFETCH_DEPTH;
use crate::schema::SeedSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Connection settings. `url` is parsed first; the discrete fields override it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub dbname: Option<String>,
}

impl DatabaseConfig {
    pub fn to_pg_config(&self) -> Result<tokio_postgres::Config, SeedError> {
        let mut config = match &self.url {
            Some(url) => url
                .parse::<tokio_postgres::Config>()
                .map_err(|e| SeedError::Config(format!("invalid database url: {}", e)))?,
            None => tokio_postgres::Config::new(),
        };

        if let Some(ref host) = self.host {
            config.host(host);
        }
        if let Some(port) = self.port {
            config.port(port);
        }
        if let Some(ref user) = self.user {
            config.user(user);
        }
        if let Some(ref password) = self.password {
            config.password(password);
        }
        if let Some(ref dbname) = self.dbname {
            config.dbname(dbname);
        }

        if config.get_hosts().is_empty() {
            config.host("localhost");
        }
        if config.get_user().is_none() {
            config.user("postgres");
        }

        Ok(config)
    }
}

/// Dataset size and encoder tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Number of parent rows
    pub parents: usize,
    /// Child rows per parent
    pub children_per_parent: usize,
    /// Generator seed (random if unset)
    pub seed: Option<u64>,
    /// Target bytes per encoded chunk
    pub chunk_size: usize,
    /// Child chunks read ahead during the parent copy
    pub prefetch: usize,
    pub delimiter: char,
    pub quote: char,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            parents: 1000,
            children_per_parent: 10,
            seed: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            prefetch: DEFAULT_PREFETCH_DEPTH,
            delimiter: ',',
            quote: '"',
        }
    }
}

impl LoadConfig {
    pub fn csv_format(&self) -> Result<CsvFormat, SeedError> {
        let to_byte = |what: &str, c: char| {
            u8::try_from(c).map_err(|_| {
                SeedError::Config(format!("CSV {} must be ASCII, got {:?}", what, c))
            })
        };
        CsvFormat::new(to_byte("delimiter", self.delimiter)?, to_byte("quote", self.quote)?)
    }
}

/// Complete YAML configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeederYamlConfig {
    pub database: DatabaseConfig,
    pub load: LoadConfig,
    pub schema: SeedSchema,
}

/// Values given on the command line, applied over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub parents: Option<usize>,
    pub children_per_parent: Option<usize>,
    pub seed: Option<u64>,
    pub chunk_size: Option<usize>,
    pub prefetch: Option<usize>,
}

impl SeederYamlConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: SeederYamlConfig = serde_yaml_ng::from_str(content)?;
        Ok(config)
    }

    /// Read `path` if given, otherwise start from defaults, then apply `overrides`
    pub fn resolve(path: Option<&Path>, overrides: &ConfigOverrides) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)
                .map_err(|e| anyhow::anyhow!("failed to read config {}: {}", p.display(), e))?,
            None => Self::default(),
        };
        config.apply(overrides);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref url) = overrides.database_url {
            self.database.url = Some(url.clone());
        }
        if let Some(parents) = overrides.parents {
            self.load.parents = parents;
        }
        if let Some(children) = overrides.children_per_parent {
            self.load.children_per_parent = children;
        }
        if let Some(seed) = overrides.seed {
            self.load.seed = Some(seed);
        }
        if let Some(chunk_size) = overrides.chunk_size {
            self.load.chunk_size = chunk_size;
        }
        if let Some(prefetch) = overrides.prefetch {
            self.load.prefetch = prefetch;
        }
    }
}
