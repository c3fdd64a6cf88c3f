use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "staffdb.toml";
pub const DB_FILE: &str = "staffdb.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Test => f.write_str("test"),
            Environment::Production => f.write_str("production"),
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(Error::Config(format!("unknown environment '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub environment: Environment,
}

/// Optional `staffdb.toml` in the data directory.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    environment: Option<Environment>,
}

impl Config {
    /// Loads `<data_dir>/staffdb.toml` if present, defaults otherwise.
    pub fn load<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let path = data_dir.join(CONFIG_FILE);

        let file = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str::<ConfigFile>(&content)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?
        } else {
            ConfigFile::default()
        };

        Ok(Self {
            data_dir,
            environment: file.environment.unwrap_or_default(),
        })
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Rollbacks are disabled in production.
    pub fn ensure_rollback_allowed(&self) -> Result<()> {
        if self.is_production() {
            return Err(Error::Forbidden(
                "rollbacks are disabled in production".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            environment: Environment::default(),
        }
    }
}
