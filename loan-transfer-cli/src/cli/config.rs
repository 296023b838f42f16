use anyhow::Context;
use chrono::NaiveDate;
use loan_transfer::{accounts::ProductAccountMappings, loan::LoanValues};
use loan_transfer_tracing::TracingConfig;
use serde::{Deserialize, Serialize};

use std::path::Path;

use super::db::DbConfig;

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub accounts: ProductAccountMappings,
    #[serde(default)]
    pub loans: Vec<LoanValues>,
    #[serde(default)]
    pub tracing: TracingConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_externalize_non_active_loans")]
    pub externalize_non_active_loans: bool,
    #[serde(default)]
    pub auto_generate_external_id: bool,
    /// Fixed business date. The current UTC date is used when unset.
    #[serde(default)]
    pub business_date: Option<NaiveDate>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            externalize_non_active_loans: default_externalize_non_active_loans(),
            auto_generate_external_id: false,
            business_date: None,
        }
    }
}

fn default_externalize_non_active_loans() -> bool {
    true
}

pub struct EnvOverride {
    pub db_con: Option<String>,
}

impl Config {
    pub fn load_config(
        path: Option<impl AsRef<Path>>,
        env_override: EnvOverride,
    ) -> anyhow::Result<Self> {
        let mut config = if let Some(config_path) = path {
            let config_file =
                std::fs::read_to_string(config_path).context("Couldn't read config file")?;
            serde_yaml::from_str(&config_file).context("Couldn't parse config file")?
        } else {
            eprintln!("No config file provided, using default config.");
            Config::default()
        };

        config.apply_env_override(env_override);
        Ok(config)
    }

    fn apply_env_override(&mut self, EnvOverride { db_con }: EnvOverride) {
        if let Some(db_con) = db_con {
            self.db.db_con = db_con;
        }
    }
}
