use std::collections::HashMap;

use chrono::{DateTime, Utc};
use config::{Config as ConfigLib, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::scan::ExpiryRules;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub thresholds: ThresholdConfig,
    pub verify: VerifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Days before expiry that produce an ERROR, 0 disables
    pub error_days: u32,
    /// Days before expiry that produce a WARNING, 0 disables
    pub warn_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    pub enabled: bool,
    /// Glob patterns selecting trusted root bundles
    #[serde(default)]
    pub ca: Vec<String>,
}

/// Values given on the command line; `None` leaves the lower layers alone
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub error_days: Option<u32>,
    pub warn_days: Option<u32>,
    pub verify: Option<bool>,
    pub ca: Option<Vec<String>>,
}

impl Config {
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::load_with_sources(None, overrides)
    }

    pub fn load_with_sources(
        env_vars: Option<HashMap<String, String>>,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigLib::builder()
            .set_default("thresholds.error_days", 0)?
            .set_default("thresholds.warn_days", 0)?
            .set_default("verify.enabled", false)?
            .set_default("verify.ca", Vec::<String>::new())?
            .add_source(File::with_name("config/check-certs").required(false));

        // If env_vars is provided, we use it instead of system environment
        // This is to avoid systems variables pollution across tests
        if let Some(vars) = env_vars {
            for (key, value) in vars {
                builder = builder.set_override(&key, value)?;
            }
        } else {
            // Should be in the format CHECK_CERTS_THRESHOLDS__WARN_DAYS or
            // CHECK_CERTS_VERIFY__CA=roots/*.pem,extra/*.pem
            builder = builder.add_source(
                Environment::with_prefix("CHECK_CERTS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("verify.ca"),
            );
        }

        builder = builder
            .set_override_option("thresholds.error_days", overrides.error_days.map(i64::from))?
            .set_override_option("thresholds.warn_days", overrides.warn_days.map(i64::from))?
            .set_override_option("verify.enabled", overrides.verify)?
            .set_override_option("verify.ca", overrides.ca.clone())?;

        builder.build()?.try_deserialize()
    }

    /// Thresholds measured against `now`
    pub fn expiry_rules(&self, now: DateTime<Utc>) -> ExpiryRules {
        ExpiryRules::new(
            i64::from(self.thresholds.error_days),
            i64::from(self.thresholds.warn_days),
            now,
        )
    }
}
