//! Environment-backed runtime configuration.
//!
//! Loaded once at startup. Missing required identifiers are a
//! [`ConfigError`], surfaced before the platform connection is opened.

use miette::Diagnostic;
use std::time::Duration;
use thiserror::Error;

use crate::runtime::live::DEFAULT_EXECUTION_BUDGET;

/// Environment variable holding the platform bot token.
pub const ENV_TOKEN: &str = "BOTFLOW_TOKEN";
/// Environment variable holding the platform application id.
pub const ENV_APPLICATION_ID: &str = "BOTFLOW_APPLICATION_ID";
/// Optional override of the live execution budget, in milliseconds.
pub const ENV_EXECUTION_BUDGET_MS: &str = "BOTFLOW_EXECUTION_BUDGET_MS";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("missing required environment variable {name}")]
    #[diagnostic(
        code(botflow::config::missing_var),
        help("Set it in the environment or a .env file.")
    )]
    MissingVar { name: &'static str },

    #[error("environment variable {name} is not a valid {expected}: {value}")]
    #[diagnostic(code(botflow::config::invalid_var))]
    InvalidVar {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Startup configuration for the live service.
#[derive(Clone, Debug)]
pub struct Config {
    pub token: String,
    pub application_id: String,
    pub execution_budget: Duration,
}

impl Config {
    /// Load configuration from the environment, honoring a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let token = require(ENV_TOKEN)?;
        let application_id = require(ENV_APPLICATION_ID)?;
        let execution_budget = match std::env::var(ENV_EXECUTION_BUDGET_MS) {
            Ok(raw) => {
                let ms: u64 = raw.parse().map_err(|_| ConfigError::InvalidVar {
                    name: ENV_EXECUTION_BUDGET_MS,
                    expected: "integer millisecond count",
                    value: raw.clone(),
                })?;
                Duration::from_millis(ms)
            }
            Err(_) => DEFAULT_EXECUTION_BUDGET,
        };

        Ok(Self {
            token,
            application_id,
            execution_budget,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar { name }),
    }
}
