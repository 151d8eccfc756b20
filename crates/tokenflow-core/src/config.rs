//! Configuration for the execution core
//!
//! Defaults suit most embedders; `CoreConfig::from_env` lets a driver
//! override them without recompiling.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

/// Environment variable toggling start-node uniqueness validation
pub const ENV_SINGLE_START_NODE: &str = "TOKENFLOW_SINGLE_START_NODE";

/// Environment variable bounding tokens processed per `advance_tokens` call
pub const ENV_ACTIVATION_TOKEN_LIMIT: &str = "TOKENFLOW_ACTIVATION_TOKEN_LIMIT";

/// Tunables shared by validation and execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Reject graphs with more than one start node during validation
    #[serde(default = "default_single_start_node")]
    pub single_start_node: bool,

    /// Upper bound on tokens a single `advance_tokens` call may process.
    /// `None` disables the bound.
    #[serde(default = "default_activation_token_limit")]
    pub activation_token_limit: Option<usize>,
}

fn default_single_start_node() -> bool {
    true
}

fn default_activation_token_limit() -> Option<usize> {
    Some(10_000)
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            single_start_node: default_single_start_node(),
            activation_token_limit: default_activation_token_limit(),
        }
    }
}

impl CoreConfig {
    /// Load configuration from environment variables on top of the defaults.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`CoreConfig::from_env`] with a caller supplied lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_SINGLE_START_NODE) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.single_start_node = true,
                "0" | "false" | "no" => config.single_start_node = false,
                _ => warn!("Invalid {} value: {}", ENV_SINGLE_START_NODE, raw),
            }
        }

        if let Some(raw) = lookup(ENV_ACTIVATION_TOKEN_LIMIT) {
            let trimmed = raw.trim();
            if trimmed.eq_ignore_ascii_case("none") || trimmed == "0" {
                config.activation_token_limit = None;
            } else if let Ok(limit) = trimmed.parse::<usize>() {
                config.activation_token_limit = Some(limit);
            } else {
                warn!("Invalid {} value: {}", ENV_ACTIVATION_TOKEN_LIMIT, raw);
            }
        }

        config
    }
}
