//! Gateway configuration and routing table
//!
//! The config file is YAML:
//!
//! ```yaml
//! model_list:
//!   - model_name: gpt-4o          # logical name clients send
//!     litellm_params:
//!       model: anthropic/claude-3-opus
//!       api_base: https://api.example.com
//!       api_key: sk-...           # optional
//! auth_token: secret              # optional, falls back to LITELLM_MASTER_KEY
//! ```
//!
//! The routing table is built once at startup and never mutated afterwards;
//! request handlers share it behind an `Arc`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable consulted when the config file carries no `auth_token`.
pub const MASTER_KEY_ENV: &str = "LITELLM_MASTER_KEY";

/// Provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// OpenAI-compatible API
    OpenAI,
    /// Anthropic-compatible API
    Anthropic,
}

impl ProviderType {
    /// Classify a configured upstream model reference by its provider prefix.
    /// Anything without the `anthropic/` prefix is treated as OpenAI-style.
    pub fn of_model(model: &str) -> Self {
        if model.starts_with("anthropic/") {
            ProviderType::Anthropic
        } else {
            ProviderType::OpenAI
        }
    }

    /// Get the config key for this provider
    pub fn config_key(&self) -> &str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Anthropic => "anthropic",
        }
    }
}

/// One configured logical model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Logical name clients address
    pub model_name: String,
    /// Upstream connection parameters
    pub litellm_params: LitellmParams,
}

/// Upstream connection parameters for a logical model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LitellmParams {
    /// Provider-qualified upstream model, e.g. `anthropic/claude-3-opus`
    pub model: String,
    /// Base URL of the upstream API
    pub api_base: String,
    /// Upstream API key; empty means no auth header is sent upstream
    #[serde(default)]
    pub api_key: String,
}

/// Top-level gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Configured logical models
    #[serde(default)]
    pub model_list: Vec<ModelConfig>,

    /// Shared secret all clients must present; absent disables auth
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// When the file carries no (or an empty) `auth_token`, the
    /// `LITELLM_MASTER_KEY` environment variable supplies the shared secret.
    /// An empty secret from either source means auth is disabled.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let mut config: Config = serde_yaml::from_str(&data)?;

        if config.auth_token.as_deref().is_none_or(str::is_empty) {
            config.auth_token = std::env::var(MASTER_KEY_ENV).ok();
        }
        if config.auth_token.as_deref() == Some("") {
            config.auth_token = None;
        }

        Ok(config)
    }
}

/// A resolved route for one logical model
#[derive(Debug, Clone)]
pub struct Route {
    /// Upstream model as configured, provider prefix included
    pub upstream_model: String,
    /// Base URL of the upstream API
    pub api_base: String,
    /// Upstream API key, possibly empty
    pub api_key: String,
    /// Provider classification, computed once when the route is registered
    pub provider_type: ProviderType,
}

impl Route {
    fn new(params: &LitellmParams) -> Self {
        Route {
            upstream_model: params.model.clone(),
            api_base: params.api_base.clone(),
            api_key: params.api_key.clone(),
            provider_type: ProviderType::of_model(&params.model),
        }
    }

    /// The bare model name the upstream API expects, provider prefix stripped.
    pub fn bare_model(&self) -> &str {
        self.upstream_model
            .strip_prefix("anthropic/")
            .or_else(|| self.upstream_model.strip_prefix("openai/"))
            .unwrap_or(&self.upstream_model)
    }
}

/// Immutable mapping from logical model name to upstream route.
///
/// Lookups are exact-match and case-sensitive. Duplicate logical names in the
/// config are last-write-wins.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: IndexMap<String, Route>,
}

impl RouteTable {
    /// Build the table from configuration, one insert per configured model.
    pub fn from_config(config: &Config) -> Self {
        let mut routes = IndexMap::with_capacity(config.model_list.len());
        for model in &config.model_list {
            routes.insert(model.model_name.clone(), Route::new(&model.litellm_params));
        }
        RouteTable { routes }
    }

    /// Look up the route for a logical model name.
    pub fn resolve(&self, logical_name: &str) -> Option<&Route> {
        self.routes.get(logical_name)
    }

    /// Number of configured routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterate routes in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Route)> {
        self.routes.iter().map(|(name, route)| (name.as_str(), route))
    }
}
