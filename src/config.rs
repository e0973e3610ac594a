use std::time::Duration;

use crate::error::Error;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_CAMPAIGNS_KEY: &str = "email-campaigns";
const DEFAULT_MONGODB_DATABASE: &str = "campaign_planner";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub bind_address: String,
    pub campaigns_key: String,
    pub backend: BackendConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendConfig {
    /// Redis-compatible REST store (Upstash or Vercel KV).
    Rest {
        url: String,
        token: String,
        timeout: Duration,
    },
    /// Plain Redis server, e.g. `redis://localhost:6379`.
    Redis {
        url: String,
    },
    Mongo {
        uri: String,
        database: String,
    },
    /// Process-lifetime map, only meant for local development.
    Memory,
}

impl Config {
    /// Reads configuration from the process environment, after loading a
    /// `.env` file if one is present.
    pub fn from_env() -> Result<Config, Error> {
        dotenvy::dotenv().ok();
        Config::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Config, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| var(name).filter(|value| !value.trim().is_empty());

        let bind_address = var("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.into());
        let campaigns_key = var("CAMPAIGNS_KEY").unwrap_or_else(|| DEFAULT_CAMPAIGNS_KEY.into());

        let rest = match (var("KV_REST_API_URL"), var("UPSTASH_REDIS_REST_URL")) {
            (Some(url), _) => Some((url, "KV_REST_API_TOKEN")),
            (None, Some(url)) => Some((url, "UPSTASH_REDIS_REST_TOKEN")),
            (None, None) => None,
        };

        let backend = if let Some((url, token_variable)) = rest {
            let token = var(token_variable).ok_or(Error::MissingConfiguration {
                variable: token_variable,
            })?;
            let timeout = match var("KV_REQUEST_TIMEOUT_SECS") {
                Some(value) => value.trim().parse().map_err(|_| Error::InvalidConfiguration {
                    variable: "KV_REQUEST_TIMEOUT_SECS",
                    value,
                })?,
                None => DEFAULT_REQUEST_TIMEOUT_SECS,
            };

            BackendConfig::Rest {
                url: url.trim_end_matches('/').to_string(),
                token,
                timeout: Duration::from_secs(timeout),
            }
        } else if let Some(url) = var("REDIS_URL") {
            BackendConfig::Redis { url }
        } else if let Some(uri) = var("MONGODB_URI") {
            BackendConfig::Mongo {
                uri,
                database: var("MONGODB_DATABASE")
                    .unwrap_or_else(|| DEFAULT_MONGODB_DATABASE.into()),
            }
        } else {
            BackendConfig::Memory
        };

        Ok(Config {
            bind_address,
            campaigns_key,
            backend,
        })
    }
}
