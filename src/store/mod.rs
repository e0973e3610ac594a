use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::BackendConfig;
use crate::error::Error;

pub mod memory;
pub mod mongo;
pub mod redis;
pub mod rest;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use rest::RestStore;
pub use self::redis::RedisStore;

/// A string-keyed store holding string values.
///
/// Futures are not `Send`: the REST backend holds an `awc` client across
/// awaits.
#[async_trait(?Send)]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    async fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    async fn delete(&self, key: &str) -> Result<(), Error>;

    /// Writes `value` only if the key currently holds `expected` (`None`
    /// meaning absent). Returns whether the write happened.
    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool, Error>;
}

/// Compare-and-set for Redis-compatible backends, run atomically server-side.
///
/// KEYS[1] = key, ARGV[1] = "1" if a current value is expected,
/// ARGV[2] = expected value, ARGV[3] = new value
pub(crate) const COMPARE_AND_SET_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
local matches
if ARGV[1] == '1' then
    matches = current == ARGV[2]
else
    matches = current == false
end
if matches then
    redis.call('SET', KEYS[1], ARGV[3])
    return 1
end
return 0
"#;

pub async fn connect(backend: &BackendConfig) -> Result<Arc<dyn KeyValueStore>, Error> {
    let store: Arc<dyn KeyValueStore> = match backend {
        BackendConfig::Rest {
            url,
            token,
            timeout,
        } => {
            info!("using rest key-value store: {}", url);
            Arc::new(RestStore::new(url.clone(), token.clone(), *timeout))
        }
        BackendConfig::Redis { url } => {
            info!("connecting to redis");
            Arc::new(RedisStore::connect(url).await?)
        }
        BackendConfig::Mongo { uri, database } => {
            info!("connecting to db: {}", uri);
            Arc::new(MongoStore::connect(uri, database).await?)
        }
        BackendConfig::Memory => {
            warn!("no store configured, campaigns will only live as long as this process");
            Arc::new(MemoryStore::new())
        }
    };

    Ok(store)
}
