use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};

use crate::error::Error;

use super::{KeyValueStore, COMPARE_AND_SET_SCRIPT};

/// Direct connection to a Redis server. The manager reconnects on its own
/// after a dropped connection.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    compare_and_set: Script,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<RedisStore, Error> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(RedisStore {
            connection,
            compare_and_set: Script::new(COMPARE_AND_SET_SCRIPT),
        })
    }
}

#[async_trait(?Send)]
impl KeyValueStore for RedisStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let mut connection = self.connection.clone();

        Ok(connection.get(key).await?)
    }

    #[tracing::instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut connection = self.connection.clone();
        connection.set::<_, _, ()>(key, value).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut connection = self.connection.clone();
        connection.del::<_, ()>(key).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, expected, value))]
    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool, Error> {
        let (has_expected, expected) = match expected {
            Some(expected) => ("1", expected),
            None => ("0", ""),
        };

        let mut connection = self.connection.clone();
        let written: i64 = self
            .compare_and_set
            .key(key)
            .arg(has_expected)
            .arg(expected)
            .arg(value)
            .invoke_async(&mut connection)
            .await?;

        Ok(written == 1)
    }
}
