//! Client for Redis-compatible REST stores such as Upstash and Vercel KV.
//!
//! Every command is a `POST` of a JSON array (`["SET", "key", "value"]`) to
//! the base url, authenticated with a bearer token. Replies are either
//! `{"result": ...}` or `{"error": "..."}`.

use std::time::Duration;

use async_trait::async_trait;
use awc::{Client, Connector};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::Error;

use super::{KeyValueStore, COMPARE_AND_SET_SCRIPT};

const MAX_REPLY_SIZE: usize = 16 * 1024 * 1024;

// error comes first: a missing `result` would otherwise read as `None`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Reply<T> {
    Error { error: String },
    Result { result: T },
}

#[derive(Clone, Debug)]
pub struct RestStore {
    url: String,
    token: String,
    timeout: Duration,
}

impl RestStore {
    pub fn new(url: String, token: String, timeout: Duration) -> RestStore {
        RestStore {
            url,
            token,
            timeout,
        }
    }

    /// The default connector carries rustls with the webpki roots, so both
    /// `http` and `https` urls work.
    fn client(&self) -> Client {
        Client::builder()
            .connector(Connector::new().timeout(self.timeout))
            .timeout(self.timeout)
            .finish()
    }

    async fn command<T: DeserializeOwned>(&self, command: &[&str]) -> Result<T, Error> {
        let mut response = self
            .client()
            .post(&self.url)
            .bearer_auth(&self.token)
            .send_json(&command)
            .await?;

        let status = response.status();
        let reply = response
            .json::<Reply<T>>()
            .limit(MAX_REPLY_SIZE)
            .await
            .map_err(|err| Error::StoreRejectedCommand {
                reason: format!("unreadable reply with status {}: {}", status, err),
            })?;

        into_result(reply)
    }
}

fn into_result<T>(reply: Reply<T>) -> Result<T, Error> {
    match reply {
        Reply::Result { result } => Ok(result),
        Reply::Error { error } => Err(Error::StoreRejectedCommand { reason: error }),
    }
}

#[async_trait(?Send)]
impl KeyValueStore for RestStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.command(&["GET", key]).await
    }

    #[tracing::instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let reply: String = self.command(&["SET", key, value]).await?;
        if reply != "OK" {
            return Err(Error::StoreRejectedCommand { reason: reply });
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), Error> {
        let _removed: i64 = self.command(&["DEL", key]).await?;

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

        let written: i64 = self
            .command(&[
                "EVAL",
                COMPARE_AND_SET_SCRIPT,
                "1",
                key,
                has_expected,
                expected,
                value,
            ])
            .await?;

        Ok(written == 1)
    }
}
