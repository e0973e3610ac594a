use async_trait::async_trait;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ReplaceOptions;
use mongodb::{bson, Client, Collection};
use serde::{Deserialize, Serialize};

use crate::error::Error;

use super::KeyValueStore;

const ENTRIES: &str = "kv";
const DUPLICATE_KEY: i32 = 11000;

/// One document per key in the `kv` collection.
#[derive(Clone, Debug, Deserialize, Serialize)]
struct Entry {
    #[serde(rename = "_id")]
    key: String,
    value: String,
}

#[derive(Debug, Clone)]
pub struct MongoStore {
    entries: Collection<Entry>,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<MongoStore, Error> {
        let db = Client::with_uri_str(uri).await?.database(database);

        // ping the database to ensure connection is established
        db.run_command(bson::doc! { "ping": 1 }, None).await?;

        Ok(MongoStore {
            entries: db.collection(ENTRIES),
        })
    }
}

#[async_trait(?Send)]
impl KeyValueStore for MongoStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entry = self
            .entries
            .find_one(bson::doc! { "_id": key }, None)
            .await?;

        Ok(entry.map(|entry| entry.value))
    }

    #[tracing::instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let entry = Entry {
            key: key.to_string(),
            value: value.to_string(),
        };
        let options = ReplaceOptions::builder().upsert(true).build();

        self.entries
            .replace_one(bson::doc! { "_id": key }, entry, options)
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.entries
            .delete_one(bson::doc! { "_id": key }, None)
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, expected, value))]
    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool, Error> {
        match expected {
            Some(expected) => {
                let result = self
                    .entries
                    .update_one(
                        bson::doc! { "_id": key, "value": expected },
                        bson::doc! { "$set": { "value": value } },
                        None,
                    )
                    .await?;

                Ok(result.matched_count == 1)
            }
            None => {
                let entry = Entry {
                    key: key.to_string(),
                    value: value.to_string(),
                };

                match self.entries.insert_one(entry, None).await {
                    Ok(_) => Ok(true),
                    Err(err) if is_duplicate_key(&err) => Ok(false),
                    Err(err) => Err(err.into()),
                }
            }
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}
