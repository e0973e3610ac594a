use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::Error;

use super::KeyValueStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait(?Send)]
impl KeyValueStore for MemoryStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries().get(key).cloned())
    }

    #[tracing::instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entries().insert(key.to_string(), value.to_string());

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.entries().remove(key);

        Ok(())
    }

    #[tracing::instrument(skip(self, expected, value))]
    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool, Error> {
        let mut entries = self.entries();
        if entries.get(key).map(String::as_str) != expected {
            return Ok(false);
        }

        entries.insert(key.to_string(), value.to_string());

        Ok(true)
    }
}
