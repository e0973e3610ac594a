use std::sync::Arc;

use crate::campaign::db::{CampaignStore, KvCampaignStore};
use crate::config::Config;
use crate::error::Error;
use crate::store::{self, KeyValueStore};

pub trait Database: Send + Sync {
    fn campaigns(&self) -> &dyn CampaignStore;
}

#[derive(Clone)]
pub struct KvDatabase {
    campaigns: KvCampaignStore,
}

impl KvDatabase {
    pub fn new(kv: Arc<dyn KeyValueStore>, campaigns_key: String) -> KvDatabase {
        KvDatabase {
            campaigns: KvCampaignStore::new(kv, campaigns_key),
        }
    }

    pub async fn connect(config: &Config) -> Result<KvDatabase, Error> {
        let kv = store::connect(&config.backend).await?;

        Ok(KvDatabase::new(kv, config.campaigns_key.clone()))
    }
}

impl Database for KvDatabase {
    fn campaigns(&self) -> &dyn CampaignStore {
        &self.campaigns
    }
}
