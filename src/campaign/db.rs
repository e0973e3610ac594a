use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::error::Error;
use crate::store::KeyValueStore;

use super::{CampaignId, EmailCampaign, StoredCampaign};

const MAX_WRITE_ATTEMPTS: usize = 3;
const CONNECTION_TEST_PREFIX: &str = "connection-test";

#[async_trait(?Send)]
pub trait CampaignStore {
    async fn fetch_campaigns(&self) -> Result<Vec<StoredCampaign>, Error>;

    async fn insert_campaign(&self, campaign: &EmailCampaign) -> Result<(), Error>;

    /// Returns whether a campaign with the same id was found and replaced.
    async fn replace_campaign(&self, campaign: &EmailCampaign) -> Result<bool, Error>;

    /// Returns how many campaigns were removed.
    async fn remove_campaign(&self, campaign_id: &CampaignId) -> Result<usize, Error>;

    async fn test_connection(&self) -> Result<(), Error>;
}

/// Campaigns kept as a single JSON array under one key.
#[derive(Clone)]
pub struct KvCampaignStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl KvCampaignStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, key: String) -> KvCampaignStore {
        KvCampaignStore { kv, key }
    }

    /// Read-modify-write of the whole array, guarded by compare-and-set on
    /// the raw value that was read. A lost race re-applies `mutation` to the
    /// fresh array.
    async fn mutate<F, R>(&self, mutation: F) -> Result<R, Error>
    where
        F: Fn(&mut Vec<StoredCampaign>) -> R,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let current = self.kv.get(&self.key).await?;
            let mut campaigns = decode_campaigns(current.as_deref())?;

            let outcome = mutation(&mut campaigns);

            let updated = serde_json::to_string(&campaigns)?;
            if self
                .kv
                .compare_and_set(&self.key, current.as_deref(), &updated)
                .await?
            {
                return Ok(outcome);
            }

            warn!(attempt, key = %self.key, "campaigns changed during write");
        }

        Err(Error::ConcurrentModificationDetected)
    }
}

#[async_trait(?Send)]
impl CampaignStore for KvCampaignStore {
    #[tracing::instrument(skip(self))]
    async fn fetch_campaigns(&self) -> Result<Vec<StoredCampaign>, Error> {
        let value = self.kv.get(&self.key).await?;

        decode_campaigns(value.as_deref())
    }

    #[tracing::instrument(skip(self))]
    async fn insert_campaign(&self, campaign: &EmailCampaign) -> Result<(), Error> {
        self.mutate(|campaigns| campaigns.push(campaign.clone().into()))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn replace_campaign(&self, campaign: &EmailCampaign) -> Result<bool, Error> {
        self.mutate(|campaigns| {
            match campaigns.iter_mut().find(|existing| existing.has_id(&campaign.id)) {
                Some(existing) => {
                    *existing = campaign.clone().into();
                    true
                }
                None => false,
            }
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn remove_campaign(&self, campaign_id: &CampaignId) -> Result<usize, Error> {
        self.mutate(|campaigns| {
            let before = campaigns.len();
            campaigns.retain(|campaign| !campaign.has_id(campaign_id));
            before - campaigns.len()
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn test_connection(&self) -> Result<(), Error> {
        let key = format!("{}:{}", CONNECTION_TEST_PREFIX, Uuid::new_v4());
        let value = rand::random::<u64>().to_string();

        self.kv.set(&key, &value).await?;
        let read_back = self.kv.get(&key).await;
        self.kv.delete(&key).await?;

        if read_back?.as_deref() != Some(value.as_str()) {
            return Err(Error::StoreRoundTripMismatch { key });
        }

        Ok(())
    }
}

/// An absent key, or a value that is valid JSON but not an array, reads as
/// no campaigns. Text that is not JSON at all is an error so that it is
/// never silently overwritten. Array elements never fail to decode.
fn decode_campaigns(value: Option<&str>) -> Result<Vec<StoredCampaign>, Error> {
    let value = match value {
        Some(value) => value,
        None => return Ok(vec![]),
    };

    let value: Value = serde_json::from_str(value)?;
    if !value.is_array() {
        warn!("stored campaigns are not an array, treating as empty");
        return Ok(vec![]);
    }

    let campaigns: Vec<StoredCampaign> = serde_json::from_value(value)?;
    let unrecognized = campaigns
        .iter()
        .filter(|campaign| matches!(campaign, StoredCampaign::Unrecognized(_)))
        .count();
    if unrecognized > 0 {
        warn!(unrecognized, "stored campaigns include records that are not campaigns");
    }

    Ok(campaigns)
}
