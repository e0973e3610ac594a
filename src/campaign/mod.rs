use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub mod db;
pub mod endpoints;
pub mod manager;
pub mod schedule;
pub use endpoints::*;

pub type CampaignId = String;

pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Only `id` is required when decoding. Stored records and update bodies
/// are taken as given, so `type` is any string and a missing
/// `priorityScore` stays missing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailCampaign {
    pub id: CampaignId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub send_date: String,
    #[serde(default)]
    pub send_time: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(rename = "type", default)]
    pub campaign_type: String,
    #[serde(default)]
    pub is_transactional: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_score: Option<Number>,
}

impl EmailCampaign {
    /// The stored score, else the score of a catalogue type, else zero.
    pub fn effective_priority(&self) -> f64 {
        self.priority_score
            .as_ref()
            .and_then(Number::as_f64)
            .or_else(|| {
                CampaignType::from_value(&self.campaign_type)
                    .map(|campaign_type| f64::from(campaign_type.priority_score()))
            })
            .unwrap_or(0.0)
    }
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

/// One element of the stored array. Elements that do not decode as a
/// campaign are kept verbatim so they survive every rewrite of the array.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StoredCampaign {
    Campaign(EmailCampaign),
    Unrecognized(Value),
}

impl StoredCampaign {
    pub fn has_id(&self, campaign_id: &str) -> bool {
        match self {
            StoredCampaign::Campaign(campaign) => campaign.id == campaign_id,
            StoredCampaign::Unrecognized(value) => match value.get("id") {
                Some(Value::String(id)) => id == campaign_id,
                Some(Value::Number(id)) => id.to_string() == campaign_id,
                _ => false,
            },
        }
    }

    pub fn into_campaign(self) -> Option<EmailCampaign> {
        match self {
            StoredCampaign::Campaign(campaign) => Some(campaign),
            StoredCampaign::Unrecognized(_) => None,
        }
    }
}

impl From<EmailCampaign> for StoredCampaign {
    fn from(campaign: EmailCampaign) -> StoredCampaign {
        StoredCampaign::Campaign(campaign)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignType {
    Event,
    Promotional,
    Nurture,
    Other,
}

impl CampaignType {
    pub const ALL: [CampaignType; 4] = [
        CampaignType::Event,
        CampaignType::Promotional,
        CampaignType::Nurture,
        CampaignType::Other,
    ];

    pub fn from_value(value: &str) -> Option<CampaignType> {
        CampaignType::ALL
            .iter()
            .copied()
            .find(|campaign_type| campaign_type.value() == value)
    }

    pub fn value(self) -> &'static str {
        match self {
            CampaignType::Event => "event",
            CampaignType::Promotional => "promotional",
            CampaignType::Nurture => "nurture",
            CampaignType::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CampaignType::Event => "Event",
            CampaignType::Promotional => "Promotional",
            CampaignType::Nurture => "Nurture",
            CampaignType::Other => "Other",
        }
    }

    /// Weight used to order campaigns that go out on the same day.
    pub fn priority_score(self) -> i32 {
        match self {
            CampaignType::Event => 4,
            CampaignType::Promotional => 3,
            CampaignType::Nurture => 2,
            CampaignType::Other => 1,
        }
    }
}
