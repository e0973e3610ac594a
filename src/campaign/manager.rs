use chrono::{NaiveDate, Utc};
use serde_json::Number;
use tracing::warn;

use crate::database::Database;
use crate::error::Error;

use super::endpoints::CreateCampaignBody;
use super::{
    schedule, CampaignId, CampaignType, EmailCampaign, StoredCampaign, DEFAULT_TIMEZONE,
};

#[tracing::instrument(skip(db))]
pub async fn create_campaign(
    db: &dyn Database,
    body: CreateCampaignBody,
) -> Result<EmailCampaign, Error> {
    let mut missing_fields = vec![];
    let name = required(body.name, "name", &mut missing_fields);
    let send_date = required(body.send_date, "sendDate", &mut missing_fields);
    let send_time = required(body.send_time, "sendTime", &mut missing_fields);
    let campaign_type = required(body.campaign_type, "type", &mut missing_fields);

    if !missing_fields.is_empty() {
        return Err(Error::MissingRequiredFields { missing_fields });
    }

    let campaign_type = CampaignType::from_value(&campaign_type)
        .ok_or(Error::UnknownCampaignType { campaign_type })?;

    let campaign = EmailCampaign {
        id: body
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Utc::now().timestamp_millis().to_string()),
        name,
        send_date,
        send_time,
        timezone: body
            .timezone
            .filter(|timezone| !timezone.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        campaign_type: campaign_type.value().to_string(),
        is_transactional: body.is_transactional.unwrap_or(false),
        description: body.description.unwrap_or_default(),
        priority_score: Some(
            body.priority_score
                .unwrap_or_else(|| Number::from(campaign_type.priority_score())),
        ),
    };

    db.campaigns().insert_campaign(&campaign).await?;

    Ok(campaign)
}

#[tracing::instrument(skip(db))]
pub async fn get_campaigns(db: &dyn Database) -> Result<Vec<StoredCampaign>, Error> {
    let campaigns = db.campaigns().fetch_campaigns().await?;

    Ok(campaigns)
}

/// Replaces the stored campaign with the same id. An unknown id leaves the
/// stored campaigns untouched and still succeeds.
#[tracing::instrument(skip(db))]
pub async fn update_campaign(
    db: &dyn Database,
    campaign: EmailCampaign,
) -> Result<EmailCampaign, Error> {
    let replaced = db.campaigns().replace_campaign(&campaign).await?;
    if !replaced {
        warn!(campaign_id = %campaign.id, "no stored campaign matched the update");
    }

    Ok(campaign)
}

#[tracing::instrument(skip(db))]
pub async fn delete_campaign(db: &dyn Database, campaign_id: CampaignId) -> Result<(), Error> {
    let removed = db.campaigns().remove_campaign(&campaign_id).await?;
    if removed == 0 {
        warn!(campaign_id = %campaign_id, "no stored campaign matched the delete");
    }

    Ok(())
}

#[tracing::instrument(skip(db))]
pub async fn test_connection(db: &dyn Database) -> Result<(), Error> {
    db.campaigns().test_connection().await
}

#[tracing::instrument(skip(db))]
pub async fn get_schedule(
    db: &dyn Database,
    from: NaiveDate,
    days: u32,
) -> Result<Vec<EmailCampaign>, Error> {
    let campaigns = db
        .campaigns()
        .fetch_campaigns()
        .await?
        .into_iter()
        .filter_map(StoredCampaign::into_campaign)
        .collect();

    Ok(schedule::arrange(campaigns, from, days))
}

fn required(
    value: Option<String>,
    field: &'static str,
    missing_fields: &mut Vec<&'static str>,
) -> String {
    match value {
        Some(value) if !value.trim().is_empty() => value,
        _ => {
            missing_fields.push(field);
            String::new()
        }
    }
}
