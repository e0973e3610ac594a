use actix_web::web::{Data, Json, Query};
use actix_web::{delete, get, options, post, put, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::database::Database;
use crate::error::Error;
use crate::utils::SuccessBody;

use super::schedule::DEFAULT_WINDOW_DAYS;
use super::{manager, CampaignId, CampaignType, EmailCampaign, StoredCampaign};

/// Every field is optional here; `manager::create_campaign` reports all of
/// the missing ones at once.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignBody {
    pub id: Option<CampaignId>,
    pub name: Option<String>,
    pub send_date: Option<String>,
    pub send_time: Option<String>,
    pub timezone: Option<String>,
    #[serde(rename = "type")]
    pub campaign_type: Option<String>,
    pub is_transactional: Option<bool>,
    pub description: Option<String>,
    pub priority_score: Option<Number>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DeleteCampaignBody {
    pub id: CampaignId,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConnectionTestBody {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScheduleQuery {
    pub from: Option<NaiveDate>,
    pub days: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignTypeBody {
    pub value: CampaignType,
    pub label: String,
    pub priority_score: i32,
}

impl CampaignTypeBody {
    pub fn render(campaign_type: CampaignType) -> CampaignTypeBody {
        CampaignTypeBody {
            value: campaign_type,
            label: campaign_type.label().to_string(),
            priority_score: campaign_type.priority_score(),
        }
    }
}

#[get("/api/email-campaigns")]
#[tracing::instrument(skip(db))]
pub async fn get_campaigns(
    db: Data<Box<dyn Database>>,
) -> Result<Json<Vec<StoredCampaign>>, Error> {
    let campaigns = manager::get_campaigns(&***db).await?;

    Ok(Json(campaigns))
}

#[post("/api/email-campaigns")]
#[tracing::instrument(skip(db))]
pub async fn create_campaign(
    db: Data<Box<dyn Database>>,
    body: Json<CreateCampaignBody>,
) -> Result<HttpResponse, Error> {
    let body = body.into_inner();

    let campaign = manager::create_campaign(&***db, body).await?;

    Ok(HttpResponse::Created().json(campaign))
}

/// The body replaces the stored record as given; only `id` is required.
#[put("/api/email-campaigns")]
#[tracing::instrument(skip(db))]
pub async fn update_campaign(
    db: Data<Box<dyn Database>>,
    body: Json<EmailCampaign>,
) -> Result<Json<EmailCampaign>, Error> {
    let campaign = manager::update_campaign(&***db, body.into_inner()).await?;

    Ok(Json(campaign))
}

#[delete("/api/email-campaigns")]
#[tracing::instrument(skip(db))]
pub async fn delete_campaign(
    db: Data<Box<dyn Database>>,
    body: Json<DeleteCampaignBody>,
) -> Result<Json<SuccessBody>, Error> {
    manager::delete_campaign(&***db, body.into_inner().id).await?;

    Ok(Json(SuccessBody::new()))
}

#[options("/api/email-campaigns")]
#[tracing::instrument(skip(db))]
pub async fn test_store_connection(
    db: Data<Box<dyn Database>>,
) -> Result<Json<ConnectionTestBody>, Error> {
    manager::test_connection(&***db).await?;

    Ok(Json(ConnectionTestBody {
        success: true,
        message: "Store connection test passed".to_string(),
        timestamp: Utc::now(),
    }))
}

#[get("/api/email-campaigns/schedule")]
#[tracing::instrument(skip(db))]
pub async fn get_campaign_schedule(
    db: Data<Box<dyn Database>>,
    query: Query<ScheduleQuery>,
) -> Result<Json<Vec<EmailCampaign>>, Error> {
    let query = query.into_inner();
    let from = query.from.unwrap_or_else(|| Utc::now().date_naive());
    let days = query.days.unwrap_or(DEFAULT_WINDOW_DAYS);

    let campaigns = manager::get_schedule(&***db, from, days).await?;

    Ok(Json(campaigns))
}

#[get("/api/email-campaign-types")]
#[tracing::instrument]
pub async fn get_campaign_types() -> Json<Vec<CampaignTypeBody>> {
    let body = CampaignType::ALL
        .iter()
        .copied()
        .map(CampaignTypeBody::render)
        .collect();

    Json(body)
}
