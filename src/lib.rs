use actix_web::web::{self, Data, JsonConfig, QueryConfig, ServiceConfig};
use actix_web::{App, HttpResponse, HttpServer, ResponseError};
use tracing::info;
use tracing_actix_web::TracingLogger;

pub mod campaign;
pub mod config;
pub mod database;
pub mod error;
pub mod store;
pub mod utils;

pub use campaign::{
    CampaignType, CampaignTypeBody, ConnectionTestBody, CreateCampaignBody, DeleteCampaignBody,
    EmailCampaign, StoredCampaign,
};
pub use config::Config;
pub use database::{Database, KvDatabase};
pub use error::Error;

/// Registers the campaign routes and the extractor error formatting.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.app_data(JsonConfig::default().error_handler(|err, _req| {
        // format json errors with custom format
        Error::InvalidJson(err).into()
    }))
    .app_data(QueryConfig::default().error_handler(|err, _req| {
        // format query errors with custom format
        Error::InvalidQuery(err).into()
    }))
    .service(campaign::endpoints::get_campaigns)
    .service(campaign::endpoints::create_campaign)
    .service(campaign::endpoints::update_campaign)
    .service(campaign::endpoints::delete_campaign)
    .service(campaign::endpoints::test_store_connection)
    .service(campaign::endpoints::get_campaign_schedule)
    .service(campaign::endpoints::get_campaign_types)
    .default_service(web::to(path_does_not_exist));
}

async fn path_does_not_exist() -> HttpResponse {
    Error::PathDoesNotExist.error_response()
}

pub async fn run(config: Config) -> Result<(), Error> {
    let db = KvDatabase::connect(&config).await?;
    let db = Data::new(Box::new(db) as Box<dyn Database>);

    info!("listening on {}", config.bind_address);
    HttpServer::new(move || {
        App::new()
            .app_data(Data::clone(&db))
            .wrap(TracingLogger::default())
            .configure(configure)
    })
    .bind(&config.bind_address)?
    .run()
    .await?;

    Ok(())
}
