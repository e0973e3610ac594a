use std::sync::Arc;

use actix_web::http::{Method, StatusCode};
use actix_web::web::Data;
use actix_web::{test, App};
use async_trait::async_trait;
use campaign_planner::store::{KeyValueStore, MemoryStore};
use campaign_planner::{configure, Database, Error, KvDatabase};
use serde_json::{json, Value};

const PATH: &str = "/api/email-campaigns";

macro_rules! app {
    ($store:expr) => {{
        let db = KvDatabase::new($store, "email-campaigns".into());
        test::init_service(
            App::new()
                .app_data(Data::new(Box::new(db) as Box<dyn Database>))
                .configure(configure),
        )
        .await
    }};
    () => {
        app!(Arc::new(MemoryStore::new()))
    };
}

fn launch_email(id: &str) -> Value {
    json!({
        "id": id,
        "name": "Launch Email",
        "sendDate": "2024-06-01",
        "sendTime": "09:00",
        "timezone": "America/New_York",
        "type": "event",
        "isTransactional": false,
        "description": "",
        "priorityScore": 4,
    })
}

/// Fails every call, as an unreachable backend would.
struct UnreachableStore;

#[async_trait(?Send)]
impl KeyValueStore for UnreachableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, Error> {
        Err(unreachable_error())
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), Error> {
        Err(unreachable_error())
    }

    async fn delete(&self, _key: &str) -> Result<(), Error> {
        Err(unreachable_error())
    }

    async fn compare_and_set(
        &self,
        _key: &str,
        _expected: Option<&str>,
        _value: &str,
    ) -> Result<bool, Error> {
        Err(unreachable_error())
    }
}

fn unreachable_error() -> Error {
    Error::StoreRejectedCommand {
        reason: "connection refused".into(),
    }
}

#[actix_web::test]
async fn list_starts_empty() {
    let app = app!();

    let req = test::TestRequest::get().uri(PATH).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!([]));
}

#[actix_web::test]
async fn create_then_list() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri(PATH)
        .set_json(launch_email("1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created, launch_email("1"));

    let req = test::TestRequest::get().uri(PATH).to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed, json!([launch_email("1")]));
}

#[actix_web::test]
async fn creates_keep_insertion_order_and_delete_removes() {
    let app = app!();

    for id in ["1", "2"] {
        let req = test::TestRequest::post()
            .uri(PATH)
            .set_json(launch_email(id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get().uri(PATH).to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed, json!([launch_email("1"), launch_email("2")]));

    let req = test::TestRequest::delete()
        .uri(PATH)
        .set_json(json!({ "id": "1" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "success": true }));

    let req = test::TestRequest::get().uri(PATH).to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed, json!([launch_email("2")]));
}

#[actix_web::test]
async fn delete_of_unknown_id_succeeds() {
    let app = app!();

    for _ in 0..2 {
        let req = test::TestRequest::delete()
            .uri(PATH)
            .set_json(json!({ "id": "never-stored" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

#[actix_web::test]
async fn create_with_missing_fields_is_rejected() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri(PATH)
        .set_json(json!({ "id": "1", "name": "", "sendDate": "2024-06-01" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "E4001002");
    assert_eq!(body["error"], "Missing required fields");
    assert_eq!(
        body["details"]["missing_fields"],
        json!(["name", "sendTime", "type"])
    );

    let req = test::TestRequest::get().uri(PATH).to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed, json!([]));
}

#[actix_web::test]
async fn malformed_json_is_rejected() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri(PATH)
        .insert_header(("content-type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "E4001000");
}

#[actix_web::test]
async fn update_replaces_matching_record() {
    let app = app!();

    for id in ["1", "2"] {
        let req = test::TestRequest::post()
            .uri(PATH)
            .set_json(launch_email(id))
            .to_request();
        test::call_service(&app, req).await;
    }

    let mut edited = launch_email("1");
    edited["name"] = json!("Launch Email (final)");
    edited["sendTime"] = json!("11:30");

    let req = test::TestRequest::put()
        .uri(PATH)
        .set_json(&edited)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let returned: Value = test::read_body_json(resp).await;
    assert_eq!(returned, edited);

    let req = test::TestRequest::get().uri(PATH).to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed, json!([edited, launch_email("2")]));
}

#[actix_web::test]
async fn update_of_unknown_id_changes_nothing() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri(PATH)
        .set_json(launch_email("1"))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::put()
        .uri(PATH)
        .set_json(launch_email("99"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri(PATH).to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed, json!([launch_email("1")]));
}

#[actix_web::test]
async fn update_accepts_sparse_body() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri(PATH)
        .set_json(launch_email("1"))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::put()
        .uri(PATH)
        .set_json(json!({
            "id": "1",
            "name": "x",
            "sendDate": "2024-06-01",
            "sendTime": "09:00",
            "type": "event",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri(PATH).to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed[0]["name"], "x");
    assert_eq!(listed[0]["timezone"], "America/New_York");
    assert!(listed[0].get("priorityScore").is_none());
}

#[actix_web::test]
async fn off_catalogue_records_do_not_block_the_collection() {
    let kv = Arc::new(MemoryStore::new());
    let webinar = json!({
        "id": "old",
        "name": "Webinar Invite",
        "sendDate": "2024-06-02",
        "sendTime": "13:00",
        "type": "webinar",
    });
    let broken = json!({ "id": "broken", "isTransactional": "yes" });
    kv.set("email-campaigns", &json!([webinar, broken]).to_string())
        .await
        .unwrap();
    let app = app!(kv);

    let req = test::TestRequest::get().uri(PATH).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let listed: Value = test::read_body_json(resp).await;
    assert_eq!(listed[0]["type"], "webinar");
    assert_eq!(listed[1], broken);

    let req = test::TestRequest::post()
        .uri(PATH)
        .set_json(launch_email("1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/api/email-campaigns/schedule?from=2024-06-01&days=7")
        .to_request();
    let scheduled: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<_> = scheduled.iter().map(|c| c["id"].clone()).collect();
    assert_eq!(ids, vec![json!("1"), json!("old")]);

    for id in ["old", "broken"] {
        let req = test::TestRequest::delete()
            .uri(PATH)
            .set_json(json!({ "id": id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get().uri(PATH).to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed, json!([launch_email("1")]));
}

#[actix_web::test]
async fn fractional_priority_score_is_kept() {
    let app = app!();

    let mut campaign = launch_email("1");
    campaign["priorityScore"] = json!(2.5);
    let req = test::TestRequest::post()
        .uri(PATH)
        .set_json(&campaign)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["priorityScore"], 2.5);
}

#[actix_web::test]
async fn options_runs_store_round_trip() {
    let app = app!();

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri(PATH)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert!(body["message"].is_string());
    assert!(body["timestamp"].is_string());
}

#[actix_web::test]
async fn storage_failures_are_server_errors() {
    let app = app!(Arc::new(UnreachableStore));

    let req = test::TestRequest::get().uri(PATH).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["details"]["reason"], "connection refused");

    let req = test::TestRequest::post()
        .uri(PATH)
        .set_json(launch_email("1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri(PATH)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn schedule_orders_by_date_then_priority() {
    let app = app!();

    let campaigns = [
        json!({ "id": "a", "name": "Newsletter", "sendDate": "2024-06-03", "sendTime": "08:00", "type": "nurture" }),
        json!({ "id": "b", "name": "Webinar", "sendDate": "2024-06-03", "sendTime": "08:00", "type": "event" }),
        json!({ "id": "c", "name": "Sale", "sendDate": "2024-06-02", "sendTime": "08:00", "type": "promotional" }),
        json!({ "id": "d", "name": "Far Out", "sendDate": "2024-09-01", "sendTime": "08:00", "type": "event" }),
    ];
    for campaign in &campaigns {
        let req = test::TestRequest::post()
            .uri(PATH)
            .set_json(campaign)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/api/email-campaigns/schedule?from=2024-06-01&days=14")
        .to_request();
    let scheduled: Vec<Value> = test::call_and_read_body_json(&app, req).await;

    let ids: Vec<_> = scheduled.iter().map(|c| c["id"].clone()).collect();
    assert_eq!(ids, vec![json!("c"), json!("b"), json!("a")]);
    assert_eq!(scheduled[1]["priorityScore"], 4);
    assert_eq!(scheduled[1]["timezone"], "America/New_York");
}

#[actix_web::test]
async fn schedule_rejects_bad_dates() {
    let app = app!();

    let req = test::TestRequest::get()
        .uri("/api/email-campaigns/schedule?from=tomorrow")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "E4001001");
}

#[actix_web::test]
async fn lists_campaign_types() {
    let app = app!();

    let req = test::TestRequest::get()
        .uri("/api/email-campaign-types")
        .to_request();
    let types: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(
        types,
        json!([
            { "value": "event", "label": "Event", "priorityScore": 4 },
            { "value": "promotional", "label": "Promotional", "priorityScore": 3 },
            { "value": "nurture", "label": "Nurture", "priorityScore": 2 },
            { "value": "other", "label": "Other", "priorityScore": 1 },
        ])
    );
}

#[actix_web::test]
async fn unknown_paths_are_not_found() {
    let app = app!();

    let req = test::TestRequest::get().uri("/api/nothing-here").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "E4041000");
    assert!(body.get("details").is_none());
}
