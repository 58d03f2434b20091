use chrono::NaiveDate;
use planner_sync::config::SyncConfig;
use planner_sync::error::SyncError;
use planner_sync::gateway::{HttpGateway, RemoteGateway};
use planner_types::{Collection, RecordId, RecordPayload, Task};
use serde_json::json;
use wiremock::matchers::{body_json_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway_for(server: &MockServer) -> HttpGateway {
    let config = SyncConfig {
        api_base_url: server.uri(),
        ..SyncConfig::default()
    };
    HttpGateway::new(&config)
}

fn make_task() -> Task {
    Task::new(
        RecordId::new(),
        "Book dentist",
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap(),
    )
}

fn envelope(record: &RecordPayload) -> serde_json::Value {
    json!({ "data": record, "error": null })
}

#[tokio::test]
async fn create_posts_to_collection_endpoint() {
    let server = MockServer::start().await;
    let record = RecordPayload::Task(make_task());
    Mock::given(method("POST"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(envelope(&record)))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let stored = gateway.create(&record).await.unwrap();
    assert_eq!(stored, record);
}

#[tokio::test]
async fn update_patches_record_endpoint() {
    let server = MockServer::start().await;
    let task = make_task();
    let mut updated = task.clone();
    updated.title = "Book dentist for Leo".to_string();
    let updated = RecordPayload::Task(updated);
    Mock::given(method("PATCH"))
        .and(path(format!("/api/tasks/{}", task.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&updated)))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let stored = gateway
        .update(
            Collection::Tasks,
            task.id,
            &json!({"title": "Book dentist for Leo"}),
        )
        .await
        .unwrap();
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn delete_hits_record_endpoint() {
    let server = MockServer::start().await;
    let id = RecordId::new();
    Mock::given(method("DELETE"))
        .and(path(format!("/api/events/{id}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    gateway.delete(Collection::Events, id).await.unwrap();
}

#[tokio::test]
async fn fetch_one_returns_none_on_404() {
    let server = MockServer::start().await;
    let id = RecordId::new();
    Mock::given(method("GET"))
        .and(path(format!("/api/tasks/{id}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let result = gateway.fetch_one(Collection::Tasks, id).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn fetch_one_returns_record() {
    let server = MockServer::start().await;
    let record = RecordPayload::Task(make_task());
    Mock::given(method("GET"))
        .and(path(format!("/api/tasks/{}", record.id())))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&record)))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let fetched = gateway
        .fetch_one(Collection::Tasks, record.id())
        .await
        .unwrap();
    assert_eq!(fetched, Some(record));
}

#[tokio::test]
async fn list_sends_family_and_filter_params() {
    let server = MockServer::start().await;
    let family_id = RecordId::new();
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .and(query_param("family_id", family_id.to_string()))
        .and(query_param("status", "pending"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": [], "error": null })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let filters = vec![("status".to_string(), json!("pending"))];
    let records = gateway
        .list(Collection::Tasks, family_id, &filters)
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn envelope_error_surfaces_as_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": null, "error": "family quota exceeded" })),
        )
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .create(&RecordPayload::Task(make_task()))
        .await
        .unwrap_err();
    match err {
        SyncError::Api(message) => assert_eq!(message, "family quota exceeded"),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn http_error_status_is_api_not_connectivity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .create(&RecordPayload::Task(make_task()))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Api(_)));
    assert!(!err.is_connectivity());
}

#[tokio::test]
async fn unreachable_host_is_connectivity_error() {
    let config = SyncConfig {
        // Port 1 refuses connections immediately.
        api_base_url: "http://127.0.0.1:1".to_string(),
        request_timeout_secs: 2,
        ..SyncConfig::default()
    };
    let gateway = HttpGateway::new(&config);
    let err = gateway
        .create(&RecordPayload::Task(make_task()))
        .await
        .unwrap_err();
    assert!(err.is_connectivity());
}

#[tokio::test]
async fn bearer_token_is_attached_when_set() {
    let server = MockServer::start().await;
    let record = RecordPayload::Task(make_task());
    Mock::given(method("POST"))
        .and(path("/api/tasks"))
        .and(header("authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(envelope(&record)))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    gateway.set_token("session-token").await;
    gateway.create(&record).await.unwrap();
}

#[tokio::test]
async fn create_sends_collection_tagged_body() {
    let server = MockServer::start().await;
    let record = RecordPayload::Task(make_task());
    let expected_body = serde_json::to_string(&record).unwrap();
    Mock::given(method("POST"))
        .and(path("/api/tasks"))
        .and(body_json_string(&expected_body))
        .respond_with(ResponseTemplate::new(201).set_body_json(envelope(&record)))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    gateway.create(&record).await.unwrap();
}
