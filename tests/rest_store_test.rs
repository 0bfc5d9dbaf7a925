// RestStore against a mock PostgREST server.
// Run with: cargo test --test rest_store_test

use pushsub::store::{RestStore, SubscriptionStore};
use pushsub::PushSubscriptionRecord;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn record() -> PushSubscriptionRecord {
    PushSubscriptionRecord {
        endpoint: "https://push.example/abc".to_string(),
        p256dh: "BNcRdreALRFXTkOOUHK1EtK2wtaz5Ry4YfYCA_0QTpQtUbVlUls0VJXg7A8u-Ts1XbjhazAkj7I99e8QcYP7DkM".to_string(),
        auth: "tBHItJI5svbpez7KI4CCXg==".to_string(),
    }
}

fn store(server: &MockServer) -> RestStore {
    RestStore::new(
        &server.uri(),
        "anon-key".to_string(),
        "push_subscriptions".to_string(),
    )
    .expect("build store")
}

#[tokio::test]
async fn test_upsert_posts_merge_duplicates_on_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/push_subscriptions"))
        .and(query_param("on_conflict", "endpoint"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .and(header("prefer", "resolution=merge-duplicates,return=minimal"))
        .and(body_json(serde_json::json!([{
            "endpoint": "https://push.example/abc",
            "p256dh": record().p256dh,
            "auth": "tBHItJI5svbpez7KI4CCXg==",
        }])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    store(&server).upsert(&record()).await.expect("upsert");
}

#[tokio::test]
async fn test_postgrest_error_body_is_parsed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "code": "42501",
            "details": null,
            "hint": null,
            "message": "new row violates row-level security policy for table \"push_subscriptions\"",
        })))
        .mount(&server)
        .await;

    let err = store(&server)
        .upsert(&record())
        .await
        .expect_err("upsert must fail");

    assert_eq!(err.kind(), "42501");
    assert_eq!(err.status, Some(401));
    assert!(err.message.contains("row-level security"));
}

#[tokio::test]
async fn test_plain_text_error_body_becomes_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad gateway"))
        .mount(&server)
        .await;

    let err = store(&server)
        .upsert(&record())
        .await
        .expect_err("upsert must fail");

    assert_eq!(err.kind(), "PersistenceError");
    assert_eq!(err.message, "Bad gateway");
    assert_eq!(err.status, Some(502));
}

#[tokio::test]
async fn test_empty_error_body_uses_status_reason() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = store(&server)
        .upsert(&record())
        .await
        .expect_err("upsert must fail");

    assert_eq!(err.message, "Not Found");
    assert_eq!(err.status, Some(404));
}

#[tokio::test]
async fn test_unreachable_backend_is_fetch_error() {
    // Reserve a free port, then close it so connections are refused
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let uri = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);

    let err = RestStore::new(&uri, "anon-key".to_string(), "push_subscriptions".to_string())
        .expect("build store")
        .upsert(&record())
        .await
        .expect_err("upsert must fail");

    assert_eq!(err.kind(), "FetchError");
    assert_eq!(err.status, None);
}
