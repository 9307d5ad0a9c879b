//! End-to-end lifecycle tests against a real listener.

use std::time::{Duration, Instant};

use axum::{routing::get, Router};
use reqwest::StatusCode;

mod common;

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_millis(600)).await;
    "done"
}

async fn hang() -> &'static str {
    std::future::pending::<()>().await;
    "unreachable"
}

async fn explode() -> &'static str {
    panic!("boom")
}

fn routes() -> Router {
    Router::new()
        .route("/slow", get(slow))
        .route("/hang", get(hang))
        .route("/panic", get(explode))
}

#[tokio::test]
async fn test_health_and_metrics_over_http() {
    let service = common::start_service(routes(), Duration::from_secs(10)).await;
    let client = common::client();

    let res = client.get(service.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "OK");

    let res = client.get(service.url("/metrics")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("http_requests_total"));

    service.shutdown.trigger();
    service.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_panicking_handler_returns_500_and_server_survives() {
    let service = common::start_service(routes(), Duration::from_secs(10)).await;
    let client = common::client();

    let res = client.get(service.url("/panic")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Internal Server Error");

    let res = client.get(service.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    service.shutdown.trigger();
    service.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_in_flight_request_completes_during_shutdown() {
    let service = common::start_service(routes(), Duration::from_secs(10)).await;
    let client = common::client();

    let in_flight = tokio::spawn({
        let client = client.clone();
        let url = service.url("/slow");
        async move { client.get(url).send().await }
    });
    tokio::time::sleep(Duration::from_millis(150)).await;

    service.shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(150)).await;

    // Listener is closed: new connections are refused.
    let rejected = client.get(service.url("/health")).send().await;
    assert!(rejected.is_err(), "new connection accepted after shutdown signal");

    let res = in_flight.await.unwrap().expect("in-flight request dropped");
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "done");

    let result = tokio::time::timeout(Duration::from_secs(5), service.handle)
        .await
        .expect("supervisor did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_hung_request_is_abandoned_at_deadline() {
    let deadline = Duration::from_millis(300);
    let service = common::start_service(routes(), deadline).await;
    let client = common::client();

    let url = service.url("/hang");
    let _hung = tokio::spawn(async move { client.get(url).send().await });
    tokio::time::sleep(Duration::from_millis(150)).await;

    let started = Instant::now();
    service.shutdown.trigger();

    let result = tokio::time::timeout(Duration::from_secs(5), service.handle)
        .await
        .expect("supervisor hung past the shutdown deadline")
        .unwrap();
    assert!(result.is_ok());

    let elapsed = started.elapsed();
    assert!(elapsed >= deadline, "returned before the deadline: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "took too long: {elapsed:?}");
}
