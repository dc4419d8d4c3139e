//! Request layer behaviour across its parts: scheduler bound, batching,
//! rate limiting and caching working together.

use std::time::{Duration, Instant};

use gapfinder_domain::{Config, FetchError, FetchErrorKind};
use gapfinder_infra::{FetchRequest, RequestLayer};
use reqwest::Method;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config() -> Config {
    let mut config = Config::default();
    config.requests.initial_retry_delay_ms = 5;
    config.requests.max_retry_delay_ms = 20;
    config.batch.inter_batch_delay_ms = 0;
    config
}

fn url(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
}

#[tokio::test]
async fn test_batches_split_and_keep_order() {
    let server = MockServer::start().await;
    for index in 0..7 {
        Mock::given(method("GET"))
            .and(path(format!("/items/{index}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "index": index })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = config();
    config.batch.batch_size = 3;
    let layer = RequestLayer::from_config(&config).unwrap();
    let requests =
        (0..7).map(|index| FetchRequest::get(url(&server, &format!("/items/{index}")))).collect();

    let run = layer.run_batches(requests).await;

    assert_eq!(run.chunks, 3);
    assert_eq!(run.succeeded(), 7);
    let indices: Vec<_> =
        run.results.iter().map(|result| result.as_ref().unwrap()["index"].clone()).collect();
    assert_eq!(indices, (0..7).map(|index| json!(index)).collect::<Vec<_>>());
    assert_eq!(layer.scheduler_metrics().completed, 7);
}

#[tokio::test]
async fn test_scheduler_bounds_parallel_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let mut config = config();
    config.requests.max_concurrent_requests = 2;
    config.batch.batch_size = 6;
    let layer = RequestLayer::from_config(&config).unwrap();
    // POST keeps every request out of the cache.
    let requests = (0..6)
        .map(|index| {
            FetchRequest::new(Method::POST, url(&server, "/slow"))
                .with_json(json!({ "n": index }))
        })
        .collect();

    let started = Instant::now();
    let run = layer.run_batches(requests).await;

    assert_eq!(run.succeeded(), 6);
    assert!(started.elapsed() >= Duration::from_millis(550));
    let metrics = layer.scheduler_metrics();
    assert_eq!((metrics.active_count, metrics.queued_count), (0, 0));
}

#[tokio::test]
async fn test_rate_limit_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .expect(1)
        .mount(&server)
        .await;

    let layer = RequestLayer::from_config(&config()).unwrap();
    let err = layer.fetch(&FetchRequest::get(url(&server, "/limited"))).await.unwrap_err();

    assert_eq!(err, FetchError::RateLimited { retry_after_secs: 7 });
    assert!(layer.rate_limits().is_limited());
}

#[tokio::test]
async fn test_cached_response_served_while_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendars"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let layer = RequestLayer::from_config(&config()).unwrap();
    let calendars = FetchRequest::get(url(&server, "/calendars"));
    layer.fetch(&calendars).await.unwrap();
    layer.fetch(&FetchRequest::get(url(&server, "/limited"))).await.unwrap_err();

    assert_eq!(layer.fetch(&calendars).await.unwrap(), json!({ "items": [] }));

    layer.reset();
    assert!(!layer.rate_limits().is_limited());
    assert_eq!(layer.cache_stats().size, 0);
}

#[tokio::test]
async fn test_server_errors_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let layer = RequestLayer::from_config(&config()).unwrap();
    let value = layer.fetch(&FetchRequest::get(url(&server, "/flaky"))).await.unwrap();

    assert_eq!(value, json!({ "ok": true }));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_exhausted_retries_surface_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let layer = RequestLayer::from_config(&config()).unwrap();
    let err = layer.fetch(&FetchRequest::get(url(&server, "/down"))).await.unwrap_err();

    assert_eq!(err.kind(), FetchErrorKind::Temporary);
    assert_eq!(err.status(), Some(503));
}
