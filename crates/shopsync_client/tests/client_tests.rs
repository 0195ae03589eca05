use serde_json::json;
use shopsync_client::{
    ClientConfig, ClientError, HmacSigner, Method, PageLimit, RateLimitConfig, RetryConfig,
    ShopClient,
};
use std::time::Duration;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri(), "public-key", "secret-key")
        .with_timeout(Duration::from_secs(5))
        .with_retry(RetryConfig::new(2).with_initial_delay(Duration::from_millis(10)))
        .with_rate_limit(RateLimitConfig::new(2, Duration::from_millis(10)))
}

// ── Pagination ──────────────────────────────────────────────────

#[tokio::test]
async fn paged_listing_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest/v1/brands/"))
        .and(query_param("start", "0"))
        .and(query_param("size", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": 1, "name": "Acme"}, {"id": 2, "name": "Globex"}],
            "next": "/api/rest/v1/brands/?start=2&size=2"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rest/v1/brands/"))
        .and(query_param("start", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": 3, "name": "Initech"}],
            "next": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ShopClient::from_config(config(&server)).unwrap();
    let result = client.get_brands(2, PageLimit::All).await.unwrap();
    assert_eq!(result.total_pages, 2);
    assert_eq!(result.total_items, 3);
    assert_eq!(result.items[2]["name"], "Initech");
}

// ── Signing ─────────────────────────────────────────────────────

#[tokio::test]
async fn requests_carry_signature_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rest/v1/products/"))
        .and(header("x-public", "public-key"))
        .and(header_exists("x-hash"))
        .and(header_exists("x-date"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"name": "Jacket"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 99})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ShopClient::from_config(config(&server)).unwrap();
    let resp = client.create_product(&json!({"name": "Jacket"})).await.unwrap();
    assert_eq!(resp.status_code, 201);
    assert_eq!(resp.id(), Some(99));

    let received: Vec<Request> = server.received_requests().await.unwrap();
    let req = &received[0];
    let date = req.headers.get("x-date").unwrap().to_str().unwrap();
    let hash = req.headers.get("x-hash").unwrap().to_str().unwrap();
    let body = String::from_utf8(req.body.clone()).unwrap();
    let signer = HmacSigner::new(server.uri(), "public-key", "secret-key");
    let expected = signer.signature(Method::Post, req.url.as_str(), &body, date);
    assert_eq!(hash, expected);
}

// ── Resilience ──────────────────────────────────────────────────

#[tokio::test]
async fn rate_limited_then_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest/v1/products/5/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rest/v1/products/5/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
        .mount(&server)
        .await;

    let client = ShopClient::from_config(config(&server)).unwrap();
    let resp = client.get_product(5).await.unwrap();
    assert_eq!(resp.id(), Some(5));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn rate_limit_budget_spent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = ShopClient::from_config(config(&server)).unwrap();
    let err = client.get_product(5).await.unwrap_err();
    assert!(matches!(err, ClientError::RateLimited { attempts: 3 }));
}

#[tokio::test]
async fn remote_rejection_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/rest/v1/productphotos/4/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ShopClient::from_config(config(&server)).unwrap();
    let err = client.delete_photo(4).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn unreachable_host_exhausts_connection_retries() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let config = ClientConfig::new(uri, "public-key", "secret-key")
        .with_retry(RetryConfig::new(2).with_initial_delay(Duration::from_millis(1)));
    let client = ShopClient::from_config(config).unwrap();
    let err = client.get_product(1).await.unwrap_err();
    assert!(matches!(err, ClientError::Connection { attempts: 3, .. }));
}

#[test]
fn from_config_validates() {
    let err = ShopClient::from_config(ClientConfig::new("https://x", "", "")).unwrap_err();
    assert!(matches!(err, ClientError::InvalidConfig(_)));
}
