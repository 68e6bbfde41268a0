//! HTTP provider tests against a local wiremock server

use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wattprint_resolvers::{
    CarbonProvider, ElectricityMapsProvider, GeoProvider, IpApiProvider, ManualClock,
    QueryClassifier, RemoteBatchClassifier, StaticIssuer, TimeApiProvider, TimeProvider,
    TokenCache, FALLBACK_CATEGORY,
};

fn queries(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

fn token_cache() -> TokenCache {
    TokenCache::new(
        Arc::new(StaticIssuer::new("test-token")),
        Arc::new(ManualClock::new(SystemTime::UNIX_EPOCH)),
    )
}

#[tokio::test]
async fn ip_api_provider_parses_success_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/8.8.8.8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "country": "Germany",
            "city": "Berlin",
            "lat": 52.52,
            "lon": 13.405,
            "timezone": "Europe/Berlin"
        })))
        .mount(&server)
        .await;

    let provider = IpApiProvider::new(reqwest::Client::new(), server.uri());
    let geo = provider.fetch("8.8.8.8").await.unwrap();

    assert_eq!(geo.country, "Germany");
    assert_eq!(geo.timezone, "Europe/Berlin");
    assert_eq!(geo.latitude, 52.52);
}

#[tokio::test]
async fn ip_api_provider_rejects_failed_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/10.0.0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "fail",
            "message": "private range"
        })))
        .mount(&server)
        .await;

    let provider = IpApiProvider::new(reqwest::Client::new(), server.uri());
    assert!(provider.fetch("10.0.0.1").await.is_err());
}

#[tokio::test]
async fn ip_api_provider_uses_bare_path_for_self() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "country": "India",
            "city": "Mumbai",
            "lat": 19.076,
            "lon": 72.8777,
            "timezone": "Asia/Kolkata"
        })))
        .mount(&server)
        .await;

    let provider = IpApiProvider::new(reqwest::Client::new(), server.uri());
    let geo = provider.fetch("self").await.unwrap();
    assert_eq!(geo.city, "Mumbai");
}

#[tokio::test]
async fn time_api_provider_parses_zone_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("timeZone", "Europe/Berlin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "year": 2025,
            "month": 1,
            "day": 15,
            "hour": 9,
            "minute": 30,
            "seconds": 12,
            "timeZone": "Europe/Berlin"
        })))
        .mount(&server)
        .await;

    let provider = TimeApiProvider::new(reqwest::Client::new(), server.uri());
    let time = provider.fetch("Europe/Berlin").await.unwrap();

    assert_eq!(time.month, 1);
    assert_eq!(time.day, 15);
    assert_eq!(time.hour, 9);
    assert!(!time.local_source);
}

#[tokio::test]
async fn carbon_provider_sends_auth_token_and_parses_intensity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("lat", "52.52"))
        .and(query_param("lon", "13.405"))
        .and(header("auth-token", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "carbonIntensity": 312,
            "units": "gCO2eq/kWh"
        })))
        .mount(&server)
        .await;

    let provider = ElectricityMapsProvider::new(
        reqwest::Client::new(),
        server.uri(),
        Some("secret".to_string()),
    );
    let intensity = provider.fetch(52.52, 13.405).await.unwrap();
    assert_eq!(intensity, 312.0);
}

#[tokio::test]
async fn carbon_provider_rejects_non_positive_intensity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "carbonIntensity": -5.0 })),
        )
        .mount(&server)
        .await;

    let provider = ElectricityMapsProvider::new(reqwest::Client::new(), server.uri(), None);
    assert!(provider.fetch(52.52, 13.405).await.is_err());
}

#[tokio::test]
async fn classifier_picks_top_class_per_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "instances": [
                { "Query": "write a poem" },
                { "Query": "fix this function" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [
                { "classes": ["text generation", "code generation"], "scores": [0.9, 0.1] },
                { "classes": ["text generation", "code generation"], "scores": [0.2, 0.8] }
            ]
        })))
        .mount(&server)
        .await;

    let classifier = RemoteBatchClassifier::new(
        reqwest::Client::new(),
        format!("{}/predict", server.uri()),
        token_cache(),
    );
    let labels = classifier
        .classify_batch(&queries(&["write a poem", "fix this function"]))
        .await;

    assert_eq!(labels, vec!["text generation", "code generation"]);
}

#[tokio::test]
async fn classifier_http_failure_defaults_whole_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let classifier = RemoteBatchClassifier::new(
        reqwest::Client::new(),
        format!("{}/predict", server.uri()),
        token_cache(),
    );
    let labels = classifier.classify_batch(&queries(&["a", "b", "c"])).await;

    assert_eq!(labels.len(), 3);
    assert!(labels.iter().all(|label| label == FALLBACK_CATEGORY));
}

#[tokio::test]
async fn one_malformed_prediction_defaults_whole_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [
                { "classes": ["text generation"], "scores": [0.9] },
                { "classes": [], "scores": [] }
            ]
        })))
        .mount(&server)
        .await;

    let classifier = RemoteBatchClassifier::new(
        reqwest::Client::new(),
        format!("{}/predict", server.uri()),
        token_cache(),
    );
    let labels = classifier.classify_batch(&queries(&["a", "b"])).await;

    assert_eq!(labels, vec![FALLBACK_CATEGORY, FALLBACK_CATEGORY]);
}

#[tokio::test]
async fn prediction_count_mismatch_defaults_whole_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [
                { "classes": ["text generation"], "scores": [0.9] }
            ]
        })))
        .mount(&server)
        .await;

    let classifier = RemoteBatchClassifier::new(
        reqwest::Client::new(),
        format!("{}/predict", server.uri()),
        token_cache(),
    );
    let labels = classifier.classify_batch(&queries(&["a", "b"])).await;

    assert_eq!(labels, vec![FALLBACK_CATEGORY, FALLBACK_CATEGORY]);
}

#[tokio::test]
async fn empty_batch_short_circuits() {
    let classifier = RemoteBatchClassifier::new(
        reqwest::Client::new(),
        "http://127.0.0.1:1/predict".to_string(),
        token_cache(),
    );
    let labels = classifier.classify_batch(&[]).await;
    assert!(labels.is_empty());
}
