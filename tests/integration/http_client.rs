//! HTTP boundary: auth headers, status mapping, body decoding

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{api_config, COMPANY_TOKEN, USER_TOKEN};
use dte_extractor::config::{ApiConfig, ConfigError};
use dte_extractor::fetcher::http::ApiHttpClient;
use dte_extractor::fetcher::{ApiTransport, FailureKind, FetchError};

#[tokio::test]
async fn test_requests_carry_auth_headers_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dtes"))
        .and(header("authorization", USER_TOKEN))
        .and(header("company", COMPANY_TOKEN))
        .and(header("accept", "application/json"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"dtes": []}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiHttpClient::new(&api_config(&server)).unwrap();
    let body = client
        .get_json("/dtes", &[("page", "3".to_string())])
        .await
        .unwrap();
    assert_eq!(body["data"]["dtes"], json!([]));
}

#[tokio::test]
async fn test_status_is_carried_as_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clientes/9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vendedores"))
        .respond_with(ResponseTemplate::new(403).set_body_string("slow down"))
        .mount(&server)
        .await;

    let client = ApiHttpClient::new(&api_config(&server)).unwrap();

    let missing = client.get_json("/clientes/9", &[]).await.unwrap_err();
    assert_eq!(missing.status(), Some(404));
    assert_eq!(missing.classify(), FailureKind::NotFound);

    let throttled = client.get_json("/vendedores", &[]).await.unwrap_err();
    assert_eq!(
        throttled,
        FetchError::Status {
            status: 403,
            path: "/vendedores".to_string()
        }
    );
    assert_eq!(throttled.classify(), FailureKind::RateLimited);
}

#[tokio::test]
async fn test_invalid_json_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ciudades"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = ApiHttpClient::new(&api_config(&server)).unwrap();
    let err = client.get_json("/ciudades", &[]).await.unwrap_err();
    assert!(matches!(err, FetchError::Parse(_)));
    assert_eq!(err.classify(), FailureKind::Other);
}

#[tokio::test]
async fn test_unreachable_host_is_a_network_error() {
    let config = ApiConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        user_token: "u".to_string(),
        company_token: "c".to_string(),
    };
    let client = ApiHttpClient::new(&config).unwrap();
    let err = client.get_json("/dtes", &[]).await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
}

#[test]
fn test_invalid_token_is_rejected() {
    let config = ApiConfig {
        base_url: "https://api.example.com/".to_string(),
        user_token: "bad\ntoken".to_string(),
        company_token: "c".to_string(),
    };
    assert!(matches!(ApiHttpClient::new(&config), Err(ConfigError::Invalid(_))));
}
