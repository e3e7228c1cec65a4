//! Wire-level tests against a mock analyzer service.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use diskflow::{ExecutionStatus, ForecastAnalyzer, ForecastRequest, PollPolicy};
use diskflow_http_analyzer::HttpForecastAnalyzer;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> ForecastRequest {
    ForecastRequest::new(r#"timeseries ..., filter: dt.entity.disk == "DISK-1""#)
        .with_horizon_days(90)
        .with_coverage_probability(0.9)
        .with_path_count(200)
}

fn completed_body() -> serde_json::Value {
    json!({
        "result": {
            "executionStatus": "COMPLETED",
            "output": [{
                "analysisStatus": "OK",
                "forecastQualityAssessment": "VALID",
                "timeSeriesDataWithPredictions": {
                    "records": [{
                        "dt.entity.disk": "DISK-1",
                        "max(dt.host.disk.used.percent)": [94.0, 95.0],
                        "dt.davis.forecast.lower": [96.0, 101.0],
                        "dt.davis.forecast.upper": [99.0, 104.0]
                    }]
                }
            }]
        }
    })
}

#[tokio::test]
async fn test_submit_sends_contract_body_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(
            "/analyzers/davis.anomaly_detection.GenericForecastAnalyzer:execute",
        ))
        .and(header("Authorization", "Api-Token secret-token"))
        .and(body_partial_json(json!({
            "timeSeriesData": {
                "expression": r#"timeseries ..., filter: dt.entity.disk == "DISK-1""#
            },
            "forecastHorizon": 90,
            "coverageProbability": 0.9,
            "nPaths": 200,
            "useModelCache": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completed_body()))
        .expect(1)
        .mount(&server)
        .await;

    let analyzer = HttpForecastAnalyzer::new(server.uri(), "secret-token").unwrap();
    let response = analyzer.submit(&request()).await.unwrap();

    assert_eq!(response.status, ExecutionStatus::Completed);
    let records = response.result.unwrap().records;
    assert_eq!(records[0].disk_id.as_deref(), Some("DISK-1"));
    assert_eq!(records[0].lower_forecast, vec![96.0, 101.0]);
}

#[tokio::test]
async fn test_pending_submission_then_poll_with_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(
            "/analyzers/davis.anomaly_detection.GenericForecastAnalyzer:execute",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "requestToken": "token-42",
            "result": { "executionStatus": "RUNNING" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(
            "/analyzers/davis.anomaly_detection.GenericForecastAnalyzer:poll",
        ))
        .and(query_param("requestToken", "token-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completed_body()))
        .expect(1)
        .mount(&server)
        .await;

    let analyzer = HttpForecastAnalyzer::new(server.uri(), "secret-token").unwrap();
    let submitted = analyzer.submit(&request()).await.unwrap();
    assert_eq!(submitted.status, ExecutionStatus::Running);
    let token = submitted.request_token.unwrap();

    let polled = analyzer
        .poll("davis.anomaly_detection.GenericForecastAnalyzer", &token)
        .await
        .unwrap();
    assert_eq!(polled.status, ExecutionStatus::Completed);
}

#[tokio::test]
async fn test_poller_drives_http_analyzer_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(
            "/analyzers/davis.anomaly_detection.GenericForecastAnalyzer:execute",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "requestToken": "token-9",
            "result": { "executionStatus": "RUNNING" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(
            "/analyzers/davis.anomaly_detection.GenericForecastAnalyzer:poll",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(completed_body()))
        .mount(&server)
        .await;

    let analyzer = HttpForecastAnalyzer::new(server.uri(), "secret-token").unwrap();
    // Short real-time delays keep the test fast.
    let policy = PollPolicy {
        max_attempts: 5,
        max_elapsed: std::time::Duration::from_secs(5),
        initial_delay: std::time::Duration::from_millis(10),
        delay_increment: std::time::Duration::ZERO,
    };
    let poller = diskflow::ForecastPoller::new(&analyzer, policy);
    let result = poller.resolve(&request()).await.unwrap();
    assert_eq!(result.records.len(), 1);
}

#[tokio::test]
async fn test_server_error_maps_to_disk_scoped_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let analyzer = HttpForecastAnalyzer::new(server.uri(), "secret-token").unwrap();
    let err = analyzer.submit(&request()).await.unwrap_err();
    assert!(err.is_disk_scoped(), "got {err}");
    assert!(err.to_string().contains("503"), "got {err}");
}

#[tokio::test]
async fn test_garbage_response_maps_to_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let analyzer = HttpForecastAnalyzer::new(server.uri(), "secret-token").unwrap();
    let err = analyzer.submit(&request()).await.unwrap_err();
    assert!(err.is_disk_scoped(), "got {err}");
}

#[tokio::test]
async fn test_malformed_records_still_decode_leniently() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "executionStatus": "COMPLETED",
                "output": [{
                    "analysisStatus": "OK",
                    "forecastQualityAssessment": "VALID",
                    "timeSeriesDataWithPredictions": { "records": [{}] }
                }]
            }
        })))
        .mount(&server)
        .await;

    let analyzer = HttpForecastAnalyzer::new(server.uri(), "secret-token").unwrap();
    let response = analyzer.submit(&request()).await.unwrap();
    let records = response.result.unwrap().records;
    assert!(records[0].usage_history.is_empty());
    assert!(records[0].lower_forecast.is_empty());
}
