use std::time::Duration;

use finder_core::{
    BulkKind, BulkOptions, ConfidenceMode, EmailStatus, ErrorClassifier, FindRequest, JobStatus,
    JobType, RequestFailure, VerifyRequest, TIMEOUT_MESSAGE,
};
use finder_engine::{ApiSettings, CsvUpload, FinderApi, ReqwestApi};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> ReqwestApi {
    let settings = ApiSettings::new(&server.uri()).expect("mock server uri is valid");
    ReqwestApi::new(settings).expect("client builds")
}

#[tokio::test]
async fn find_posts_request_and_returns_results_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/find"))
        .and(body_partial_json(json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "domain": "example.com",
            "max_results": 2,
            "include_default_patterns": true,
            "fast_mode": false,
            "confidence_mode": "balanced",
            "custom_patterns": ["{first}.{last}"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"email": "ada.lovelace@example.com", "status": "valid", "confidence": 0.92, "reason": "SMTP accepted"},
            {"email": "alovelace@example.com", "status": "catch-all", "confidence": 0.4, "reason": "Domain accepts all"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let request =
        FindRequest::new("Ada", "Lovelace", "example.com").with_custom_patterns_text("{first}.{last}\n");
    let results = api_for(&server).find(&request).await.expect("find ok");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].email, "ada.lovelace@example.com");
    assert_eq!(results[0].status, EmailStatus::Valid);
    assert_eq!(results[0].confidence, Some(0.92));
    assert_eq!(results[1].status, EmailStatus::CatchAll);
}

#[tokio::test]
async fn verify_returns_single_result_with_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verify"))
        .and(body_partial_json(json!({
            "email": "grace@example.com",
            "fast_mode": true,
            "confidence_mode": "aggressive"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "grace@example.com",
            "status": "invalid",
            "confidence": 0.0,
            "reason": "Domain has no valid MX records",
            "details": {"mx_check": {"valid": false}}
        })))
        .mount(&server)
        .await;

    let request = VerifyRequest {
        email: "grace@example.com".into(),
        fast_mode: true,
        confidence_mode: ConfidenceMode::Aggressive,
    };
    let result = api_for(&server).verify(&request).await.expect("verify ok");

    assert_eq!(result.status, EmailStatus::Invalid);
    assert_eq!(result.reason, "Domain has no valid MX records");
    assert_eq!(result.details, Some(json!({"mx_check": {"valid": false}})));
}

#[tokio::test]
async fn slow_find_times_out_with_fixed_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/find"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(json!([])),
        )
        .mount(&server)
        .await;

    let mut settings = ApiSettings::new(&server.uri()).unwrap();
    settings.request_timeout = Duration::from_millis(50);
    let api = ReqwestApi::new(settings).unwrap();

    let err = api
        .find(&FindRequest::new("Ada", "Lovelace", "example.com"))
        .await
        .unwrap_err();
    assert_eq!(err, RequestFailure::Timeout);
    assert_eq!(ErrorClassifier::new(server.uri()).message(&err), TIMEOUT_MESSAGE);
}

#[tokio::test]
async fn server_detail_is_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verify"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "SMTP pool exhausted"})),
        )
        .mount(&server)
        .await;

    let err = api_for(&server)
        .verify(&VerifyRequest::new("x@example.com"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RequestFailure::Rejected {
            status: 500,
            detail: Some("SMTP pool exhausted".into()),
        }
    );
}

#[tokio::test]
async fn plain_error_body_has_no_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/j1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let err = api_for(&server).job_status("j1").await.unwrap_err();
    assert_eq!(
        err,
        RequestFailure::Rejected {
            status: 404,
            detail: None,
        }
    );
    assert_eq!(
        ErrorClassifier::default().message(&err),
        "Request failed with status code 404"
    );
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    // Mock servers are pooled and keep listening after drop; use a freed port instead.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let settings = ApiSettings::new(&uri).unwrap();
    let api = ReqwestApi::new(settings).unwrap();
    let err = api
        .verify(&VerifyRequest::new("x@example.com"))
        .await
        .unwrap_err();

    assert_eq!(err, RequestFailure::Unreachable);
    assert_eq!(
        ErrorClassifier::new(uri.clone()).message(&err),
        format!("Cannot connect to backend server. Make sure it's running on {uri}.")
    );
}

#[tokio::test]
async fn bulk_submission_is_multipart_with_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bulk-verify"))
        .and(body_string_contains("name=\"file\"; filename=\"emails.csv\""))
        .and(body_string_contains("email\nada@example.com\n"))
        .and(body_string_contains("name=\"fast_mode\"\r\n\r\ntrue"))
        .and(body_string_contains("name=\"confidence_mode\"\r\n\r\naggressive"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"job_id": "job-7", "total_rows": 1})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let upload = CsvUpload {
        file_name: "emails.csv".into(),
        bytes: b"email\nada@example.com\n".to_vec(),
    };
    let options = BulkOptions {
        fast_mode: true,
        confidence_mode: ConfidenceMode::Aggressive,
    };
    let response = api_for(&server)
        .submit_bulk(BulkKind::Verify, upload, options)
        .await
        .expect("submit ok");

    assert_eq!(response.job_id.as_deref(), Some("job-7"));
    assert_eq!(response.total_rows, Some(1));
}

#[tokio::test]
async fn bulk_find_uses_its_own_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bulk-find"))
        .and(body_string_contains("name=\"fast_mode\"\r\n\r\nfalse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total_rows": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let upload = CsvUpload {
        file_name: "people.csv".into(),
        bytes: b"first_name,last_name,domain\n".to_vec(),
    };
    let response = api_for(&server)
        .submit_bulk(BulkKind::Find, upload, BulkOptions::default())
        .await
        .expect("submit ok");

    // Missing job id is the controller's problem, not the transport's.
    assert_eq!(response.job_id, None);
}

#[tokio::test]
async fn job_status_parses_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/job-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "job-7",
            "type": "bulk_verify",
            "status": "running",
            "progress": 40.0,
            "total_rows": 5,
            "processed_rows": 2,
            "success_rows": 1,
            "error_rows": 1,
            "download_ready": false,
            "recent_errors": ["row 2: timeout"]
        })))
        .mount(&server)
        .await;

    let job = api_for(&server).job_status("job-7").await.expect("status ok");
    assert_eq!(job.id, "job-7");
    assert_eq!(job.job_type, JobType::BulkVerify);
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.processed_rows, 2);
    assert_eq!(job.message, None);
    assert_eq!(job.recent_errors, vec!["row 2: timeout".to_string()]);
}

#[tokio::test]
async fn garbage_status_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/job-7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = api_for(&server).job_status("job-7").await.unwrap_err();
    assert!(matches!(err, RequestFailure::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn download_returns_bytes_and_suggested_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/job-7/download"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "content-disposition",
                    "attachment; filename=\"email_verifier_results_20250101_101010.csv\"",
                )
                .set_body_raw("email,status\nada@example.com,valid\n", "text/csv"),
        )
        .mount(&server)
        .await;

    let payload = api_for(&server).download("job-7").await.expect("download ok");
    assert_eq!(payload.bytes, b"email,status\nada@example.com,valid\n");
    assert_eq!(
        payload.suggested_name.as_deref(),
        Some("email_verifier_results_20250101_101010.csv")
    );
}

#[tokio::test]
async fn download_rejects_oversized_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/big/download"))
        .respond_with(ResponseTemplate::new(200).set_body_string("0123456789abcdef"))
        .mount(&server)
        .await;

    let mut settings = ApiSettings::new(&server.uri()).unwrap();
    settings.max_download_bytes = 8;
    let api = ReqwestApi::new(settings).unwrap();

    let err = api.download("big").await.unwrap_err();
    assert!(matches!(err, RequestFailure::Other(Some(_))), "got {err:?}");
}
