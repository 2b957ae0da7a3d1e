use serde_json::json;
use std::time::Duration;
use veogen::{
    generate, Backoff, OperationClient, PollPolicy, RequestOptions, VeoClient, VeoGenError,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str = "/v1beta/models/veo-3.1-fast-generate-preview:predictLongRunning";
const OPERATION: &str = "models/veo-3.1-fast-generate-preview/operations/abc123";

fn client(server: &MockServer) -> VeoClient {
    VeoClient::builder()
        .api_key("test-key")
        .base_url(format!("{}/v1beta", server.uri()))
        .build()
        .unwrap()
}

fn fast_policy() -> PollPolicy {
    PollPolicy {
        backoff: Backoff::Fixed(Duration::from_millis(10)),
        ..PollPolicy::default()
    }
}

#[tokio::test]
async fn test_submit_poll_and_download() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "instances": [{"prompt": "sunset over water"}],
            "parameters": {"aspectRatio": "16:9", "durationSeconds": 8, "sampleCount": 1}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": OPERATION})))
        .expect(1)
        .mount(&server)
        .await;

    let op_path = format!("/v1beta/{OPERATION}");
    Mock::given(method("GET"))
        .and(path(op_path.as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"name": OPERATION, "done": false})),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    let video_uri = format!("{}/v1beta/files/vid:download?alt=media", server.uri());
    Mock::given(method("GET"))
        .and(path(op_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [{"video": {"uri": video_uri}}]
                }
            }
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1beta/files/vid:download"))
        .and(query_param("alt", "media"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake mp4".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.mp4");
    let mut polls = 0;
    let outcome = generate(
        &client(&server),
        &RequestOptions::new("sunset over water").with_model("fast"),
        &out,
        fast_policy(),
        |_| {},
        |_| polls += 1,
    )
    .await
    .unwrap();

    assert_eq!(outcome.model, "veo-3.1-fast-generate-preview");
    assert_eq!(outcome.saved(), &[out.clone()]);
    assert_eq!(std::fs::read(&out).unwrap(), b"fake mp4");
    assert_eq!(polls, 2);
}

#[tokio::test]
async fn test_submission_rejection_is_verbatim_and_not_retried() {
    let server = MockServer::start().await;
    let body = r#"{"error": {"code": 400, "message": "aspectRatio 4:3 is not supported"}}"#;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = generate(
        &client(&server),
        &RequestOptions::new("x"),
        dir.path().join("out.mp4"),
        fast_policy(),
        |_| {},
        |_| {},
    )
    .await
    .unwrap_err();

    match err {
        VeoGenError::Submission { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, body);
        }
        other => panic!("expected Submission, got {other:?}"),
    }
    assert!(!dir.path().join("out.mp4").exists());
}

#[tokio::test]
async fn test_rejected_key_on_submit_is_credential_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let request = veogen::build_request(&RequestOptions::new("x"))
        .unwrap()
        .request;
    let err = client(&server).submit(&request).await.unwrap_err();
    assert!(matches!(err, VeoGenError::Credential(msg) if msg == "API key not valid"));
}

#[tokio::test]
async fn test_inline_results_with_one_missing_item() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(body_partial_json(json!({"parameters": {"sampleCount": 2}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": true,
            "response": {"videos": [{"bytesBase64Encoded": "AQID"}, {}]}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let outcome = generate(
        &client(&server),
        &RequestOptions::new("x").with_video_count(2),
        dir.path().join("clip.mp4"),
        fast_policy(),
        |_| {},
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(outcome.saved(), &[dir.path().join("clip-1.mp4")]);
    assert_eq!(outcome.report.skipped.len(), 1);
    assert_eq!(
        std::fs::read(dir.path().join("clip-1.mp4")).unwrap(),
        vec![1, 2, 3]
    );
}

#[tokio::test]
async fn test_empty_response_is_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": []}}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = generate(
        &client(&server),
        &RequestOptions::new("x"),
        dir.path().join("out.mp4"),
        fast_policy(),
        |_| {},
        |_| {},
    )
    .await
    .unwrap_err();

    assert!(matches!(err, VeoGenError::NoResults));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_list_models_follows_pages_and_keeps_video_models() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .and(query_param("pageToken", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{
                "name": "models/veo-2.0-generate-001",
                "supportedGenerationMethods": ["predictLongRunning"]
            }]
        })))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {
                    "name": "models/veo-3.1-generate-preview",
                    "displayName": "Veo 3.1",
                    "supportedGenerationMethods": ["predictLongRunning"]
                },
                {
                    "name": "models/gemini-2.5-flash",
                    "supportedGenerationMethods": ["generateContent"]
                }
            ],
            "nextPageToken": "page2"
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    let models = client(&server).list_models().await.unwrap();
    let ids: Vec<_> = models.iter().map(|m| m.id()).collect();
    assert_eq!(ids, vec!["veo-3.1-generate-preview", "veo-2.0-generate-001"]);
}

#[tokio::test]
async fn test_transient_poll_error_retried_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": OPERATION})))
        .mount(&server)
        .await;

    let op_path = format!("/v1beta/{OPERATION}");
    Mock::given(method("GET"))
        .and(path(op_path.as_str()))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(op_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": true,
            "response": {"videos": [{"bytesBase64Encoded": "AQID"}]}
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let policy = PollPolicy {
        max_fetch_retries: 1,
        ..fast_policy()
    };
    let outcome = generate(
        &client(&server),
        &RequestOptions::new("x"),
        dir.path().join("out"),
        policy,
        |_| {},
        |_| {},
    )
    .await
    .unwrap();
    assert_eq!(outcome.saved(), &[dir.path().join("out.mp4")]);
}

#[tokio::test]
async fn test_malformed_operation_body_is_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"name\": "))
        .mount(&server)
        .await;

    let request = veogen::build_request(&RequestOptions::new("x"))
        .unwrap()
        .request;
    let err = client(&server).submit(&request).await.unwrap_err();
    assert!(matches!(err, VeoGenError::Json(_)));
}
