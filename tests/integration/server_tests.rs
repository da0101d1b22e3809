/*!
 * HTTP endpoint tests against the full router
 */

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use moodgate::providers::mock::{MockClassifier, MockResponder};
use moodgate::server::router;

use crate::common::{build_scheduler, multipart_body};

const BOUNDARY: &str = "moodgate-test-boundary";

fn submit_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_analyzeEmotion_openGate_shouldReturn200WithResult() {
    let classifier = Arc::new(MockClassifier::working());
    let responder = Arc::new(MockResponder::working());
    let (scheduler, _store) = build_scheduler(classifier, responder);
    let app = router(scheduler);

    let body = multipart_body(BOUNDARY, b"frame-0", Some("hello"));
    let response = app
        .oneshot(submit_request("/analyze_emotion/?session=alice", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["emotion"], "joy");
    assert!(json["reply"].as_str().unwrap().contains("hello"));
}

#[tokio::test(start_paused = true)]
async fn test_analyzeEmotion_closedGate_shouldReturn202Queued() {
    let classifier = Arc::new(MockClassifier::working());
    let responder = Arc::new(MockResponder::working());
    let (scheduler, _store) = build_scheduler(classifier, responder);
    let app = router(scheduler);

    let first = multipart_body(BOUNDARY, b"frame-0", None);
    let response = app
        .clone()
        .oneshot(submit_request("/analyze_emotion/?session=alice", first))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let second = multipart_body(BOUNDARY, b"frame-1", None);
    let response = app
        .oneshot(submit_request("/analyze_emotion/?session=alice", second))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = json_body(response).await;
    assert_eq!(json["detail"], "queued");
}

#[tokio::test(start_paused = true)]
async fn test_analyzeEmotion_missingFileField_shouldReturn400() {
    let classifier = Arc::new(MockClassifier::working());
    let responder = Arc::new(MockResponder::working());
    let (scheduler, _store) = build_scheduler(classifier, responder);
    let app = router(scheduler);

    // A body with only the message part
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"message\"\r\n\r\nhi\r\n");
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let response = app
        .oneshot(submit_request("/analyze_emotion/", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["detail"].as_str().unwrap().contains("'file'"));
}

#[tokio::test(start_paused = true)]
async fn test_getResult_unknownSession_shouldReturnStatusNone() {
    let classifier = Arc::new(MockClassifier::working());
    let responder = Arc::new(MockResponder::working());
    let (scheduler, _store) = build_scheduler(classifier, responder);
    let app = router(scheduler);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/get_result/?session=ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "none");
    assert!(json.get("result").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_getResult_afterSubmit_shouldReturnStatusOk() {
    let classifier = Arc::new(MockClassifier::working());
    let responder = Arc::new(MockResponder::working());
    let (scheduler, _store) = build_scheduler(classifier, responder);
    let app = router(scheduler);

    let body = multipart_body(BOUNDARY, b"frame-0", None);
    app.clone()
        .oneshot(submit_request("/analyze_emotion/?session=alice", body))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/get_result/?session=alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["result"]["emotion"], "joy");
    assert_eq!(json["result"]["reply"], "");
}

#[tokio::test(start_paused = true)]
async fn test_sessionId_headerShouldTakePrecedenceOverQuery() {
    let classifier = Arc::new(MockClassifier::working());
    let responder = Arc::new(MockResponder::working());
    let (scheduler, store) = build_scheduler(classifier, responder);
    let app = router(scheduler);

    let body = multipart_body(BOUNDARY, b"frame-0", None);
    let request = Request::builder()
        .method("POST")
        .uri("/analyze_emotion/?session=from-query")
        .header("X-Session-Id", "from-header")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    app.oneshot(request).await.unwrap();

    assert!(store.last_result("from-header").is_some());
    assert!(store.last_result("from-query").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_sessionId_emptyQueryValue_shouldFallBackToDefault() {
    let classifier = Arc::new(MockClassifier::working());
    let responder = Arc::new(MockResponder::working());
    let (scheduler, store) = build_scheduler(classifier, responder);
    let app = router(scheduler);

    let body = multipart_body(BOUNDARY, b"frame-0", None);
    app.oneshot(submit_request("/analyze_emotion/?session=", body))
        .await
        .unwrap();

    assert!(store.last_result("default").is_some());
    assert!(store.last_result("").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_sessionId_absent_shouldFallBackToDefault() {
    let classifier = Arc::new(MockClassifier::working());
    let responder = Arc::new(MockResponder::working());
    let (scheduler, store) = build_scheduler(classifier, responder);
    let app = router(scheduler);

    let body = multipart_body(BOUNDARY, b"frame-0", None);
    app.oneshot(submit_request("/analyze_emotion/", body))
        .await
        .unwrap();

    assert!(store.last_result("default").is_some());
}
