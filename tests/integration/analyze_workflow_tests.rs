/*!
 * End-to-end submit/poll workflow tests
 *
 * These drive the router the way the frontend does: a burst of frames for a
 * session, then polling until the coalesced result lands.
 */

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use moodgate::providers::mock::{MockClassifier, MockResponder};
use moodgate::server::router;

use crate::common::{build_scheduler, multipart_body, sorrow_face};

const BOUNDARY: &str = "moodgate-workflow-boundary";

fn submit_request(session: &str, image: &[u8], message: Option<&str>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/analyze_emotion/?session={}", session))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(BOUNDARY, image, message)))
        .unwrap()
}

fn poll_request(session: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/get_result/?session={}", session))
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_workflow_burstOfFrames_shouldCoalesceToFreshest() {
    let classifier = Arc::new(MockClassifier::with_faces(vec![sorrow_face()]));
    let responder = Arc::new(MockResponder::working());
    let (scheduler, _store) = build_scheduler(Arc::clone(&classifier), responder);
    let app = router(scheduler);

    // First frame processes immediately
    let response = app
        .clone()
        .oneshot(submit_request("alice", b"frame-0", Some("I miss my dog")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["emotion"], "sorrow");
    assert!(json["reply"].as_str().unwrap().contains("I miss my dog"));

    // A burst inside the rate window is queued, newest frame winning
    for (offset_ms, frame) in [(300u64, b"frame-1" as &[u8]), (200, b"frame-2")] {
        tokio::time::advance(Duration::from_millis(offset_ms)).await;
        let response = app
            .clone()
            .oneshot(submit_request("alice", frame, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    // Polling before the deferred task fires still shows the first result
    let json = json_body(app.clone().oneshot(poll_request("alice")).await.unwrap()).await;
    assert_eq!(json["status"], "ok");
    assert!(json["result"]["reply"].as_str().unwrap().contains("I miss my dog"));

    // After the debounce delay the freshest frame has been classified
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let json = json_body(app.oneshot(poll_request("alice")).await.unwrap()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["result"]["emotion"], "sorrow");
    assert_eq!(json["result"]["reply"], "");
    assert_eq!(classifier.call_count(), 2);
    assert_eq!(classifier.last_image(), Some(b"frame-2".to_vec()));
}

#[tokio::test(start_paused = true)]
async fn test_workflow_twoSessions_shouldNotInterfere() {
    let classifier = Arc::new(MockClassifier::working());
    let responder = Arc::new(MockResponder::working());
    let (scheduler, _store) = build_scheduler(Arc::clone(&classifier), responder);
    let app = router(scheduler);

    let response = app
        .clone()
        .oneshot(submit_request("alice", b"a-0", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // bob's first frame is not gated by alice's submission
    let response = app
        .clone()
        .oneshot(submit_request("bob", b"b-0", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Each session polls its own result
    let json = json_body(app.clone().oneshot(poll_request("alice")).await.unwrap()).await;
    assert_eq!(json["status"], "ok");
    let json = json_body(app.oneshot(poll_request("carol")).await.unwrap()).await;
    assert_eq!(json["status"], "none");
}

#[tokio::test(start_paused = true)]
async fn test_workflow_classifierOutage_shouldKeepServingNeutral() {
    let classifier = Arc::new(MockClassifier::failing());
    let responder = Arc::new(MockResponder::working());
    let (scheduler, _store) = build_scheduler(classifier, responder);
    let app = router(scheduler);

    let response = app
        .clone()
        .oneshot(submit_request("alice", b"frame-0", Some("hi")))
        .await
        .unwrap();

    // The outage is invisible at the protocol level
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["emotion"], "neutral");
}
