mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{channel_config, RecordingSink, ScriptedChannel, ScriptedChannelFactory, StaticDirectory};
use sana_consult::http::{create_router, AppState};
use sana_consult::ChannelConfig;
use std::sync::Arc;
use tower::ServiceExt;

fn test_state(cfg: ChannelConfig) -> (AppState, Arc<ScriptedChannel>, Arc<RecordingSink>) {
    let channel = ScriptedChannel::new();
    let sink = RecordingSink::new();

    let reports: Arc<dyn sana_consult::ReportSink> = sink.clone();
    let state = AppState::new(
        Arc::new(StaticDirectory {
            known: vec!["sess-1".to_string()],
        }),
        reports,
        Arc::new(ScriptedChannelFactory {
            channel: Arc::clone(&channel),
        }),
        cfg,
    );

    (state, channel, sink)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (state, _, _) = test_state(channel_config(Some("key")));
    let router = create_router(state);

    let response = router.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_start_unknown_session_is_404() {
    let (state, channel, _) = test_state(channel_config(Some("key")));
    let router = create_router(state);

    let response = router.oneshot(post("/consults/nope/start")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!channel.opened());
}

#[tokio::test]
async fn test_start_without_api_key_is_503() {
    let (state, channel, _) = test_state(channel_config(None));
    let router = create_router(state);

    let response = router.oneshot(post("/consults/sess-1/start")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(!channel.opened());
}

#[tokio::test]
async fn test_start_and_query_status() {
    let (state, _, _) = test_state(channel_config(Some("key")));
    let router = create_router(state);

    let response = router
        .clone()
        .oneshot(post("/consults/sess-1/start"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["session_id"], "sess-1");
    // No call-started event has arrived yet
    assert_eq!(json["status"]["state"], "connecting");

    let response = router
        .oneshot(get("/consults/sess-1/status"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["state"], "connecting");
    assert_eq!(json["utterance_count"], 0);
}

#[tokio::test]
async fn test_status_for_unknown_session_is_404() {
    let (state, _, _) = test_state(channel_config(Some("key")));
    let router = create_router(state);

    let response = router
        .oneshot(get("/consults/nope/status"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transcript_is_empty_before_any_finals() {
    let (state, _, _) = test_state(channel_config(Some("key")));
    let router = create_router(state);

    let response = router
        .clone()
        .oneshot(post("/consults/sess-1/start"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(get("/consults/sess-1/transcript?last=5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_report_is_404_until_one_exists() {
    let (state, _, _) = test_state(channel_config(Some("key")));
    let router = create_router(state);

    let response = router
        .clone()
        .oneshot(post("/consults/sess-1/start"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(get("/consults/sess-1/report"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stop_returns_status_and_report() {
    let (state, channel, sink) = test_state(channel_config(Some("key")));
    let router = create_router(state);

    let response = router
        .clone()
        .oneshot(post("/consults/sess-1/start"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    channel
        .emit(sana_consult::ChannelEvent::Started)
        .await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let response = router
        .clone()
        .oneshot(post("/consults/sess-1/stop"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"]["state"], "idle");
    assert!(json["report"].is_object());
    assert_eq!(sink.submission_count().await, 1);

    // The receipt is retained and served afterwards
    let response = router
        .oneshot(get("/consults/sess-1/report"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_stop_for_unknown_session_is_404() {
    let (state, _, _) = test_state(channel_config(Some("key")));
    let router = create_router(state);

    let response = router.oneshot(post("/consults/nope/stop")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
