//! HTTP surface tests against the in-memory store with fake
//! synthesis collaborators.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use scast_api::{create_router, ApiConfig, AppState};
use scast_pipeline::{CollaboratorError, ScriptEnhancer, SpeechSynthesizer, VideoRenderer};
use scast_store::{AccountStore, ArtifactStore, JobStore, MemoryStore};

struct FakeEnhancer;

#[async_trait::async_trait]
impl ScriptEnhancer for FakeEnhancer {
    async fn enhance(&self, script: &str) -> Result<String, CollaboratorError> {
        Ok(format!("narration of: {script}"))
    }
}

struct FakeSpeech;

#[async_trait::async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, CollaboratorError> {
        Ok(format!("mp3:{text}").into_bytes())
    }
}

struct FakeRenderer;

#[async_trait::async_trait]
impl VideoRenderer for FakeRenderer {
    async fn render(&self, script: &str, _audio: &[u8]) -> Result<Vec<u8>, CollaboratorError> {
        Ok(format!("mp4:{script}").into_bytes())
    }
}

struct FailingSpeech;

#[async_trait::async_trait]
impl SpeechSynthesizer for FailingSpeech {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, CollaboratorError> {
        Err("voice service down".into())
    }
}

fn app_with(config: ApiConfig, store: Arc<MemoryStore>) -> Router {
    let state = AppState::from_parts(
        config,
        Arc::clone(&store) as Arc<dyn AccountStore>,
        Arc::clone(&store) as Arc<dyn JobStore>,
        store as Arc<dyn ArtifactStore>,
        Arc::new(FakeEnhancer),
        Arc::new(FakeSpeech),
        Arc::new(FakeRenderer),
    );
    create_router(state)
}

fn app() -> Router {
    app_with(ApiConfig::default(), Arc::new(MemoryStore::new()))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn test_health() {
    let response = app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_db_health() {
    let response = app().oneshot(get("/api/db/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_generate_video_end_to_end() {
    let app = app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/generate",
            json!({"walletAddress": "0xabc", "script": "let x = 1;", "title": "Lesson 1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["creditsDeducted"], 2);
    assert_eq!(body["remainingCredits"], 26);
    let job_id = body["jobId"].as_str().unwrap().to_string();
    let artifact_id = body["artifactId"].as_str().unwrap().to_string();

    // Status reports completed with the artifact present
    let response = app
        .clone()
        .oneshot(get(&format!("/api/videos/status/{job_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["ready"], true);
    assert_eq!(body["artifactAvailable"], true);

    // Artifact served by job id with the video content type
    let response = app
        .clone()
        .oneshot(get(&format!("/api/videos/job/{job_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "video/mp4"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"mp4:"));

    // Also addressable by artifact id
    let response = app
        .clone()
        .oneshot(get(&format!("/api/videos/{artifact_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Listed under the wallet's content
    let response = app
        .oneshot(get("/api/wallet/0xabc/content"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["title"], "Lesson 1");
    assert_eq!(body["items"][0]["format"], "mp4");
}

#[tokio::test]
async fn test_generate_audio_serves_mp3() {
    let app = app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/generate/audio",
            json!({"walletAddress": "0xabc", "script": "print(1)"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["creditsDeducted"], 1);
    let job_id = body["jobId"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get(&format!("/api/audio/job/{job_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "audio/mpeg"
    );

    // The video route must not serve an audio artifact
    let response = app
        .oneshot(get(&format!("/api/videos/job/{job_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generate_rejects_blank_script() {
    let response = app()
        .oneshot(post_json(
            "/api/generate",
            json!({"walletAddress": "0xabc", "script": "   "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("script"));
}

#[tokio::test]
async fn test_generate_insufficient_credit_returns_402() {
    let store = Arc::new(MemoryStore::new());
    // Provision with one credit inside an active trial window: enough
    // for audio, not for video.
    store
        .insert_account("0xpoor", 1, chrono::Utc::now() + chrono::Duration::days(7))
        .await
        .unwrap();
    let app = app_with(ApiConfig::default(), store);

    let response = app
        .oneshot(post_json(
            "/api/generate",
            json!({"walletAddress": "0xpoor", "script": "x"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("2"));
}

#[tokio::test]
async fn test_pipeline_failure_surfaces_and_job_is_failed() {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::from_parts(
        ApiConfig::default(),
        Arc::clone(&store) as Arc<dyn AccountStore>,
        Arc::clone(&store) as Arc<dyn JobStore>,
        Arc::clone(&store) as Arc<dyn ArtifactStore>,
        Arc::new(FakeEnhancer),
        Arc::new(FailingSpeech),
        Arc::new(FakeRenderer),
    );
    let app = create_router(state);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/generate/audio",
            json!({"walletAddress": "0xabc", "script": "x"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The job exists, failed, and the credit stayed spent.
    let jobs = store.jobs_snapshot();
    assert_eq!(jobs.len(), 1);
    let job_id = jobs[0].id.to_string();

    let response = app
        .clone()
        .oneshot(get(&format!("/api/videos/status/{job_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "failed");
    assert_eq!(body["artifactAvailable"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("speech synthesis failed"));

    let response = app
        .oneshot(get("/api/users/0xabc/points"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["points"], 27);
}

#[tokio::test]
async fn test_status_unknown_job_is_404() {
    let response = app()
        .oneshot(get("/api/videos/status/no-such-job"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_points_unknown_wallet_is_404() {
    let response = app().oneshot(get("/api/users/0xnew/points")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_points_after_provisioning() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_account("0xknown", 28, chrono::Utc::now() + chrono::Duration::days(7))
        .await
        .unwrap();
    let app = app_with(ApiConfig::default(), store);

    let response = app.oneshot(get("/api/users/0xknown/points")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["points"], 28);
    assert_eq!(body["trialActive"], true);
}

#[tokio::test]
async fn test_award_by_tier_provisions_and_grants() {
    let app = app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/payments/award",
            json!({"walletAddress": "0xbuyer", "tier": 10}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["awardedPoints"], 80);
    // Trial grant (28) plus the purchased 80
    assert_eq!(body["newTotalPoints"], 108);

    let response = app
        .oneshot(get("/api/users/0xbuyer/points"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["points"], 108);
}

#[tokio::test]
async fn test_award_accepts_amount_as_tier_alias() {
    let response = app()
        .oneshot(post_json(
            "/api/payments/award",
            json!({"walletAddress": "0xbuyer", "amount": 5, "contentType": "video"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["awardedPoints"], 30);
    assert_eq!(body["contentType"], "video");
    // 30 points buys 15 video generations at 2 credits each
    assert_eq!(body["contentCredits"], 15.0);
}

#[tokio::test]
async fn test_award_unknown_tier_is_rejected() {
    let response = app()
        .oneshot(post_json(
            "/api/payments/award",
            json!({"walletAddress": "0xbuyer", "tier": 7}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_award_requires_tier_or_points() {
    let response = app()
        .oneshot(post_json(
            "/api/payments/award",
            json!({"walletAddress": "0xbuyer"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_award_webhook_token_gate() {
    let config = ApiConfig {
        payment_webhook_token: Some("s3cret".to_string()),
        ..ApiConfig::default()
    };
    let app = app_with(config, Arc::new(MemoryStore::new()));

    // Missing token
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/payments/award",
            json!({"walletAddress": "0xbuyer", "points": 5}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong token
    let request = Request::builder()
        .method("POST")
        .uri("/api/payments/award")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::from(
            json!({"walletAddress": "0xbuyer", "points": 5}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct token
    let request = Request::builder()
        .method("POST")
        .uri("/api/payments/award")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::from(
            json!({"walletAddress": "0xbuyer", "points": 5}).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
