//! API routes.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    award_credits, db_health, generate_audio, generate_video, get_artifact, get_audio_by_job,
    get_job_status, get_points, get_video_by_job, get_wallet_content, health,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let generate_routes = Router::new()
        .route("/generate", post(generate_video))
        .route("/generate/audio", post(generate_audio));

    let video_routes = Router::new()
        // Status polling
        .route("/videos/status/:job_id", get(get_job_status))
        // Artifact delivery by producing job
        .route("/videos/job/:job_id", get(get_video_by_job))
        // Artifact delivery by artifact id
        .route("/videos/:artifact_id", get(get_artifact));

    let audio_routes = Router::new().route("/audio/job/:job_id", get(get_audio_by_job));

    let wallet_routes = Router::new()
        .route("/wallet/:wallet/content", get(get_wallet_content))
        .route("/users/:wallet/points", get(get_points));

    let payment_routes = Router::new().route("/payments/award", post(award_credits));

    let db_routes = Router::new().route("/db/health", get(db_health));

    let api_routes = Router::new()
        .merge(generate_routes)
        .merge(video_routes)
        .merge(audio_routes)
        .merge(wallet_routes)
        .merge(payment_routes)
        .merge(db_routes);

    let health_routes = Router::new().route("/health", get(health));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_headers = [header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT];
    let allowed_methods = [Method::GET, Method::POST, Method::OPTIONS];

    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any)
            .max_age(std::time::Duration::from_secs(600))
    } else {
        // Explicit origins allow credentials, which rules out wildcards
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_methods(allowed_methods)
            .allow_headers(allowed_headers)
            .allow_credentials(true)
            .allow_origin(origins)
            .max_age(std::time::Duration::from_secs(600))
    }
}
