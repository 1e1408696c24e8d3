//! HTTP API server for the learning frontend.
//!
//! `POST /recommend` runs the recommendation pipeline for one video and its
//! comprehension samples. `GET /health` is a liveness probe.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::PersonaLearnError;
use crate::pipeline::{ComprehensionPoint, RecommendationPipeline};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Shared application state.
struct AppState {
    pipeline: RecommendationPipeline,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Recommend, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'personalearn doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let state = Arc::new(AppState {
        pipeline: RecommendationPipeline::new(&settings)?,
    });
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("PersonaLearn API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Recommend", "POST /recommend");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/recommend", post(recommend))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendRequest {
    /// YouTube URL or video ID
    video_id: String,
    #[serde(default)]
    comprehension_points: Vec<ComprehensionPoint>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// HTTP status for a failed request.
fn status_for(error: &PersonaLearnError) -> StatusCode {
    match error {
        PersonaLearnError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        PersonaLearnError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        PersonaLearnError::TranscriptionFatal(_)
        | PersonaLearnError::QueryDerivation(_)
        | PersonaLearnError::Recommendation(_)
        | PersonaLearnError::OpenAI(_)
        | PersonaLearnError::YouTubeApi(_)
        | PersonaLearnError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn recommend(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let request_id = Uuid::new_v4();
    let span = info_span!("recommend", %request_id, video_id = %req.video_id);

    async move {
        info!("Received {} comprehension point(s)", req.comprehension_points.len());
        match state
            .pipeline
            .recommend(&req.video_id, &req.comprehension_points)
            .await
        {
            Ok(recommendations) => Json(recommendations).into_response(),
            Err(e) => {
                warn!("Request failed: {}", e);
                error_response(status_for(&e), e.to_string())
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::query::{QueryDeriver, TextGenerator};
    use crate::recommend::{ResourceRecommender, SearchHit, SearchProvider, VideoStats};
    use crate::transcription::{PhraseStore, TranscriptionProvider};
    use async_trait::async_trait;

    struct Unavailable;

    #[async_trait]
    impl TranscriptionProvider for Unavailable {
        async fn transcribe(&self, video_id: &str) -> Result<PhraseStore> {
            Err(PersonaLearnError::VideoSource(format!("{} is private", video_id)))
        }
    }

    #[async_trait]
    impl TextGenerator for Unavailable {
        async fn generate(&self, _prompt: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl SearchProvider for Unavailable {
        async fn search(&self, _query: &str, _max: usize, _order: &str) -> Result<Vec<SearchHit>> {
            Ok(Vec::new())
        }

        async fn video_stats(&self, _video_id: &str) -> Result<Option<VideoStats>> {
            Ok(None)
        }
    }

    fn state() -> Arc<AppState> {
        let pipeline = RecommendationPipeline::with_components(
            &Settings::default(),
            Arc::new(Unavailable),
            QueryDeriver::new(Arc::new(Unavailable), None),
            ResourceRecommender::new(Arc::new(Unavailable), "relevance"),
        );
        Arc::new(AppState { pipeline })
    }

    fn request(
        video_id: &str,
        points: &[(f64, f64)],
    ) -> std::result::Result<Json<RecommendRequest>, JsonRejection> {
        Ok(Json(RecommendRequest {
            video_id: video_id.to_string(),
            comprehension_points: points
                .iter()
                .map(|&(timestamp, comprehension)| ComprehensionPoint {
                    timestamp,
                    comprehension,
                })
                .collect(),
        }))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_request_uses_camel_case() {
        let req: RecommendRequest = serde_json::from_str(
            r#"{"videoId": "abcdefghijk", "comprehensionPoints": [{"timestamp": 3.0, "comprehension": -0.9}]}"#,
        )
        .unwrap();
        assert_eq!(req.video_id, "abcdefghijk");
        assert_eq!(req.comprehension_points.len(), 1);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&PersonaLearnError::InvalidInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&PersonaLearnError::TranscriptionFatal("x".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&PersonaLearnError::Timeout {
                operation: "resource search".into(),
                seconds: 120.0
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&PersonaLearnError::Config("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_health() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_invalid_video_id_is_bad_request() {
        let response = recommend(State(state()), request("???", &[(1.0, -0.9)])).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("???"));
    }

    #[tokio::test]
    async fn test_no_confusion_returns_empty_list() {
        let response = recommend(State(state()), request("abcdefghijk", &[(1.0, 0.5)])).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_transcription_failure_is_bad_gateway() {
        let response = recommend(State(state()), request("abcdefghijk", &[(1.0, -0.9)])).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("is private"));
    }
}
