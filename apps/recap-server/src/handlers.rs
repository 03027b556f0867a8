use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use recap_core::{
    LanguageModel, RecapError, TranscriptSource, assemble, render_document, resolve_video_id,
    summarize,
};

/// Process-wide shared state; both collaborators are read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub transcripts: Arc<dyn TranscriptSource>,
    pub model: Arc<dyn LanguageModel>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/time", get(current_time))
        .route("/summarize/check", get(download_transcript))
        .route("/summarize/summary", get(summarize_video))
        .fallback(not_found)
        .with_state(state)
}

#[derive(Deserialize)]
pub struct VideoQuery {
    youtube_url: Option<String>,
}

/// Error surfaced at the handler boundary as a status code plus JSON body.
struct ErrorBody {
    status: StatusCode,
    message: String,
}

impl ErrorBody {
    fn missing_url() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "YouTube URL is missing".to_string(),
        }
    }
}

impl From<RecapError> for ErrorBody {
    fn from(err: RecapError) -> Self {
        let status = match err {
            RecapError::InvalidUrl { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ErrorBody {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Resolve the query parameter down to assembled transcript text.
async fn transcript_text(state: &AppState, query: &VideoQuery) -> Result<String, ErrorBody> {
    let url = query
        .youtube_url
        .as_deref()
        .ok_or_else(ErrorBody::missing_url)?;
    let video_id = resolve_video_id(url)?;
    info!(video_id, "fetching transcript");
    let fragments = state.transcripts.fetch_transcript(&video_id).await?;
    Ok(assemble(&fragments)?)
}

async fn download_transcript(
    State(state): State<AppState>,
    Query(query): Query<VideoQuery>,
) -> Response {
    let text = match transcript_text(&state, &query).await {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err.message, "transcript download failed");
            return err.into_response();
        }
    };

    match render_document(&text) {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "application/pdf"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=transcript.pdf",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => {
            warn!(error = %err, "document rendering failed");
            ErrorBody::from(err).into_response()
        }
    }
}

async fn summarize_video(
    State(state): State<AppState>,
    Query(query): Query<VideoQuery>,
) -> Response {
    let text = match transcript_text(&state, &query).await {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err.message, "summarization failed");
            return err.into_response();
        }
    };

    match summarize(state.model.as_ref(), &text).await {
        Ok(summaries) => {
            info!(count = summaries.len(), "summaries generated");
            Json(summaries).into_response()
        }
        Err(err) => {
            warn!(error = %err, "summarization failed");
            ErrorBody::from(err).into_response()
        }
    }
}

async fn current_time() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use recap_core::{
        GenerationParams, RecapError, Result as CoreResult, Token, TranscriptFragment,
    };

    use super::*;

    struct FixedTranscripts {
        fragments: Vec<TranscriptFragment>,
        fail: bool,
    }

    #[async_trait]
    impl TranscriptSource for FixedTranscripts {
        async fn fetch_transcript(&self, video_id: &str) -> CoreResult<Vec<TranscriptFragment>> {
            if self.fail {
                return Err(RecapError::TranscriptUnavailable {
                    video_id: video_id.to_string(),
                    reason: "no captions".to_string(),
                });
            }
            Ok(self.fragments.clone())
        }
    }

    struct CannedModel;

    #[async_trait]
    impl LanguageModel for CannedModel {
        fn encode(&self, text: &str) -> CoreResult<Vec<Token>> {
            Ok(text.split_whitespace().map(str::to_string).collect())
        }

        async fn generate(
            &self,
            _input: &[Token],
            _params: &GenerationParams,
        ) -> CoreResult<Vec<Vec<Token>>> {
            Ok(vec![
                vec!["first".into(), "summary".into(), "</s>".into()],
                vec!["first".into(), "summary".into()],
                vec!["second".into(), "summary".into()],
            ])
        }

        fn decode(&self, tokens: &[Token]) -> CoreResult<String> {
            Ok(tokens.join(" "))
        }
    }

    fn fragment(text: &str, start: f64) -> TranscriptFragment {
        TranscriptFragment {
            text: text.to_string(),
            start,
            duration: 1.0,
        }
    }

    fn test_router(fail_transcript: bool) -> Router {
        router(AppState {
            transcripts: Arc::new(FixedTranscripts {
                fragments: vec![fragment("a", 0.0), fragment("b", 1.0), fragment("c", 2.0)],
                fail: fail_transcript,
            }),
            model: Arc::new(CannedModel),
        })
    }

    async fn send(router: Router, uri: &str) -> Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_url_is_a_400_on_both_endpoints() {
        for route in ["/summarize/summary", "/summarize/check"] {
            let response = send(test_router(false), route).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                body_json(response).await,
                json!({ "error": "YouTube URL is missing" })
            );
        }
    }

    #[tokio::test]
    async fn invalid_url_is_a_400() {
        let response = send(test_router(false), "/summarize/summary?youtube_url=junk").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("Invalid YouTube URL"));
    }

    #[tokio::test]
    async fn url_without_id_is_a_400() {
        let response =
            send(test_router(false), "/summarize/summary?youtube_url=https://youtu.be").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_route_is_a_404() {
        let response = send(test_router(false), "/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn time_returns_a_plain_timestamp() {
        let response = send(test_router(false), "/time").await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn summary_returns_deduplicated_candidates() {
        let response = send(
            test_router(false),
            "/summarize/summary?youtube_url=https://youtu.be/abc123",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!(["first summary", "second summary"])
        );
    }

    #[tokio::test]
    async fn transcript_failure_is_a_500_with_an_error_body() {
        let response = send(
            test_router(true),
            "/summarize/summary?youtube_url=https://youtu.be/abc123",
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("no captions"));
    }

    #[tokio::test]
    async fn export_sets_pdf_headers_and_returns_a_document() {
        let response = send(
            test_router(false),
            "/summarize/check?youtube_url=https://youtu.be/abc123",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=transcript.pdf"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn export_failure_on_transcript_is_a_500() {
        let response = send(
            test_router(true),
            "/summarize/check?youtube_url=https://youtu.be/abc123",
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
