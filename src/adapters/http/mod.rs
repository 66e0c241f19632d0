//! HTTP inbound adapter.
//!
//! One route, `POST /process-video`, which validates the request, hands the
//! job to the dispatcher and answers without waiting for it.

use crate::domain::jobs::Job;
use crate::ports::dispatch::JobDispatcher;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub const MISSING_FIELDS: &str = "video_url and video_id are required";

#[derive(Debug, Deserialize)]
pub struct ProcessVideoRequest {
    pub video_url: Option<String>,
    pub video_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProcessVideoResponse {
    status: &'static str,
    video_id: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: &'static str,
}

pub fn router(dispatcher: Arc<dyn JobDispatcher>) -> Router {
    Router::new()
        .route("/process-video", post(process_video))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}

async fn process_video(
    State(dispatcher): State<Arc<dyn JobDispatcher>>,
    body: Bytes,
) -> Response {
    // The body is read as JSON whatever the Content-Type says.
    let job = match serde_json::from_slice::<ProcessVideoRequest>(&body) {
        Ok(request) => Job::from_fields(request.video_url, request.video_id),
        Err(e) => {
            warn!(error = %e, "unreadable request body");
            None
        }
    };

    let Some(job) = job else {
        let detail = ErrorResponse {
            detail: MISSING_FIELDS,
        };
        return (StatusCode::BAD_REQUEST, Json(detail)).into_response();
    };

    info!(video_id = %job.video_id, video_url = %job.video_url, "received process request");
    let video_id = job.video_id.clone();
    dispatcher.dispatch(job);

    Json(ProcessVideoResponse {
        status: "processing started",
        video_id,
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::dispatch::MockJobDispatcher;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/process-video")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(dispatcher: MockJobDispatcher, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(Arc::new(dispatcher)).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn rejecting() -> MockJobDispatcher {
        let mut dispatcher = MockJobDispatcher::new();
        dispatcher.expect_dispatch().never();
        dispatcher
    }

    #[tokio::test]
    async fn test_valid_request_dispatches_and_returns_immediately() {
        let mut dispatcher = MockJobDispatcher::new();
        dispatcher
            .expect_dispatch()
            .withf(|job| {
                job.video_url == "https://videos.example.com/a.mp4" && job.video_id == "abc"
            })
            .times(1)
            .return_const(());

        let (status, body) = send(
            dispatcher,
            post_json(r#"{"video_url": "https://videos.example.com/a.mp4", "video_id": "abc"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "processing started", "video_id": "abc"}));
    }

    #[tokio::test]
    async fn test_missing_or_empty_fields_are_rejected() {
        for body in [
            r#"{"video_id": "abc"}"#,
            r#"{"video_url": "https://videos.example.com/a.mp4"}"#,
            r#"{}"#,
            r#"{"video_url": "", "video_id": "abc"}"#,
            r#"{"video_url": "https://videos.example.com/a.mp4", "video_id": ""}"#,
        ] {
            let (status, response) = send(rejecting(), post_json(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(response, json!({"detail": MISSING_FIELDS}));
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected_the_same_way() {
        for body in ["not json", r#"{"video_url": 5, "video_id": "abc"}"#, "[]"] {
            let (status, response) = send(rejecting(), post_json(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(response, json!({"detail": MISSING_FIELDS}));
        }
    }

    #[tokio::test]
    async fn test_json_body_without_content_type_is_accepted() {
        let mut dispatcher = MockJobDispatcher::new();
        dispatcher
            .expect_dispatch()
            .withf(|job| job.video_url == "https://v/a.mp4" && job.video_id == "abc")
            .times(1)
            .return_const(());

        let request = Request::builder()
            .method("POST")
            .uri("/process-video")
            .body(Body::from(r#"{"video_url": "https://v/a.mp4", "video_id": "abc"}"#))
            .unwrap();
        let (status, body) = send(dispatcher, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "processing started", "video_id": "abc"}));
    }

    #[tokio::test]
    async fn test_duplicate_video_id_is_dispatched_twice() {
        let mut dispatcher = MockJobDispatcher::new();
        dispatcher.expect_dispatch().times(2).return_const(());
        let app = router(Arc::new(dispatcher));

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(post_json(r#"{"video_url": "https://v/a.mp4", "video_id": "same"}"#))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
