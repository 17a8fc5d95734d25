mod analyze;
mod tools;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use trendsignal_analysis::{AnalysisError, ModelError, OpenAiClient};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

/// Shared handler state. `client` is `None` when no API key is configured;
/// every endpoint that needs the model then answers 503.
#[derive(Clone)]
pub struct AppState {
    pub client: Option<Arc<OpenAiClient>>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    model_client: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "bad_request" | "invalid_image" | "parse_failure" => StatusCode::BAD_REQUEST,
            "payload_too_large" => StatusCode::PAYLOAD_TOO_LARGE,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            "not_configured" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

impl AppState {
    /// Returns the model client or the 503 error for an unconfigured server.
    pub(super) fn require_client(&self, request_id: &str) -> Result<Arc<OpenAiClient>, ApiError> {
        self.client.clone().ok_or_else(|| {
            ApiError::new(
                request_id,
                "not_configured",
                "OPENAI_API_KEY is required for analysis",
            )
        })
    }
}

/// Maps a stage or pipeline failure onto the HTTP error taxonomy.
pub(super) fn map_analysis_error(request_id: String, error: &AnalysisError) -> ApiError {
    match error {
        AnalysisError::InvalidImage(message) => {
            ApiError::new(request_id, "invalid_image", message.clone())
        }
        AnalysisError::Parse { stage, .. } => {
            tracing::warn!(%stage, error = %error, "model output could not be parsed");
            ApiError::new(
                request_id,
                "parse_failure",
                format!("model returned invalid JSON during {stage}"),
            )
        }
        AnalysisError::Model(ModelError::NotConfigured(message)) => {
            ApiError::new(request_id, "not_configured", message.clone())
        }
        AnalysisError::Model(ModelError::RateLimited(message)) => ApiError::new(
            request_id,
            "rate_limited",
            format!("model rate limit or quota exceeded: {message}"),
        ),
        AnalysisError::Model(
            e @ (ModelError::Api { .. } | ModelError::Http(_) | ModelError::Deserialize { .. }),
        ) => {
            tracing::error!(error = %e, "model request failed");
            ApiError::new(request_id, "upstream_error", e.to_string())
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

pub fn build_app(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/analyze", post(analyze::analyze_screenshot))
        .route("/api/v1/tools", get(tools::list_tools))
        .route(
            "/api/v1/tools/vision_extract_youtube_homepage",
            post(tools::vision_extract_youtube_homepage),
        )
        .route(
            "/api/v1/tools/trend_detect_topics",
            post(tools::trend_detect_topics),
        )
        .route(
            "/api/v1/tools/trend_estimate_strength",
            post(tools::trend_estimate_strength),
        )
        .route(
            "/api/v1/tools/creator_advice_generator",
            post(tools::creator_advice_generator),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<HealthData>> {
    let model_client = if state.client.is_some() {
        "configured"
    } else {
        "missing"
    };

    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            model_client,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::{app_with_model, app_without_client, send};
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    fn error_status(error: AnalysisError) -> StatusCode {
        map_analysis_error("req-1".to_string(), &error)
            .into_response()
            .status()
    }

    fn parse_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("not json").unwrap_err()
    }

    #[test]
    fn analysis_errors_map_to_documented_statuses() {
        assert_eq!(
            error_status(AnalysisError::InvalidImage("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(AnalysisError::Parse {
                stage: trendsignal_analysis::Stage::Extract,
                source: parse_error(),
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(ModelError::RateLimited("quota".into()).into()),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            error_status(ModelError::NotConfigured("no key".into()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_status(
                ModelError::Api {
                    status: 500,
                    message: "boom".into()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_status(
                ModelError::Deserialize {
                    context: "chat completion response".into(),
                    source: parse_error(),
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn unknown_error_code_maps_to_internal_server_error() {
        let response = ApiError::new("req-1", "mystery", "?").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_reports_missing_model_client() {
        let (status, json) = send(
            app_without_client(),
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "health-1")
                .body(Body::empty())
                .expect("request"),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["model_client"], "missing");
        assert_eq!(json["meta"]["request_id"], "health-1");
        assert!(json["meta"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn health_reports_configured_model_client() {
        let (status, json) = send(
            app_with_model("http://127.0.0.1:9"),
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(json["data"]["model_client"], "configured");
    }

    #[tokio::test]
    async fn cors_preflight_allows_any_origin() {
        let response = tower::ServiceExt::oneshot(
            app_without_client(),
            Request::builder()
                .method("OPTIONS")
                .uri("/api/v1/analyze")
                .header("origin", "https://example.com")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }
}
