//! Per-stage tool endpoints.
//!
//! - `GET  /api/v1/tools`: tool catalogue
//! - `POST /api/v1/tools/vision_extract_youtube_homepage`: `{image}` to `{videos}`
//! - `POST /api/v1/tools/trend_detect_topics`: `{videos}` to `{topics}`
//! - `POST /api/v1/tools/trend_estimate_strength`: `{topic_name, videos}` to an estimate
//! - `POST /api/v1/tools/creator_advice_generator`: `{topic_name, trend_strength}` to advice
//!
//! Request bodies are read as loose JSON and pushed through the same
//! normalizer as model output, so one tool's output can be posted straight
//! into the next.

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Serialize;
use serde_json::Value;
use trendsignal_analysis::normalize::{coerce_string, normalize_videos};
use trendsignal_analysis::{
    detect_topics, estimate_strength, extract_videos, generate_advice, ImagePayload,
};
use trendsignal_core::{CreatorAdvice, StrengthEstimate, TopicRecord, TrendStrength, VideoRecord};

use crate::middleware::RequestId;

use super::{map_analysis_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ToolDescriptor {
    name: &'static str,
    description: &'static str,
    input: &'static [&'static str],
}

static TOOLS: [ToolDescriptor; 4] = [
    ToolDescriptor {
        name: "vision_extract_youtube_homepage",
        description: "Extract video metadata (title, creator, views, hours since posted, emotional tone) from a YouTube homepage screenshot.",
        input: &["image"],
    },
    ToolDescriptor {
        name: "trend_detect_topics",
        description: "Group extracted videos into dominant trending topics, strongest first.",
        input: &["videos"],
    },
    ToolDescriptor {
        name: "trend_estimate_strength",
        description: "Estimate whether a topic is EARLY, HEATING_UP or SATURATED from a sample of its videos.",
        input: &["topic_name", "videos"],
    },
    ToolDescriptor {
        name: "creator_advice_generator",
        description: "Explain why a topic is trending, who is winning, how to post, and write five short-form hooks.",
        input: &["topic_name", "trend_strength"],
    },
];

#[derive(Debug, Serialize)]
pub(super) struct VideosData {
    videos: Vec<VideoRecord>,
}

#[derive(Debug, Serialize)]
pub(super) struct TopicsData {
    topics: Vec<TopicRecord>,
}

pub(super) async fn list_tools(
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<&'static [ToolDescriptor]>> {
    Json(ApiResponse {
        data: &TOOLS,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn vision_extract_youtube_homepage(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<VideosData>>, ApiError> {
    let body = json_body(&req_id.0, body)?;

    let image = body
        .get("image")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "bad_request",
                "'image' must be a base64 string or data URL",
            )
        })?;
    let image = ImagePayload::from_base64_or_data_url(image)
        .map_err(|e| map_analysis_error(req_id.0.clone(), &e))?;

    let client = state.require_client(&req_id.0)?;
    let videos = extract_videos(client.as_ref(), &image)
        .await
        .map_err(|e| map_analysis_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: VideosData { videos },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn trend_detect_topics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<TopicsData>>, ApiError> {
    let body = json_body(&req_id.0, body)?;
    let videos = normalize_videos(&body);

    let client = state.require_client(&req_id.0)?;
    let topics = detect_topics(client.as_ref(), &videos)
        .await
        .map_err(|e| map_analysis_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: TopicsData { topics },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn trend_estimate_strength(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<StrengthEstimate>>, ApiError> {
    let body = json_body(&req_id.0, body)?;
    let topic = require_topic(&req_id.0, &body)?;
    let videos = normalize_videos(&body);

    let client = state.require_client(&req_id.0)?;
    let estimate = estimate_strength(client.as_ref(), &topic, &videos)
        .await
        .map_err(|e| map_analysis_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: estimate,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn creator_advice_generator(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<CreatorAdvice>>, ApiError> {
    let body = json_body(&req_id.0, body)?;
    let topic = require_topic(&req_id.0, &body)?;
    let strength = body
        .get("trend_strength")
        .and_then(Value::as_str)
        .map(TrendStrength::from_loose)
        .unwrap_or_default();

    let client = state.require_client(&req_id.0)?;
    let advice = generate_advice(client.as_ref(), &topic, strength)
        .await
        .map_err(|e| map_analysis_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: advice,
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn json_body(request_id: &str, body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value).map_err(|e| {
        ApiError::new(
            request_id,
            "bad_request",
            format!("request body must be JSON: {}", e.body_text()),
        )
    })
}

fn require_topic(request_id: &str, body: &Value) -> Result<String, ApiError> {
    let topic = coerce_string(body.get("topic_name"));
    if topic.trim().is_empty() {
        return Err(ApiError::new(request_id, "bad_request", "'topic_name' is required"));
    }
    Ok(topic)
}
