//! The four analysis stages.
//!
//! Each stage builds a prompt, makes exactly one model call, and pushes the
//! raw text through [`crate::repair`] and [`crate::normalize`]. Stages are
//! independent: the tool surface calls them one at a time, the pipeline
//! chains them.

use trendsignal_core::{
    CreatorAdvice, StrengthEstimate, TopicRecord, TrendStrength, VideoRecord,
};

use crate::client::ModelClient;
use crate::error::AnalysisError;
use crate::image::ImagePayload;
use crate::normalize::{normalize_advice, normalize_strength, normalize_topics, normalize_videos};
use crate::prompts;
use crate::repair::{parse_model_json_with_pass, RepairPass};

/// Upper bound on videos sent to the strength estimate.
pub const STRENGTH_SAMPLE_SIZE: usize = 15;

/// Identifies which stage produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    DetectTopics,
    EstimateStrength,
    GenerateAdvice,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::DetectTopics => "detect_topics",
            Self::EstimateStrength => "estimate_strength",
            Self::GenerateAdvice => "generate_advice",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads video cards off a homepage screenshot.
///
/// An empty list is a valid result, not an error.
///
/// # Errors
///
/// Returns [`AnalysisError::Model`] if the vision call fails, or
/// [`AnalysisError::Parse`] if no repair pass yields JSON.
pub async fn extract_videos<C: ModelClient>(
    client: &C,
    image: &ImagePayload,
) -> Result<Vec<VideoRecord>, AnalysisError> {
    let raw = client
        .vision_complete(prompts::EXTRACT_PROMPT, image)
        .await?;
    let value = parse_stage_output(Stage::Extract, &raw)?;
    let videos = normalize_videos(&value);

    tracing::debug!(videos = videos.len(), "extracted videos from screenshot");
    Ok(videos)
}

/// Groups videos into topics, in the order the model returned them.
///
/// An empty input returns an empty list without calling the model.
///
/// # Errors
///
/// Returns [`AnalysisError::Model`] if the chat call fails, or
/// [`AnalysisError::Parse`] if no repair pass yields JSON.
pub async fn detect_topics<C: ModelClient>(
    client: &C,
    videos: &[VideoRecord],
) -> Result<Vec<TopicRecord>, AnalysisError> {
    if videos.is_empty() {
        return Ok(Vec::new());
    }

    let raw = client
        .chat_complete(&prompts::topics_prompt(videos))
        .await?;
    let value = parse_stage_output(Stage::DetectTopics, &raw)?;
    let topics = normalize_topics(&value);

    tracing::debug!(
        videos = videos.len(),
        topics = topics.len(),
        "detected topics"
    );
    Ok(topics)
}

/// Classifies how far along a topic is. Only the first
/// [`STRENGTH_SAMPLE_SIZE`] videos are sent.
///
/// # Errors
///
/// Returns [`AnalysisError::Model`] if the chat call fails, or
/// [`AnalysisError::Parse`] if no repair pass yields JSON.
pub async fn estimate_strength<C: ModelClient>(
    client: &C,
    topic: &str,
    videos: &[VideoRecord],
) -> Result<StrengthEstimate, AnalysisError> {
    let sample = &videos[..videos.len().min(STRENGTH_SAMPLE_SIZE)];

    let raw = client
        .chat_complete(&prompts::strength_prompt(topic, sample))
        .await?;
    let value = parse_stage_output(Stage::EstimateStrength, &raw)?;
    let estimate = normalize_strength(&value);

    tracing::debug!(
        topic,
        sampled = sample.len(),
        trend_strength = %estimate.trend_strength,
        confidence = %estimate.confidence,
        "estimated trend strength"
    );
    Ok(estimate)
}

/// Produces creator-facing advice and up to five hooks.
///
/// # Errors
///
/// Returns [`AnalysisError::Model`] if the chat call fails, or
/// [`AnalysisError::Parse`] if no repair pass yields JSON.
pub async fn generate_advice<C: ModelClient>(
    client: &C,
    topic: &str,
    strength: TrendStrength,
) -> Result<CreatorAdvice, AnalysisError> {
    let raw = client
        .chat_complete(&prompts::advice_prompt(topic, strength))
        .await?;
    let value = parse_stage_output(Stage::GenerateAdvice, &raw)?;
    let advice = normalize_advice(&value);

    tracing::debug!(topic, hooks = advice.hooks.len(), "generated creator advice");
    Ok(advice)
}

fn parse_stage_output(stage: Stage, raw: &str) -> Result<serde_json::Value, AnalysisError> {
    match parse_model_json_with_pass(raw) {
        Ok((value, RepairPass::Strict)) => Ok(value),
        Ok((value, pass)) => {
            tracing::warn!(%stage, ?pass, "model output needed JSON repair");
            Ok(value)
        }
        Err(source) => {
            tracing::warn!(%stage, error = %source, bytes = raw.len(), "model output is not JSON");
            Err(AnalysisError::Parse { stage, source })
        }
    }
}
