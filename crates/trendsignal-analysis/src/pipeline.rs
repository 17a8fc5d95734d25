//! End-to-end orchestration: screenshot in, trend report out.

use trendsignal_core::{PipelineResult, TopicRecord, TrendStrength, MAX_HOOKS};

use crate::client::ModelClient;
use crate::error::AnalysisError;
use crate::image::ImagePayload;
use crate::stages::{detect_topics, estimate_strength, extract_videos, generate_advice};

/// Topic used when detection returns nothing usable.
pub const FALLBACK_TOPIC: &str = "General feed";

/// Topic reported when the screenshot contains no videos.
pub const UNKNOWN_TOPIC: &str = "Unknown";

/// Run the full analysis for one screenshot.
///
/// 1. Extract video cards with the vision model.
/// 2. Group them into topics; the first topic is the dominant one.
/// 3. Estimate the dominant topic's strength.
/// 4. Generate advice and hooks for that topic and strength.
///
/// A screenshot with no videos short-circuits after step 1 with a fixed
/// report and no further model calls. Stages run strictly in sequence and
/// the first failure aborts the run.
///
/// # Errors
///
/// Returns the first [`AnalysisError`] raised by any stage.
pub async fn run_full_pipeline<C: ModelClient>(
    client: &C,
    image: &ImagePayload,
) -> Result<PipelineResult, AnalysisError> {
    let videos = extract_videos(client, image).await?;
    if videos.is_empty() {
        tracing::info!("no videos detected in screenshot, returning empty-feed report");
        return Ok(empty_feed_result());
    }

    let topics = detect_topics(client, &videos).await?;
    let topic = dominant_topic(&topics);

    let estimate = estimate_strength(client, &topic, &videos).await?;
    let advice = generate_advice(client, &topic, estimate.trend_strength).await?;

    let mut hooks = advice.hooks;
    hooks.truncate(MAX_HOOKS);

    tracing::info!(
        videos = videos.len(),
        topics = topics.len(),
        topic = %topic,
        trend_strength = %estimate.trend_strength,
        "pipeline complete"
    );

    Ok(PipelineResult {
        topic,
        trend_strength: estimate.trend_strength,
        why_trending: advice.why_trending,
        who_is_winning: advice.who_is_winning,
        how_to_post: advice.posting_advice,
        hooks,
    })
}

/// Picks the dominant topic: the first element as returned by the model.
///
/// The list is not re-sorted by `video_count`. An empty list
/// or a blank first name falls back to [`FALLBACK_TOPIC`].
#[must_use]
pub fn dominant_topic(topics: &[TopicRecord]) -> String {
    topics
        .first()
        .map(|t| t.topic_name.as_str())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(FALLBACK_TOPIC)
        .to_string()
}

/// Fixed report for a screenshot with no recognizable videos.
#[must_use]
pub fn empty_feed_result() -> PipelineResult {
    PipelineResult {
        topic: UNKNOWN_TOPIC.to_string(),
        trend_strength: TrendStrength::HeatingUp,
        why_trending: "No videos detected in the screenshot.".to_string(),
        who_is_winning: "N/A".to_string(),
        how_to_post: "Upload a clearer YouTube homepage screenshot.".to_string(),
        hooks: Vec::new(),
    }
}
