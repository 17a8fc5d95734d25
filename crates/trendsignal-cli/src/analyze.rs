//! Command handlers: read local inputs, run one stage (or the whole
//! pipeline) and print the result as pretty JSON on stdout.

use std::path::Path;

use serde::Serialize;
use serde_json::json;
use trendsignal_analysis::normalize::normalize_videos;
use trendsignal_analysis::{
    detect_topics, estimate_strength, extract_videos, generate_advice, run_full_pipeline,
    ImagePayload, ModelClient,
};
use trendsignal_core::{TrendStrength, VideoRecord};

pub(crate) async fn run_analyze<C: ModelClient>(client: &C, image: &Path) -> anyhow::Result<()> {
    let image = load_image(image).await?;
    let result = run_full_pipeline(client, &image).await?;
    print_json(&result)
}

pub(crate) async fn run_extract<C: ModelClient>(client: &C, image: &Path) -> anyhow::Result<()> {
    let image = load_image(image).await?;
    let videos = extract_videos(client, &image).await?;
    print_json(&json!({ "videos": videos }))
}

pub(crate) async fn run_topics<C: ModelClient>(client: &C, videos: &Path) -> anyhow::Result<()> {
    let videos = load_videos(videos).await?;
    let topics = detect_topics(client, &videos).await?;
    print_json(&json!({ "topics": topics }))
}

pub(crate) async fn run_strength<C: ModelClient>(
    client: &C,
    topic: &str,
    videos: &Path,
) -> anyhow::Result<()> {
    let videos = load_videos(videos).await?;
    let estimate = estimate_strength(client, topic, &videos).await?;
    print_json(&estimate)
}

pub(crate) async fn run_advice<C: ModelClient>(
    client: &C,
    topic: &str,
    strength: &str,
) -> anyhow::Result<()> {
    let advice = generate_advice(client, topic, TrendStrength::from_loose(strength)).await?;
    print_json(&advice)
}

/// Reads a screenshot from disk, labelling it by file extension.
async fn load_image(path: &Path) -> anyhow::Result<ImagePayload> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "loaded screenshot");
    Ok(ImagePayload::from_bytes(&bytes, mime_for_path(path))?)
}

async fn load_videos(path: &Path) -> anyhow::Result<Vec<VideoRecord>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let videos = videos_from_json(&raw)
        .map_err(|e| anyhow::anyhow!("{} is not valid JSON: {e}", path.display()))?;
    tracing::debug!(path = %path.display(), videos = videos.len(), "loaded videos");
    Ok(videos)
}

/// Parses a videos file with the same tolerance applied to model output.
fn videos_from_json(raw: &str) -> Result<Vec<VideoRecord>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    Ok(normalize_videos(&value))
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
