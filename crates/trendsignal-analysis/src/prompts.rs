//! Prompt text for each stage.
//!
//! Every prompt asks for raw JSON in a fixed envelope; the repair and
//! normalize layers absorb whatever drift comes back anyway.

use serde_json::json;
use trendsignal_core::{TrendStrength, VideoRecord};

pub(crate) const EXTRACT_PROMPT: &str = "\
You are analyzing a screenshot of the YouTube homepage (recommended/home feed).
For each visible video thumbnail/card, extract:
- title: exact or best-effort title
- creator: channel or creator name
- views: number if visible, else 0
- hours_since_posted: estimate from \"X hours ago\" / \"X days ago\" (convert to hours), else 0
- emotional_tone: one of fear, curiosity, confidence, urgency, neutral (infer from title/thumbnail)

Return a JSON object with a single key \"videos\" containing an array of such objects.
Only include videos you can clearly see. Be concise. No markdown, raw JSON only.";

/// Topic grouping prompt. Only titles and creators are sent.
pub(crate) fn topics_prompt(videos: &[VideoRecord]) -> String {
    let summary: Vec<_> = videos
        .iter()
        .map(|v| json!({ "title": v.title, "creator": v.creator }))
        .collect();
    let summary = serde_json::Value::Array(summary);

    format!(
        "Given this list of videos from a YouTube homepage, group them into dominant trending topics.
Videos (title / creator): {summary}

For each topic that appears multiple times or is clearly dominant, output:
- topic_name: short label (e.g. \"AI & Job Insecurity\", \"Election 2024\")
- video_count: number of videos in this topic

Return a JSON object with a single key \"topics\" containing an array of {{\"topic_name\": \"...\", \"video_count\": N}}.
Sort by video_count descending. No markdown, raw JSON only."
    )
}

/// Strength prompt over an already-truncated sample.
pub(crate) fn strength_prompt(topic: &str, sample: &[VideoRecord]) -> String {
    let sample = json!(sample);

    format!(
        "Topic: {topic}
Videos (sample): {sample}

Using repetition and velocity heuristics (how many videos, how recent, view patterns), estimate:
- trend_strength: one of EARLY (emerging), HEATING_UP (growing), SATURATED (peak/declining)
- confidence: one of low, medium, high

Return JSON: {{ \"trend_strength\": \"...\", \"confidence\": \"...\" }}. No markdown, raw JSON only."
    )
}

pub(crate) fn advice_prompt(topic: &str, strength: TrendStrength) -> String {
    format!(
        "Topic: {topic}
Trend strength: {strength}

Generate creator-facing insights (speed and clarity over perfection):
1. why_trending: 1-2 sentences on why YouTube is promoting this topic.
2. who_is_winning: who is benefiting (channel size, format).
3. posting_advice: how the user should post about it (format, timing, angle).
4. hooks: exactly 5 short-form viral hooks (one line each), copyable.

Return JSON with keys: why_trending, who_is_winning, posting_advice, hooks (array of 5 strings).
No markdown, raw JSON only."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(title: &str) -> VideoRecord {
        VideoRecord {
            title: title.to_string(),
            creator: "chan".to_string(),
            views: 42,
            ..VideoRecord::default()
        }
    }

    #[test]
    fn topics_prompt_sends_titles_and_creators_only() {
        let prompt = topics_prompt(&[video("AI layoffs")]);
        assert!(prompt.contains(r#""title":"AI layoffs""#));
        assert!(prompt.contains(r#""creator":"chan""#));
        assert!(!prompt.contains("\"views\""));
    }

    #[test]
    fn strength_prompt_includes_full_records() {
        let prompt = strength_prompt("AI Jobs", &[video("a")]);
        assert!(prompt.starts_with("Topic: AI Jobs\n"));
        assert!(prompt.contains(r#""views":42"#));
        assert!(prompt.contains(r#""emotional_tone":"neutral""#));
    }

    #[test]
    fn advice_prompt_uses_wire_form_of_strength() {
        let prompt = advice_prompt("AI Jobs", TrendStrength::HeatingUp);
        assert!(prompt.contains("Trend strength: HEATING_UP"));
    }
}
