//! Typed records produced by the analysis pipeline.
//!
//! Every enum here has a defined default and a `from_loose` constructor that
//! never fails: model output is matched case-insensitively and anything
//! unrecognized resolves to the default.

use serde::{Deserialize, Serialize};

/// Upper bound on the number of hooks carried by advice and results.
pub const MAX_HOOKS: usize = 5;

/// Emotional register inferred from a video's title and thumbnail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalTone {
    Fear,
    Curiosity,
    Confidence,
    Urgency,
    #[default]
    Neutral,
}

impl EmotionalTone {
    pub const ALL: [Self; 5] = [
        Self::Fear,
        Self::Curiosity,
        Self::Confidence,
        Self::Urgency,
        Self::Neutral,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fear => "fear",
            Self::Curiosity => "curiosity",
            Self::Confidence => "confidence",
            Self::Urgency => "urgency",
            Self::Neutral => "neutral",
        }
    }

    /// Case-insensitive match; unknown values become [`EmotionalTone::Neutral`].
    #[must_use]
    pub fn from_loose(raw: &str) -> Self {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|tone| tone.as_str().eq_ignore_ascii_case(wanted))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for EmotionalTone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a topic on its trend curve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendStrength {
    Early,
    #[default]
    HeatingUp,
    Saturated,
}

impl TrendStrength {
    pub const ALL: [Self; 3] = [Self::Early, Self::HeatingUp, Self::Saturated];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Early => "EARLY",
            Self::HeatingUp => "HEATING_UP",
            Self::Saturated => "SATURATED",
        }
    }

    /// Case-insensitive match; unknown values become [`TrendStrength::HeatingUp`].
    #[must_use]
    pub fn from_loose(raw: &str) -> Self {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(wanted))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for TrendStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How sure the model claims to be about a [`TrendStrength`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

impl Confidence {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Case-insensitive match; unknown values become [`Confidence::Medium`].
    #[must_use]
    pub fn from_loose(raw: &str) -> Self {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One video card read off a homepage screenshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub title: String,
    pub creator: String,
    pub views: u64,
    pub hours_since_posted: u64,
    pub emotional_tone: EmotionalTone,
}

/// A group of videos sharing a subject. The detector returns these sorted
/// by `video_count` descending, but nothing downstream re-checks that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub topic_name: String,
    pub video_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrengthEstimate {
    pub trend_strength: TrendStrength,
    pub confidence: Confidence,
}

/// Creator-facing guidance for a topic. `hooks` never exceeds [`MAX_HOOKS`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorAdvice {
    pub why_trending: String,
    pub who_is_winning: String,
    pub posting_advice: String,
    pub hooks: Vec<String>,
}

/// Terminal artifact of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub topic: String,
    pub trend_strength: TrendStrength,
    pub why_trending: String,
    pub who_is_winning: String,
    pub how_to_post: String,
    pub hooks: Vec<String>,
}
