//! Screenshot-to-trend-report analysis for TrendSignal.
//!
//! Raw model text goes through a tolerant JSON repair cascade ([`repair`]),
//! then a total normalizer ([`normalize`]) that coerces it into the typed
//! records from `trendsignal-core`. Four stages ([`stages`]) wrap one model
//! call each, and [`pipeline::run_full_pipeline`] threads them together.

pub mod client;
pub mod error;
pub mod image;
pub mod normalize;
pub mod openai;
pub mod pipeline;
pub mod repair;
pub mod stages;

mod prompts;

pub use client::ModelClient;
pub use error::{AnalysisError, ModelError};
pub use image::ImagePayload;
pub use openai::OpenAiClient;
pub use pipeline::run_full_pipeline;
pub use repair::parse_model_json;
pub use stages::{detect_topics, estimate_strength, extract_videos, generate_advice, Stage};
