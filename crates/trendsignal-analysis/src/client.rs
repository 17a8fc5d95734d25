//! The model-inference collaborator seam.

use std::future::Future;

use crate::error::ModelError;
use crate::image::ImagePayload;

/// "Ask the model a question, get back raw text."
///
/// Implementations do no JSON handling of their own; stage functions parse
/// and normalize whatever text comes back. A single handle is built at
/// startup and shared read-only across concurrent pipeline runs, so
/// implementations must be `Send + Sync` and must not need `&mut self`.
pub trait ModelClient: Send + Sync {
    /// One prompt plus one image, answered by the vision model.
    fn vision_complete(
        &self,
        prompt: &str,
        image: &ImagePayload,
    ) -> impl Future<Output = Result<String, ModelError>> + Send;

    /// One text prompt, answered by the chat model.
    fn chat_complete(&self, prompt: &str)
        -> impl Future<Output = Result<String, ModelError>> + Send;
}
