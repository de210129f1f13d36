//! Third-party AI generation clients.
//!
//! Two upstream services: a Gemini-style text endpoint used for copy
//! generation and image-prompt optimization, and a dedicated image
//! generation API. Failures surface to the immediate caller with the
//! upstream detail attached; nothing here retries — the editor decides
//! whether a generation attempt is worth repeating.

pub mod gemini;
pub mod image;

use thiserror::Error;

pub use gemini::GeminiClient;
pub use image::{ImageClient, ImageResult};

/// Provider errors, surfaced as-is to the caller.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The required environment configuration is missing.
    #[error("provider not configured: {0} not set")]
    NotConfigured(&'static str),

    /// The request never produced an upstream answer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream answered with a non-success status.
    #[error("upstream error ({status}): {detail}")]
    Upstream { status: u16, detail: String },

    /// The upstream answered 200 with a body we cannot use.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}
