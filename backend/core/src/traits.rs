use anyhow::Result;
use async_trait::async_trait;

/// A generative vision-and-text model.
///
/// Implementations perform exactly one outbound call per `generate` and never retry.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Provider name (e.g., "gemini", "openai").
    fn name(&self) -> &str;

    /// Send the request and return the model's raw reply text.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply>;
}

/// One piece of multimodal model input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelPart {
    /// Raw binary content sent inline.
    InlineData { mime_type: String, data: Vec<u8> },
    Text(String),
}

/// Request to a vision model: ordered parts.
#[derive(Debug, Clone, Default)]
pub struct ModelRequest {
    pub parts: Vec<ModelPart>,
}

impl ModelRequest {
    /// The instruction text, if any.
    pub fn instruction(&self) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            ModelPart::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// The first inline binary part as `(mime_type, bytes)`.
    pub fn inline_data(&self) -> Option<(&str, &[u8])> {
        self.parts.iter().find_map(|p| match p {
            ModelPart::InlineData { mime_type, data } => Some((mime_type.as_str(), data.as_slice())),
            _ => None,
        })
    }
}

/// Reply from a vision model.
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
}
