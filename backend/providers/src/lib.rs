pub mod gemini;
pub mod mock;
pub mod openai;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use labelguard_core::VisionModel;

pub use gemini::GeminiProvider;
pub use mock::MockVisionModel;
pub use openai::OpenAiProvider;

/// Which hosted vision model backs the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAi,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAi),
            other => anyhow::bail!("unknown vision provider '{}' (expected gemini or openai)", other),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::OpenAi => write!(f, "openai"),
        }
    }
}

/// Build the configured provider.
///
/// Returns `None` when no usable API key is present; the pipeline reports that
/// as a configuration error instead of calling out.
pub fn build_provider(
    kind: ProviderKind,
    api_key: Option<&str>,
    model: Option<&str>,
) -> Option<Arc<dyn VisionModel>> {
    let api_key = api_key.map(str::trim).filter(|k| !k.is_empty())?;

    let provider: Arc<dyn VisionModel> = match kind {
        ProviderKind::Gemini => {
            let mut p = GeminiProvider::new(api_key);
            if let Some(model) = model {
                p = p.with_model(model);
            }
            Arc::new(p)
        }
        ProviderKind::OpenAi => {
            let mut p = OpenAiProvider::new(api_key);
            if let Some(model) = model {
                p = p.with_model(model);
            }
            Arc::new(p)
        }
    };
    Some(provider)
}
