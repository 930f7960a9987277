use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use labelguard_core::{AnalysisError, AnalysisRequest, ComplianceResult, VisionModel};
use labelguard_logging::redact_sensitive_data;

use crate::interpreter::interpret;
use crate::prompt::build_request;
use crate::score::classify_failure;

/// Tunables for the outbound model call.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Upper bound on a single model call.
    pub timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}

/// Stateless compliance analysis pipeline.
///
/// Each call is independent: the only shared pieces are the model handle and options.
/// A pipeline without a model answers every valid request with `NotConfigured`.
#[derive(Clone)]
pub struct AnalysisPipeline {
    model: Option<Arc<dyn VisionModel>>,
    options: PipelineOptions,
}

impl AnalysisPipeline {
    pub fn new(model: Option<Arc<dyn VisionModel>>, options: PipelineOptions) -> Self {
        Self { model, options }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.model.as_deref().map(|m| m.name())
    }

    /// Analyze one product image without external cancellation.
    pub async fn analyze_product(
        &self,
        image: Vec<u8>,
        mime_type: &str,
        product_name: Option<&str>,
        product_description: Option<&str>,
    ) -> Result<ComplianceResult, AnalysisError> {
        let request = AnalysisRequest {
            image,
            mime_type: mime_type.to_string(),
            product_name: product_name.map(str::to_string),
            product_description: product_description.map(str::to_string),
        };
        self.analyze(&request, &CancellationToken::new()).await
    }

    /// Run the full pipeline: build, call the model, interpret, score.
    ///
    /// Input is validated before the credential check; neither failure reaches the model.
    #[instrument(skip_all, fields(image_bytes = request.image.len()))]
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<ComplianceResult, AnalysisError> {
        let model_request = build_request(request)?;

        let Some(model) = self.model.as_ref() else {
            warn!("Analysis rejected: no vision model configured");
            return Err(AnalysisError::NotConfigured);
        };

        debug!(
            provider = model.name(),
            instruction_len = model_request.instruction().map(str::len).unwrap_or(0),
            "Built model request"
        );

        let start = Instant::now();
        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                info!(provider = model.name(), "Analysis cancelled while awaiting model");
                return Err(AnalysisError::Cancelled);
            }
            outcome = tokio::time::timeout(self.options.timeout, model.generate(&model_request)) => outcome,
        };

        let reply = match outcome {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => return Err(self.call_failed(model.name(), &format!("{:#}", e))),
            Err(_) => {
                let message = format!(
                    "model call timed out after {}s",
                    self.options.timeout.as_secs_f32()
                );
                return Err(self.call_failed(model.name(), &message));
            }
        };

        let result = interpret(&reply.text).map_err(|e| {
            warn!(provider = %reply.provider, error = %e, "Model reply could not be parsed");
            e
        })?;

        info!(
            provider = %reply.provider,
            model = %reply.model,
            checks = result.compliances.len(),
            score = result.compliance_score,
            latency_ms = start.elapsed().as_millis() as u64,
            "Compliance analysis completed"
        );

        Ok(result)
    }

    fn call_failed(&self, provider: &str, message: &str) -> AnalysisError {
        let message = redact_sensitive_data(message);
        let category = classify_failure(&message);
        error!(provider = %provider, category = %category, error = %message, "Vision model call failed");
        AnalysisError::from_category(category, message)
    }
}
