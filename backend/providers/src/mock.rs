use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use labelguard_core::{ModelReply, ModelRequest, VisionModel};

/// A vision model that returns a canned reply or a canned failure.
pub struct MockVisionModel {
    reply: std::result::Result<String, String>,
    delay: Duration,
    calls: AtomicUsize,
    last_instruction: Mutex<Option<String>>,
}

impl MockVisionModel {
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last_instruction: Mutex::new(None),
        }
    }

    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last_instruction: Mutex::new(None),
        }
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_instruction(&self) -> Option<String> {
        self.last_instruction.lock().ok().and_then(|g| g.clone())
    }
}

#[async_trait]
impl VisionModel for MockVisionModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_instruction.lock() {
            *last = request.instruction().map(str::to_string);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.reply {
            Ok(text) => Ok(ModelReply {
                text: text.clone(),
                provider: "mock".to_string(),
                model: "mock".to_string(),
                latency_ms: 0,
            }),
            Err(message) => Err(anyhow::anyhow!(message.clone())),
        }
    }
}
