use crate::error::Result;
use crate::services::ai_service::TextGenerator;
use crate::services::quota_service::QuotaTracker;
use crate::utils::text::snippet;
use std::sync::Arc;

/// Quota-gated access to the text generator.
#[derive(Clone)]
pub struct ModelGateway {
    quota: Arc<QuotaTracker>,
    generator: Arc<dyn TextGenerator>,
}

impl ModelGateway {
    pub fn new(quota: Arc<QuotaTracker>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { quota, generator }
    }

    pub fn quota(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }

    /// `Err` only for `DailyQuotaExceeded`. A failed or blank generation is `Ok(None)`.
    pub async fn gated_call(&self, prompt: &str) -> Result<Option<String>> {
        self.quota.acquire(prompt).await?;

        match self.generator.generate(prompt).await {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    tracing::warn!(prompt = %snippet(prompt, 120), "Model returned blank text");
                    Ok(None)
                } else {
                    Ok(Some(text.to_string()))
                }
            }
            Err(e) => {
                tracing::error!(error = %e, prompt = %snippet(prompt, 120), "Model call failed");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::services::ai_service::MockTextGenerator;
    use crate::services::quota_service::QuotaLimits;

    fn gateway(generator: MockTextGenerator, limits: QuotaLimits) -> ModelGateway {
        ModelGateway::new(Arc::new(QuotaTracker::new(limits)), Arc::new(generator))
    }

    #[tokio::test]
    async fn successful_call_is_trimmed_and_counted() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Ok("  A summary.\n".to_string()));
        let gateway = gateway(generator, QuotaLimits::default());

        let text = gateway.gated_call("Summarize this").await.unwrap();
        assert_eq!(text.as_deref(), Some("A summary."));
        assert_eq!(gateway.quota().snapshot().requests_today, 1);
        assert_eq!(gateway.quota().snapshot().tokens_this_minute, 4);
    }

    #[tokio::test]
    async fn generator_failure_becomes_none() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(Error::Internal("upstream 500".into())));
        let gateway = gateway(generator, QuotaLimits::default());

        assert_eq!(gateway.gated_call("anything").await.unwrap(), None);
        assert_eq!(gateway.quota().snapshot().requests_today, 1);
    }

    #[tokio::test]
    async fn blank_text_becomes_none() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Ok("   \n ".to_string()));
        let gateway = gateway(generator, QuotaLimits::default());

        assert_eq!(gateway.gated_call("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn daily_cap_stops_before_calling_the_model() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().times(0);
        let gateway = gateway(
            generator,
            QuotaLimits {
                max_rpd: 0,
                ..QuotaLimits::default()
            },
        );

        assert!(matches!(
            gateway.gated_call("anything").await,
            Err(Error::DailyQuotaExceeded)
        ));
    }
}
