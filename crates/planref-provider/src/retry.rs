//! Exponential-backoff retries at the collaborator boundary.
//!
//! Only [`Error::TransientProvider`] is retried. After the last attempt the
//! final error is handed back unchanged.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use planref_core::config::RetrySettings;
use planref_core::traits::{ImageStore, OcrProvider};
use planref_core::{BBox, Error, Result, TextBox};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total tries, including the first one.
    pub max_attempts: usize,
    pub initial_delay: Duration,
    pub multiplier: f32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self { Self::from_settings(&RetrySettings::default()) }
}

impl RetryPolicy {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            initial_delay: settings.initial_delay(),
            multiplier: settings.multiplier,
            max_delay: settings.max_delay(),
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_factor(self.multiplier)
            .with_max_times(self.max_attempts.saturating_sub(1))
    }

    pub async fn run<T, F, Fut>(&self, what: &str, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        op.retry(self.backoff())
            .when(Error::is_transient)
            .notify(|err: &Error, delay: Duration| {
                warn!(operation = what, error = %err, ?delay, "retrying");
            })
            .await
    }
}

/// Wraps a provider or image store so its calls retry transient failures.
pub struct Retrying<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> Retrying<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self { Self { inner, policy } }

    pub fn inner(&self) -> &T { &self.inner }
}

#[async_trait]
impl<P: OcrProvider> OcrProvider for Retrying<P> {
    fn provider_id(&self) -> &str { self.inner.provider_id() }

    async fn recognize(&self, page_image: &Path) -> Result<Vec<TextBox>> {
        self.policy.run("ocr", || self.inner.recognize(page_image)).await
    }
}

#[async_trait]
impl<S: ImageStore> ImageStore for Retrying<S> {
    async fn crop(&self, filename: &str, bbox: BBox) -> Result<Vec<u8>> {
        self.policy.run("crop", || self.inner.crop(filename, bbox)).await
    }
}
