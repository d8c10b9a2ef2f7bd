//! HTTP implementation of the provider gateway.

use super::{ProviderGateway, ProviderResult};
use crate::config::GatewayConfig;
use crate::logging::{content_preview, truncate};
use crate::provider::{extract_confidence, CredentialResolver, ErrorKind, Prompt, ProviderError};
use crate::query::QueryRequest;
use crate::registry::{backoff_delay, BackendDescriptor};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Longest upstream error body kept in a `ProviderResult` message.
const MAX_ERROR_MESSAGE: usize = 200;

/// Gateway issuing real HTTP calls through a shared `reqwest` client.
///
/// # Examples
///
/// ```
/// use verdict::config::GatewayConfig;
/// use verdict::gateway::HttpGateway;
/// use verdict::provider::EnvCredentialResolver;
/// use std::sync::Arc;
///
/// let gateway = HttpGateway::new(Arc::new(EnvCredentialResolver), &GatewayConfig::default());
/// ```
pub struct HttpGateway {
    client: Client,
    credentials: Arc<dyn CredentialResolver>,
    base_delay: Duration,
    enable_content_logging: bool,
}

impl HttpGateway {
    pub fn new(credentials: Arc<dyn CredentialResolver>, config: &GatewayConfig) -> Self {
        Self::with_client(Client::new(), credentials, config)
    }

    /// Build a gateway around an existing client (shared connection pool).
    pub fn with_client(
        client: Client,
        credentials: Arc<dyn CredentialResolver>,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            client,
            credentials,
            base_delay: config.base_delay(),
            enable_content_logging: false,
        }
    }

    /// Include a preview of response text in debug events.
    pub fn with_content_logging(mut self, enabled: bool) -> Self {
        self.enable_content_logging = enabled;
        self
    }

    async fn resolve_credential(
        &self,
        descriptor: &BackendDescriptor,
    ) -> Result<Option<String>, ProviderError> {
        match &descriptor.credential_key {
            Some(key) => Ok(Some(self.credentials.resolve(key).await?)),
            None if descriptor.adapter.requires_credential() => Err(ProviderError::Configuration(
                format!("{} backend requires a credential_key", descriptor.kind),
            )),
            None => Ok(None),
        }
    }

    /// One HTTP attempt bounded by the descriptor's per-attempt timeout.
    async fn attempt(
        &self,
        descriptor: &BackendDescriptor,
        body: &Value,
        credential: Option<&str>,
    ) -> Result<String, ProviderError> {
        let timeout_ms = descriptor.timeout.as_millis() as u64;

        let mut builder = self.client.post(descriptor.endpoint()).json(body);
        for (name, value) in descriptor.adapter.auth_headers(credential) {
            builder = builder.header(name, value);
        }

        let exchange = async {
            let response = builder
                .send()
                .await
                .map_err(|e| ProviderError::from_reqwest(e, timeout_ms))?;

            let status = response.status();
            if !status.is_success() {
                let retry_after = parse_retry_after(response.headers());
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(ProviderError::Upstream {
                    status: status.as_u16(),
                    message: truncate(&message, MAX_ERROR_MESSAGE),
                    retry_after,
                });
            }

            let payload: Value = response.json().await.map_err(|e| {
                ProviderError::InvalidResponse(format!("Response body is not JSON: {}", e))
            })?;
            descriptor.adapter.parse_response(payload)
        };

        // A timed-out attempt's future is dropped here, closing its connection.
        tokio::time::timeout(descriptor.timeout, exchange)
            .await
            .map_err(|_| ProviderError::Timeout(timeout_ms))?
    }

    /// Delay before the next attempt after `error` ended attempt `attempt`.
    fn retry_delay(&self, descriptor: &BackendDescriptor, attempt: u32, error: &ProviderError) -> Duration {
        match error.retry_after() {
            Some(requested) if error.kind() == ErrorKind::RateLimited => {
                requested.min(descriptor.timeout)
            }
            _ => backoff_delay(attempt, self.base_delay, descriptor.timeout),
        }
    }
}

#[async_trait]
impl ProviderGateway for HttpGateway {
    async fn call(
        &self,
        descriptor: &BackendDescriptor,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> ProviderResult {
        let started = Instant::now();
        let mut attempts = 0u32;

        let result = match self.resolve_credential(descriptor).await {
            Err(e) => Err(e),
            Ok(credential) => {
                let body = descriptor.adapter.build_request(&Prompt::for_query(request));
                loop {
                    if cancel.is_cancelled() {
                        break Err(ProviderError::Cancelled);
                    }
                    attempts += 1;

                    let outcome = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(ProviderError::Cancelled),
                        r = self.attempt(descriptor, &body, credential.as_deref()) => r,
                    };

                    match outcome {
                        Ok(text) => break Ok(text),
                        Err(e) if e.is_transient() && attempts < descriptor.max_attempts => {
                            let delay = self.retry_delay(descriptor, attempts, &e);
                            tracing::debug!(
                                request_id = %request.id,
                                backend_id = %descriptor.id,
                                attempt = attempts,
                                error = %e,
                                delay_ms = delay.as_millis() as u64,
                                "Provider attempt failed, retrying"
                            );
                            tokio::select! {
                                biased;
                                _ = cancel.cancelled() => break Err(ProviderError::Cancelled),
                                _ = tokio::time::sleep(delay) => {}
                            }
                        }
                        Err(e) => break Err(e),
                    }
                }
            }
        };

        let latency_ms = started.elapsed().as_millis() as u64;
        let cost = if attempts > 0 {
            descriptor.cost_per_call
        } else {
            0.0
        };

        let result = match result {
            Ok(text) => {
                let confidence = extract_confidence(&text);
                tracing::debug!(
                    request_id = %request.id,
                    backend_id = %descriptor.id,
                    attempts,
                    latency_ms,
                    confidence = ?confidence,
                    preview = ?content_preview(&text, self.enable_content_logging),
                    "Provider call succeeded"
                );
                ProviderResult::success(&descriptor.id, text, latency_ms, confidence)
            }
            Err(e) => {
                let kind = e.kind();
                if kind == ErrorKind::Cancelled {
                    tracing::debug!(
                        request_id = %request.id,
                        backend_id = %descriptor.id,
                        attempts,
                        "Provider call cancelled"
                    );
                } else {
                    tracing::warn!(
                        request_id = %request.id,
                        backend_id = %descriptor.id,
                        attempts,
                        error_kind = %kind,
                        error = %e,
                        "Provider call failed"
                    );
                }
                ProviderResult::failure(&descriptor.id, kind, e.to_string())
            }
        };

        metrics::counter!(
            "verdict_provider_calls_total",
            "provider" => descriptor.id.clone(),
            "outcome" => result.outcome_label(),
        )
        .increment(1);

        result.with_attempts(attempts).with_cost(cost)
    }
}

/// Parse a `Retry-After` header given in whole seconds.
///
/// HTTP-date values are not honoured; the exponential backoff applies instead.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
