//! Provider adapter trait definition

use super::error::ProviderError;
use crate::completion::{CompletionRequest, CompletionResponse, TokenUsage};
use crate::router::ProviderModelSpec;
use tokio_util::sync::CancellationToken;

/// Uniform interface over one provider's API
#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider name, matching `ProviderModelSpec::provider`
    fn name(&self) -> &str;

    /// Send the request to `model`
    ///
    /// Implementations should abandon the call promptly once `cancel` fires.
    async fn dispatch(
        &self,
        model: &str,
        request: &CompletionRequest,
        cancel: CancellationToken,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Cost of a completed call
    ///
    /// Defaults to the table's per-1000-token price applied to reported
    /// usage; calls without usage are charged nothing.
    fn cost(&self, spec: &ProviderModelSpec, usage: Option<&TokenUsage>) -> f64 {
        usage
            .map(|u| spec.cost_per_1k_tokens * u.total() as f64 / 1000.0)
            .unwrap_or(0.0)
    }

    /// Context window the adapter actually supports for `model`, when it is
    /// tighter than the static table
    fn context_limit(&self, _model: &str) -> Option<u64> {
        None
    }

    /// Obtain fresh credentials after an auth failure
    async fn refresh_credentials(&self) -> Result<(), ProviderError> {
        Err(ProviderError::other(format!(
            "{} does not support credential refresh",
            self.name()
        )))
    }

    /// Look up the outcome of an earlier dispatch made under `idempotency_key`
    ///
    /// `None` means the provider has no idempotent replay.
    async fn replay(
        &self,
        _model: &str,
        _idempotency_key: &str,
    ) -> Option<Result<CompletionResponse, ProviderError>> {
        None
    }
}
