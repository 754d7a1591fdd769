//! Adapter built from an async closure
//!
//! Lets callers inject a dispatch function without writing an adapter type.

use super::adapter::ProviderAdapter;
use super::error::ProviderError;
use crate::completion::{CompletionRequest, CompletionResponse};
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

/// Future returned by a dispatch closure
pub type DispatchFuture = BoxFuture<'static, Result<CompletionResponse, ProviderError>>;

/// Owned arguments handed to a dispatch closure
#[derive(Debug, Clone)]
pub struct DispatchCall {
    /// Target model
    pub model: String,
    /// The request being executed
    pub request: CompletionRequest,
    /// Fires when the caller gives up
    pub cancel: CancellationToken,
}

/// Adapter that forwards `dispatch` to a closure
pub struct FnProvider<F> {
    name: String,
    dispatch: F,
}

impl<F> FnProvider<F>
where
    F: Fn(DispatchCall) -> DispatchFuture + Send + Sync,
{
    /// Wrap `dispatch` as the adapter for `name`
    pub fn new(name: impl Into<String>, dispatch: F) -> Self {
        Self {
            name: name.into(),
            dispatch,
        }
    }
}

impl<F> std::fmt::Debug for FnProvider<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnProvider")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl<F> ProviderAdapter for FnProvider<F>
where
    F: Fn(DispatchCall) -> DispatchFuture + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn dispatch(
        &self,
        model: &str,
        request: &CompletionRequest,
        cancel: CancellationToken,
    ) -> Result<CompletionResponse, ProviderError> {
        (self.dispatch)(DispatchCall {
            model: model.to_string(),
            request: request.clone(),
            cancel,
        })
        .await
    }
}
