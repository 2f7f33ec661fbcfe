//! Adapter sessions: the backend client an adapter talks through.
//!
//! The client lives behind an async `RwLock` so that a refresh after an
//! expired credential swaps it for every subsequent call at once. Concurrent
//! refreshes triggered by the same stale client collapse into one.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::failure::{BackendFailure, FailureClass};
use super::retry::RetryPolicy;
use crate::domains::tools::ToolError;

/// Builds a fresh backend client.
#[async_trait]
pub trait Connector<C: ?Sized>: Send + Sync {
    async fn connect(&self) -> Result<Arc<C>, BackendFailure>;
}

/// Owns the backend client of one adapter.
pub struct AdapterSession<C: ?Sized> {
    client: RwLock<Arc<C>>,
    connector: Option<Arc<dyn Connector<C>>>,
}

impl<C: ?Sized + Send + Sync> AdapterSession<C> {
    /// A session around a fixed client that is never rebuilt.
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client: RwLock::new(client),
            connector: None,
        }
    }

    /// Connect once now and keep the connector for later refreshes.
    pub async fn connect(connector: Arc<dyn Connector<C>>) -> Result<Self, BackendFailure> {
        let client = connector.connect().await?;
        Ok(Self {
            client: RwLock::new(client),
            connector: Some(connector),
        })
    }

    pub async fn client(&self) -> Arc<C> {
        self.client.read().await.clone()
    }

    /// Replace `stale` with a freshly connected client.
    ///
    /// A no-op when another caller already replaced it.
    pub async fn refresh(&self, stale: &Arc<C>) -> Result<(), BackendFailure> {
        let Some(connector) = &self.connector else {
            return Err(BackendFailure::new(
                FailureClass::AuthExpired,
                "ExpiredToken",
                "credentials expired and this session cannot reconnect",
            ));
        };

        let mut current = self.client.write().await;
        if !Arc::ptr_eq(&current, stale) {
            return Ok(());
        }
        *current = connector.connect().await?;
        info!("Backend session refreshed");
        Ok(())
    }

    /// Run one backend operation under the retry policy.
    ///
    /// Transient failures are retried with backoff until `max_attempts` calls
    /// were made, then reported as [`ToolError::Throttled`]. An expired
    /// credential triggers a single session refresh. Anything else surfaces
    /// immediately.
    pub async fn call<T, F, Fut>(
        &self,
        policy: &RetryPolicy,
        operation: &'static str,
        op: F,
    ) -> Result<T, ToolError>
    where
        F: Fn(Arc<C>) -> Fut,
        Fut: Future<Output = Result<T, BackendFailure>>,
    {
        let mut attempt = 0;
        let mut refreshed = false;

        loop {
            let client = self.client().await;
            attempt += 1;

            let failure = match op(client.clone()).await {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };

            if failure.class == FailureClass::AuthExpired && !refreshed {
                warn!(operation, "Backend credentials expired, refreshing session");
                refreshed = true;
                self.refresh(&client).await?;
                attempt -= 1;
                continue;
            }

            if !failure.is_transient() {
                return Err(failure.into());
            }

            if attempt >= policy.max_attempts {
                warn!(operation, attempt, code = %failure.code, "Retry budget exhausted");
                return Err(ToolError::Throttled {
                    attempts: attempt,
                    message: failure.message,
                });
            }

            let delay = policy.delay_after(attempt);
            warn!(
                operation,
                attempt,
                code = %failure.code,
                delay_ms = delay.as_millis() as u64,
                "Transient backend failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
