//! Re-authorization policy: one fresh token, one retry

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    credentials::{Authorize, BearerToken},
    Result,
};

/// Which run of the operation is executing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// Initial attempt with the token as it was
    First,
    /// Replay after the authorizer refreshed the token
    Retried,
}

/// Retries an operation once after a 401, if an authorizer is present
#[derive(Clone, Default)]
pub struct ReauthorizeMiddleware {
    authorizer: Option<Arc<dyn Authorize>>,
}

impl ReauthorizeMiddleware {
    /// Create new middleware; `None` disables recovery
    pub fn new(authorizer: Option<Arc<dyn Authorize>>) -> Self {
        Self { authorizer }
    }

    /// Whether a 401 will be recovered from
    pub fn can_reauthorize(&self) -> bool {
        self.authorizer.is_some()
    }

    /// Execute operation, re-authorizing at most once.
    ///
    /// A second 401, a failing authorizer, and every other error are
    /// returned as-is.
    pub async fn execute<F, Fut, T>(&self, token: &BearerToken, operation: F) -> Result<T>
    where
        F: Fn(Attempt) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let err = match operation(Attempt::First).await {
            Err(e) if e.is_unauthorized() => e,
            other => return other,
        };

        let Some(authorizer) = &self.authorizer else {
            debug!("Received 401 and no authorizer is configured: {err}");
            return Err(err);
        };

        warn!("Received 401, re-authorizing and retrying once");
        authorizer.authorize(token).await?;

        let result = operation(Attempt::Retried).await;
        if result.is_ok() {
            debug!("Request succeeded after re-authorization");
        }
        result
    }
}

impl std::fmt::Debug for ReauthorizeMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReauthorizeMiddleware")
            .field("can_reauthorize", &self.can_reauthorize())
            .finish()
    }
}
