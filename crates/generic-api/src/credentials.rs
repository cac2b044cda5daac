//! Bearer credentials and the re-authorization capability

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::Result;

/// Shared, replaceable bearer token.
///
/// Cloning yields a handle to the same token, so an [`Authorize`]
/// implementation can keep its own copy and update it from anywhere.
#[derive(Clone, Default)]
pub struct BearerToken {
    inner: Arc<RwLock<String>>,
}

impl BearerToken {
    /// Create a holder with an initial token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(token.into())),
        }
    }

    /// Current token value
    pub fn get(&self) -> String {
        self.inner.read().clone()
    }

    /// Replace the token
    pub fn set(&self, token: impl Into<String>) {
        *self.inner.write() = token.into();
    }

    /// Whether a token has been set
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_empty() { "<empty>" } else { "<redacted>" };
        f.debug_tuple("BearerToken").field(&state).finish()
    }
}

/// Capability to obtain a fresh token after the server answered 401.
///
/// The client calls [`Authorize::authorize`] at most once per request and
/// then replays the request with whatever token the holder contains.
#[async_trait]
pub trait Authorize: Send + Sync {
    /// Refresh `token` in place
    async fn authorize(&self, token: &BearerToken) -> Result<()>;
}
