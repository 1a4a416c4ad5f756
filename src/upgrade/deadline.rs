//! Cancellation deadline for the soft-failing version check.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// A fixed point in time after which pending work is abandoned.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Instant,
}

impl Deadline {
    /// Deadline `timeout` from now.
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self {
            expires_at: Instant::now() + timeout,
        }
    }

    /// Time left before expiry (zero once expired).
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Drive `fut` to completion unless the deadline passes first. An
    /// already expired deadline never polls `fut`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] on expiry, otherwise whatever `fut` returns.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_expired() {
            return Err(timed_out());
        }
        match tokio::time::timeout_at(self.expires_at, fut).await {
            Ok(result) => result,
            Err(_) => Err(timed_out()),
        }
    }
}

fn timed_out() -> Error {
    Error::Network("version check timed out".to_string())
}
