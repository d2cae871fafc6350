//! Shared infrastructure for the services.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use library_core::AppError;
use library_db::Repository;
use tracing::warn;

/// Repository handle plus the per-operation storage deadline.
///
/// Services hold `Arc<ServiceContext>` so both listeners share one instance.
#[derive(Clone)]
pub struct ServiceContext {
    repo: Arc<dyn Repository>,
    storage_timeout: Duration,
}

impl ServiceContext {
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>, storage_timeout: Duration) -> Self {
        Self {
            repo,
            storage_timeout,
        }
    }

    #[inline]
    #[must_use]
    pub fn repo(&self) -> &dyn Repository {
        self.repo.as_ref()
    }

    /// Run a storage call under the configured deadline.
    ///
    /// Expiry drops the in-flight call and fails with `DeadlineExceeded`.
    pub async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        tokio::time::timeout(self.storage_timeout, fut)
            .await
            .unwrap_or_else(|_| {
                warn!(operation, timeout = ?self.storage_timeout, "Storage deadline exceeded");
                Err(AppError::DeadlineExceeded(format!(
                    "{operation} did not complete in time"
                )))
            })
    }
}

#[cfg(test)]
mod tests {
    use library_db::MemoryRepository;

    use super::*;

    fn context(timeout: Duration) -> ServiceContext {
        ServiceContext::new(Arc::new(MemoryRepository::new()), timeout)
    }

    #[tokio::test]
    async fn bounded_passes_result_through() {
        let ctx = context(Duration::from_secs(1));
        assert_eq!(ctx.bounded("op", async { Ok(7) }).await.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_times_out() {
        let ctx = context(Duration::from_millis(10));
        let result: Result<(), _> = ctx
            .bounded("slow", async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(AppError::DeadlineExceeded(_))));
    }
}
