//! Units of work.
//!
//! The in-memory adapters have nothing to roll back, so the provided
//! services either run work directly (`noop`) or serialize it behind a
//! single lock (`serial`).

use std::future::Future;

use anyhow::anyhow;
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};

#[async_trait]
pub trait TransactionService: Send + Sync {
    async fn execute_in_transaction<'a>(
        &self,
        work: BoxFuture<'a, AppResult<()>>,
    ) -> AppResult<()>;

    /// Use cases only open a unit of work when this returns `true`.
    fn supports_transactions(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Runs `work` inside a transaction when the service supports one, carrying
/// its typed result out of the unit of work.
pub async fn transactional<'a, T, F>(service: &dyn TransactionService, work: F) -> AppResult<T>
where
    T: Send + 'a,
    F: Future<Output = AppResult<T>> + Send + 'a,
{
    if !service.supports_transactions() {
        return work.await;
    }

    let mut outcome = None;
    service
        .execute_in_transaction(
            async {
                outcome = Some(work.await?);
                Ok::<(), AppError>(())
            }
            .boxed(),
        )
        .await?;
    outcome.ok_or_else(|| AppError::Internal {
        source: anyhow!("unit of work finished without producing a result"),
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTransactionService;

#[async_trait]
impl TransactionService for NoOpTransactionService {
    async fn execute_in_transaction<'a>(
        &self,
        work: BoxFuture<'a, AppResult<()>>,
    ) -> AppResult<()> {
        work.await
    }

    fn supports_transactions(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Executes one unit of work at a time.
#[derive(Debug, Default)]
pub struct SerialTransactionService {
    lock: Mutex<()>,
}

impl SerialTransactionService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionService for SerialTransactionService {
    async fn execute_in_transaction<'a>(
        &self,
        work: BoxFuture<'a, AppResult<()>>,
    ) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        work.await
    }

    fn supports_transactions(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "serial"
    }
}
