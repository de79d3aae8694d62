// ABOUTME: RAII transaction guard for SQLite multi-statement writes
// ABOUTME: Uncommitted guards roll back when dropped so partial writes are never observable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::{AppError, AppResult};
use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::debug;

/// Transaction wrapper: work through [`executor`](Self::executor), then
/// [`commit`](Self::commit). Dropping without committing rolls back.
pub struct SqliteTransactionGuard {
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteTransactionGuard {
    /// Wrap an open transaction
    #[must_use]
    pub const fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Connection bound to the transaction
    ///
    /// # Errors
    ///
    /// Returns an internal error if the transaction was already committed
    pub fn executor(&mut self) -> AppResult<&mut SqliteConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| AppError::internal("Transaction already completed"))
    }

    /// Commit the transaction
    ///
    /// # Errors
    ///
    /// Returns a database error if the commit fails
    pub async fn commit(mut self) -> AppResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::internal("Transaction already completed"))?;
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transaction: {e}")))
    }
}

impl Drop for SqliteTransactionGuard {
    fn drop(&mut self) {
        if self.tx.is_some() {
            // sqlx queues the rollback when the transaction is dropped
            debug!("Rolling back uncommitted transaction");
        }
    }
}
