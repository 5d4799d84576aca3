//! Storage processors.
//!
//! Every storage operation is a query struct handled through
//! `kanau::processor::Processor`. [`DatabaseProcessor`] runs them against
//! PostgreSQL; [`crate::memory::MemoryProcessor`] keeps the same semantics in
//! process memory.

use sqlx::PgPool;

/// Something that can hand out a PostgreSQL executor.
pub trait DatabaseAccessor {
    fn acquire(&mut self) -> impl sqlx::PgExecutor<'_>;
}

/// Executes storage queries against a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

impl DatabaseProcessor {
    /// Open a transaction on the pool.
    pub async fn begin(&self) -> Result<TransactionProcessor<'static>, sqlx::Error> {
        Ok(TransactionProcessor {
            tx: self.pool.begin().await?,
        })
    }
}

/// Runs several statements inside one transaction.
pub struct TransactionProcessor<'b> {
    pub tx: sqlx::Transaction<'b, sqlx::Postgres>,
}

impl TransactionProcessor<'_> {
    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }
}

impl DatabaseAccessor for DatabaseProcessor {
    fn acquire(&mut self) -> impl sqlx::PgExecutor<'_> {
        &self.pool
    }
}

impl<'b> DatabaseAccessor for TransactionProcessor<'b> {
    fn acquire(&mut self) -> impl sqlx::PgExecutor<'_> {
        &mut *self.tx
    }
}

/// Whether a driver error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
