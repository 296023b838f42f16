use chrono::NaiveDate;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::OwnedMutexGuard;

use std::sync::Arc;

use crate::{
    business_date::BusinessDateProvider, loan_lock::LoanLocks, outbox::*, primitives::LoanId,
};

/// One unit of work: a database transaction plus the outbox events it will
/// publish. Dropping it without `commit` rolls everything back.
pub struct AtomicOperation {
    tx: Transaction<'static, Sqlite>,
    outbox: Outbox,
    business_date: NaiveDate,
    accumulated_events: Vec<OutboxEventPayload>,
    _loan_guard: OwnedMutexGuard<()>,
}

impl AtomicOperation {
    pub fn tx(&mut self) -> &mut Transaction<'static, Sqlite> {
        &mut self.tx
    }

    /// Business date captured when the operation began.
    pub fn business_date(&self) -> NaiveDate {
        self.business_date
    }

    pub(crate) fn accumulate(
        &mut self,
        events: impl IntoIterator<Item = impl Into<OutboxEventPayload>>,
    ) {
        self.accumulated_events
            .extend(events.into_iter().map(Into::into));
    }

    pub async fn commit(self) -> Result<(), error::OutboxError> {
        self.outbox
            .persist_events(self.tx, self.accumulated_events)
            .await
    }
}

#[derive(Clone)]
pub(crate) struct Operations {
    pool: SqlitePool,
    outbox: Outbox,
    locks: LoanLocks,
    business_date: Arc<dyn BusinessDateProvider>,
}

impl Operations {
    pub(crate) fn new(
        pool: &SqlitePool,
        outbox: &Outbox,
        business_date: Arc<dyn BusinessDateProvider>,
    ) -> Self {
        Self {
            pool: pool.clone(),
            outbox: outbox.clone(),
            locks: LoanLocks::default(),
            business_date,
        }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn business_date(&self) -> NaiveDate {
        self.business_date.business_date()
    }

    /// Begins an operation that holds the loan's lock until it ends.
    pub(crate) async fn begin_for_loan(
        &self,
        loan_id: LoanId,
    ) -> Result<AtomicOperation, sqlx::Error> {
        let guard = self.locks.acquire(loan_id).await;
        Ok(AtomicOperation {
            tx: self.pool.begin().await?,
            outbox: self.outbox.clone(),
            business_date: self.business_date.business_date(),
            accumulated_events: Vec::new(),
            _loan_guard: guard,
        })
    }
}
