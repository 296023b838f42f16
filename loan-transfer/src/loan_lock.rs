use tokio::sync::{Mutex, OwnedMutexGuard};

use std::{collections::HashMap, sync::Arc};

use crate::primitives::LoanId;

/// Serializes units of work touching the same loan.
#[derive(Clone, Default)]
pub(crate) struct LoanLocks {
    locks: Arc<Mutex<HashMap<LoanId, Arc<Mutex<()>>>>>,
}

impl LoanLocks {
    pub(crate) async fn acquire(&self, loan_id: LoanId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(loan_id).or_default())
        };
        lock.lock_owned().await
    }
}
