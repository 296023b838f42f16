#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![cfg_attr(feature = "fail-on-warnings", deny(clippy::all))]

//! Ownership transfer of loans to external asset owners.
//!
//! A loan can be sold to an owner, bought back, or have a pending intent
//! cancelled. Every state change is written as a new row in an append-only
//! transfer log whose open rows form the loan's effective transfer set.
//! Executing a sale or buyback also posts balanced journal entries that move
//! the loan's outstanding balances through the asset transfer clearing
//! account.

pub mod accounts;
mod atomic_operation;
pub mod business_date;
mod engine;
pub mod execution;
pub mod journal_entry;
pub mod lifecycle;
pub mod loan;
mod loan_lock;
pub mod migrate;
mod outbox;
pub mod owner;
pub mod request;
pub mod transfer;

pub use atomic_operation::AtomicOperation;
pub use engine::*;
pub use outbox::{error::OutboxError, EventSequence, OutboxEvent, OutboxEventPayload, OutboxListener};

pub mod primitives {
    pub use transfer_types::primitives::*;
}

pub mod query {
    pub const DEFAULT_LIMIT: i64 = 100;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PagingArgs {
        pub offset: i64,
        pub limit: i64,
    }

    impl PagingArgs {
        pub fn new(offset: Option<i64>, limit: Option<i64>) -> Self {
            Self {
                offset: offset.filter(|o| *o >= 0).unwrap_or(0),
                limit: limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT),
            }
        }
    }

    impl Default for PagingArgs {
        fn default() -> Self {
            Self::new(None, None)
        }
    }

    #[derive(Debug, Clone, serde::Serialize)]
    pub struct Page<T> {
        pub total_count: i64,
        pub offset: i64,
        pub limit: i64,
        pub entities: Vec<T>,
    }

    impl<T> Page<T> {
        pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
            Page {
                total_count: self.total_count,
                offset: self.offset,
                limit: self.limit,
                entities: self.entities.into_iter().map(f).collect(),
            }
        }
    }
}

pub use primitives::*;
