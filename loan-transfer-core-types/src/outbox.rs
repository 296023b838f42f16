use serde::{Deserialize, Serialize};

use crate::{loan::LoanValues, transfer::TransferValues};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub sequence: EventSequence,
    pub payload: OutboxEventPayload,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboxEventPayload {
    OwnershipTransferred {
        transfer: TransferValues,
        loan: LoanValues,
    },
    LoanAccountSnapshot {
        loan: LoanValues,
    },
}

#[derive(
    sqlx::Type, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Copy, Clone, Serialize, Deserialize,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct EventSequence(i64);

impl From<i64> for EventSequence {
    fn from(n: i64) -> Self {
        Self(n)
    }
}

impl From<EventSequence> for i64 {
    fn from(EventSequence(n): EventSequence) -> Self {
        n
    }
}

impl std::fmt::Display for EventSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
