pub mod error;
mod listener;
mod repo;

use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::broadcast;
use tracing::instrument;

pub use transfer_types::outbox::*;

use error::*;
pub use listener::*;
use repo::*;

const DEFAULT_BUFFER_SIZE: usize = 100;

#[derive(Clone)]
pub(crate) struct Outbox {
    repo: OutboxRepo,
    event_sender: broadcast::Sender<OutboxEvent>,
}

impl Outbox {
    pub(crate) fn new(pool: &SqlitePool) -> Self {
        let (event_sender, _) = broadcast::channel(DEFAULT_BUFFER_SIZE);
        Self {
            repo: OutboxRepo::new(pool),
            event_sender,
        }
    }

    /// Persists the events in `tx`, commits it and then broadcasts them.
    pub(crate) async fn persist_events(
        &self,
        mut tx: Transaction<'_, Sqlite>,
        events: impl IntoIterator<Item = impl Into<OutboxEventPayload>>,
    ) -> Result<(), OutboxError> {
        let events = self
            .repo
            .persist_events(&mut tx, events.into_iter().map(Into::into))
            .await?;
        tx.commit().await?;

        for event in events {
            // Nobody listening is not an error.
            let _ = self.event_sender.send(event);
        }
        Ok(())
    }

    pub(crate) fn register_listener(&self) -> OutboxListener {
        OutboxListener::new(self.event_sender.subscribe())
    }

    #[instrument(name = "loan_transfer.outbox.list_events", skip(self), err)]
    pub(crate) async fn list_events(
        &self,
        after: Option<EventSequence>,
        limit: i64,
    ) -> Result<Vec<OutboxEvent>, OutboxError> {
        self.repo.list_after(after, limit).await
    }
}
