use futures::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use std::{pin::Pin, task::Poll};

use super::OutboxEvent;

/// Stream of events committed after the listener was registered.
pub struct OutboxListener {
    event_receiver: Pin<Box<BroadcastStream<OutboxEvent>>>,
}

impl OutboxListener {
    pub(super) fn new(receiver: broadcast::Receiver<OutboxEvent>) -> Self {
        Self {
            event_receiver: Box::pin(BroadcastStream::new(receiver)),
        }
    }
}

impl Stream for OutboxListener {
    type Item = OutboxEvent;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        loop {
            match self.event_receiver.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => return Poll::Ready(Some(event)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(missed)))) => {
                    tracing::warn!(missed, "outbox listener lagged behind");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
