//! The Progress Bus (spec.md §3, §6.2): fans `ProgressEvent`s out to
//! WebSocket clients subscribed to a case. Grounded in the one-directional
//! broadcast-forward pattern common to this pack's WebSocket examples: a
//! bounded per-subscriber channel, publishers never block on slow readers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::models::ProgressEvent;

/// Bound chosen so a burst of per-document events (one pipeline run can emit
/// four or five in quick succession) never queues unbounded memory for a
/// subscriber that stopped reading.
const CHANNEL_CAPACITY: usize = 64;

pub type Subscription = mpsc::Receiver<ProgressEvent>;

#[derive(Clone, Default)]
pub struct ProgressBus {
    subscribers: Arc<Mutex<HashMap<String, Vec<mpsc::Sender<ProgressEvent>>>>>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, case_id: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let mut subscribers = self.subscribers.lock().await;
        subscribers.entry(case_id.to_string()).or_default().push(tx);
        rx
    }

    /// Removing a subscriber is best-effort and idempotent: a client that
    /// unsubscribes twice, or never subscribed, is not an error.
    pub async fn unsubscribe(&self, case_id: &str) {
        let mut subscribers = self.subscribers.lock().await;
        if let Some(senders) = subscribers.get_mut(case_id) {
            senders.retain(|tx| !tx.is_closed());
            if senders.is_empty() {
                subscribers.remove(case_id);
            }
        }
    }

    /// Publishes to every current subscriber of `event.case_id`. A
    /// subscriber whose channel is full or has been dropped is pruned
    /// rather than retried — the bus never blocks on a slow reader.
    pub async fn publish(&self, event: ProgressEvent) {
        let mut subscribers = self.subscribers.lock().await;
        let Some(senders) = subscribers.get_mut(&event.case_id) else {
            return;
        };

        senders.retain(|tx| tx.try_send(event.clone()).is_ok() || !tx.is_closed());

        if senders.is_empty() {
            subscribers.remove(&event.case_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProgressEventKind;

    fn test_event(case_id: &str) -> ProgressEvent {
        ProgressEvent::document(ProgressEventKind::DocumentExtracting, case_id, "d1", "f.pdf", 30, "extracting")
    }

    #[tokio::test]
    async fn subscriber_receives_published_event_for_its_case() {
        let bus = ProgressBus::new();
        let mut rx = bus.subscribe("case-1").await;
        bus.publish(test_event("case-1")).await;
        let received = rx.recv().await.unwrap();
        assert_eq!(received.case_id, "case-1");
    }

    #[tokio::test]
    async fn subscriber_does_not_receive_events_for_other_cases() {
        let bus = ProgressBus::new();
        let mut rx = bus.subscribe("case-1").await;
        bus.publish(test_event("case-2")).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_is_a_no_op() {
        let bus = ProgressBus::new();
        bus.publish(test_event("case-1")).await;
    }

    #[tokio::test]
    async fn dropped_receiver_is_pruned_on_next_publish() {
        let bus = ProgressBus::new();
        {
            let _rx = bus.subscribe("case-1").await;
        }
        bus.publish(test_event("case-1")).await;
        assert!(bus.subscribers.lock().await.get("case-1").is_none());
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let bus = ProgressBus::new();
        bus.unsubscribe("never-subscribed").await;
        bus.unsubscribe("never-subscribed").await;
    }
}
