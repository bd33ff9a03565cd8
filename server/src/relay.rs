use std::collections::HashMap;
use std::sync::Arc;

use chalkline_shared::wire::{encode_binary, WireError};
use chalkline_shared::BoardEvent;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tracing::warn;
use uuid::Uuid;

/// An encoded event, shared between every peer queue it is pushed to.
pub type Frame = Arc<Vec<u8>>;

/// Fan-out hub. Every event is pushed to every registered peer, the sender
/// included, under a single lock so all peers see the same order.
pub struct Relay {
    peers: Mutex<HashMap<Uuid, mpsc::Sender<Frame>>>,
    peer_buffer: usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub dropped: usize,
    pub stale: usize,
}

impl Relay {
    pub fn new(peer_buffer: usize) -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
            peer_buffer: peer_buffer.max(1),
        }
    }

    /// Registers a peer. Nothing is replayed to it; it starts from a blank board.
    pub async fn connect(&self) -> (Uuid, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(self.peer_buffer);
        let peer = Uuid::new_v4();
        self.peers.lock().await.insert(peer, tx);
        (peer, rx)
    }

    /// Deregisters a peer and returns how many remain.
    pub async fn disconnect(&self, peer: Uuid) -> usize {
        let mut peers = self.peers.lock().await;
        peers.remove(&peer);
        peers.len()
    }

    pub async fn peer_count(&self) -> usize {
        self.peers.lock().await.len()
    }

    pub async fn broadcast(&self, event: &BoardEvent) -> Result<Delivery, WireError> {
        let frame: Frame = Arc::new(encode_binary(event)?);
        let mut delivery = Delivery::default();
        let mut peers = self.peers.lock().await;
        let mut stale = Vec::new();
        for (id, tx) in peers.iter() {
            match tx.try_send(frame.clone()) {
                Ok(()) => delivery.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(peer = %id, kind = event.kind(), "peer queue full, frame dropped");
                    delivery.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => stale.push(*id),
            }
        }
        for id in stale {
            peers.remove(&id);
            delivery.stale += 1;
        }
        Ok(delivery)
    }
}

#[cfg(test)]
mod tests {
    use chalkline_shared::wire::decode_binary;
    use chalkline_shared::{HistorySync, Snapshot, StrokePoint, StrokeSegment};

    use super::*;

    fn segment(x: f32) -> BoardEvent {
        BoardEvent::DrawStroke(StrokeSegment {
            x,
            y: 1.0,
            color: "red".into(),
            width: 3.0,
        })
    }

    fn next_event(rx: &mut mpsc::Receiver<Frame>) -> BoardEvent {
        let frame = rx.try_recv().expect("frame queued");
        decode_binary(&frame).expect("valid frame")
    }

    #[tokio::test]
    async fn stroke_reaches_all_peers_including_sender() {
        let relay = Relay::new(8);
        let (_a, mut rx_a) = relay.connect().await;
        let (_b, mut rx_b) = relay.connect().await;
        let (_c, mut rx_c) = relay.connect().await;

        let event = segment(4.0);
        let delivery = relay.broadcast(&event).await.unwrap();
        assert_eq!(
            delivery,
            Delivery {
                delivered: 3,
                dropped: 0,
                stale: 0,
            }
        );
        for rx in [&mut rx_a, &mut rx_b, &mut rx_c] {
            assert_eq!(next_event(rx), event);
        }
    }

    #[tokio::test]
    async fn peers_see_broadcasts_in_the_same_order() {
        let relay = Relay::new(8);
        let (_a, mut rx_a) = relay.connect().await;
        let (_b, mut rx_b) = relay.connect().await;

        let events = vec![
            BoardEvent::BeginPath(StrokePoint::new(0.0, 0.0)),
            segment(1.0),
            BoardEvent::RedoUndo(HistorySync {
                track: 0,
                stack: vec![Snapshot::new("s0"), Snapshot::new("s1")],
            }),
            segment(2.0),
        ];
        for event in &events {
            relay.broadcast(event).await.unwrap();
        }
        for rx in [&mut rx_a, &mut rx_b] {
            let received = (0..events.len()).map(|_| next_event(rx)).collect::<Vec<_>>();
            assert_eq!(received, events);
        }
    }

    #[tokio::test]
    async fn late_joiner_gets_no_backlog() {
        let relay = Relay::new(8);
        let (_a, _rx_a) = relay.connect().await;
        relay.broadcast(&segment(1.0)).await.unwrap();
        let (_b, mut rx_b) = relay.connect().await;
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnected_peer_is_skipped() {
        let relay = Relay::new(8);
        let (a, _rx_a) = relay.connect().await;
        let (_b, mut rx_b) = relay.connect().await;

        assert_eq!(relay.disconnect(a).await, 1);
        let delivery = relay.broadcast(&segment(1.0)).await.unwrap();
        assert_eq!(delivery.delivered, 1);
        assert_eq!(next_event(&mut rx_b), segment(1.0));
    }

    #[tokio::test]
    async fn closed_queue_is_pruned_without_affecting_others() {
        let relay = Relay::new(8);
        let (_a, rx_a) = relay.connect().await;
        let (_b, mut rx_b) = relay.connect().await;
        drop(rx_a);

        let delivery = relay.broadcast(&segment(2.0)).await.unwrap();
        assert_eq!(delivery.delivered, 1);
        assert_eq!(delivery.stale, 1);
        assert_eq!(relay.peer_count().await, 1);
        assert_eq!(next_event(&mut rx_b), segment(2.0));
    }

    #[tokio::test]
    async fn full_queue_drops_only_for_that_peer() {
        let relay = Relay::new(1);
        let (_slow, mut rx_slow) = relay.connect().await;
        let (_fast, mut rx_fast) = relay.connect().await;

        relay.broadcast(&segment(1.0)).await.unwrap();
        assert_eq!(next_event(&mut rx_fast), segment(1.0));

        let delivery = relay.broadcast(&segment(2.0)).await.unwrap();
        assert_eq!(delivery.delivered, 1);
        assert_eq!(delivery.dropped, 1);
        assert_eq!(next_event(&mut rx_fast), segment(2.0));

        assert_eq!(next_event(&mut rx_slow), segment(1.0));
        assert!(rx_slow.try_recv().is_err());
        assert_eq!(relay.peer_count().await, 2);
    }
}
