use std::sync::Arc;

use crate::relay::Relay;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub max_message_bytes: usize,
}

impl AppState {
    pub fn new(peer_buffer: usize, max_message_bytes: usize) -> Self {
        Self {
            relay: Arc::new(Relay::new(peer_buffer)),
            max_message_bytes,
        }
    }
}
