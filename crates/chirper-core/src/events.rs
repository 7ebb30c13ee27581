use tokio::sync::broadcast;

use chirper_types::events::ChirpEvent;

const DEFAULT_CAPACITY: usize = 256;

/// Fan-out of chirp events to any number of observers.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChirpEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChirpEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    /// Returns how many receivers got it.
    pub fn emit(&self, event: ChirpEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
