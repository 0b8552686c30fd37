use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::models::MonitorEvent;

pub type EventSender = broadcast::Sender<MonitorEvent>;
pub type EventReceiver = broadcast::Receiver<MonitorEvent>;

const DEVICE_CHANNEL_CAPACITY: usize = 100;

/// Fan-out of monitor events: one ward-wide channel plus lazily created per-device
/// channels. Slow subscribers lag and lose the oldest events; publishers never block.
#[derive(Clone)]
pub struct NotificationService {
    channels: Arc<RwLock<HashMap<String, EventSender>>>,
    global_sender: EventSender,
}

impl NotificationService {
    pub fn new(capacity: usize) -> Self {
        let (global_sender, _) = broadcast::channel(capacity.max(1));

        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            global_sender,
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.global_sender.subscribe()
    }

    pub async fn subscribe_device(&self, device_id: &str) -> EventReceiver {
        let mut channels = self.channels.write().await;
        let sender = channels.entry(device_id.to_string()).or_insert_with(|| {
            debug!("Created event channel for device {}", device_id);
            broadcast::channel(DEVICE_CHANNEL_CAPACITY).0
        });
        sender.subscribe()
    }

    pub async fn publish(&self, event: MonitorEvent) {
        let idle = {
            let channels = self.channels.read().await;
            channels
                .get(event.device_id())
                .is_some_and(|sender| sender.send(event.clone()).is_err())
        };

        if idle {
            let mut channels = self.channels.write().await;
            // A subscriber may have joined since the read lock was released.
            if channels
                .get(event.device_id())
                .is_some_and(|sender| sender.receiver_count() == 0)
            {
                debug!("Dropping idle event channel for device {}", event.device_id());
                channels.remove(event.device_id());
            }
        }

        if self.global_sender.send(event).is_err() {
            debug!("No ward subscribers for monitor event");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.global_sender.receiver_count()
    }

    pub async fn get_active_channels(&self) -> Vec<String> {
        let channels = self.channels.read().await;
        channels.keys().cloned().collect()
    }
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new(1000)
    }
}
