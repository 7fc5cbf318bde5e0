use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::{ScheduleEvent, StylistId};

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for schedule changes: one feed for everything, plus one
/// channel per stylist.
pub struct NotifyHub {
    feed: broadcast::Sender<ScheduleEvent>,
    channels: DashMap<StylistId, broadcast::Sender<ScheduleEvent>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            feed: broadcast::channel(CHANNEL_CAPACITY).0,
            channels: DashMap::new(),
        }
    }

    /// Every schedule change, in order.
    pub fn subscribe_all(&self) -> broadcast::Receiver<ScheduleEvent> {
        self.feed.subscribe()
    }

    /// Changes touching one stylist. Creates the channel if needed.
    pub fn subscribe(&self, stylist: StylistId) -> broadcast::Receiver<ScheduleEvent> {
        let sender = self
            .channels
            .entry(stylist)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send a notification. No-op if nobody is listening.
    pub fn send(&self, event: &ScheduleEvent) {
        let _ = self.feed.send(event.clone());
        if let Some(id) = event.stylist()
            && let Some(sender) = self.channels.get(&id) {
                let _ = sender.send(event.clone());
            }
    }

    /// Drop a stylist's channel (e.g. when the stylist is removed).
    pub fn remove(&self, stylist: &StylistId) {
        self.channels.remove(stylist);
    }
}
