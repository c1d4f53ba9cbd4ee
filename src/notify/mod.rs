pub mod handlers;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A transient, user-facing message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Fan-out for user notifications.
///
/// Live listeners subscribe to the broadcast channel; pollers drain the
/// pending queue, which keeps only the newest `capacity` messages.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
    pending: Arc<Mutex<VecDeque<Notification>>>,
    capacity: usize,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            pending: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(NotificationLevel::Info, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(NotificationLevel::Error, message.into());
    }

    fn publish(&self, level: NotificationLevel, message: String) {
        let notification = Notification {
            level,
            message,
            at: Utc::now(),
        };

        if let Ok(mut pending) = self.pending.lock() {
            if pending.len() == self.capacity {
                pending.pop_front();
            }
            pending.push_back(notification.clone());
        }

        match self.sender.send(notification) {
            Ok(receivers) => debug!(receivers, "Notification published"),
            Err(_) => debug!("Notification published with no live receivers"),
        }
    }

    /// Live feed of every notification from now on. The HTTP surface only
    /// serves the pending queue; this is the hook for an embedding app that
    /// wants to push toasts as they happen.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Takes every pending notification, oldest first
    pub fn drain(&self) -> Vec<Notification> {
        self.pending
            .lock()
            .map(|mut pending| pending.drain(..).collect())
            .unwrap_or_default()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(32)
    }
}
