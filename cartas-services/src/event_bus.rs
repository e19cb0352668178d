//! Application event bus.
//!
//! A tokio broadcast channel: services emit, any number of front-end
//! consumers (the CLI spinner, a future UI) subscribe. Slow subscribers lag
//! and may miss events.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

/// Events flowing from the services to whoever renders them.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    GenerationStarted {
        message_id: String,
    },
    /// Display text for the in-progress message after a chunk arrived.
    GenerationProgress {
        message_id: String,
        display: String,
        chunk_index: usize,
    },
    GenerationFinished {
        message_id: String,
        content: String,
    },
    GenerationFailed {
        message_id: String,
        error: String,
    },
    /// Show the upgrade modal for this trigger key.
    UpsellTriggered {
        trigger: String,
        message: String,
    },
    ContactsUpdated {
        count: usize,
    },
    FavoritesUpdated {
        count: usize,
    },
    RemindersUpdated {
        count: usize,
    },
    ReminderDue {
        reminder_id: Option<String>,
        title: String,
        date: String,
    },
    AuthChanged {
        logged_in: bool,
        plan: String,
    },
    OfferDismissed {
        offer_id: String,
    },
}

impl AppEvent {
    pub fn label(&self) -> &'static str {
        match self {
            AppEvent::GenerationStarted { .. } => "GenerationStarted",
            AppEvent::GenerationProgress { .. } => "GenerationProgress",
            AppEvent::GenerationFinished { .. } => "GenerationFinished",
            AppEvent::GenerationFailed { .. } => "GenerationFailed",
            AppEvent::UpsellTriggered { .. } => "UpsellTriggered",
            AppEvent::ContactsUpdated { .. } => "ContactsUpdated",
            AppEvent::FavoritesUpdated { .. } => "FavoritesUpdated",
            AppEvent::RemindersUpdated { .. } => "RemindersUpdated",
            AppEvent::ReminderDue { .. } => "ReminderDue",
            AppEvent::AuthChanged { .. } => "AuthChanged",
            AppEvent::OfferDismissed { .. } => "OfferDismissed",
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<AppEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Emit to all current subscribers. Having none is not an error.
    pub fn emit(&self, event: AppEvent) {
        let label = event.label();
        match self.sender.send(event) {
            Ok(count) => debug!("event_bus: emitted {label} to {count} subscriber(s)"),
            Err(_) => debug!("event_bus: no subscribers for {label}"),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_receive_in_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        for i in 0..3 {
            bus.emit(AppEvent::GenerationProgress {
                message_id: "m".into(),
                display: format!("d{i}"),
                chunk_index: i,
            });
        }

        for i in 0..3 {
            match rx.recv().await.unwrap() {
                AppEvent::GenerationProgress { chunk_index, .. } => assert_eq!(chunk_index, i),
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(AppEvent::ContactsUpdated { count: 2 });
        assert_eq!(rx1.recv().await.unwrap(), AppEvent::ContactsUpdated { count: 2 });
        assert_eq!(rx2.recv().await.unwrap(), AppEvent::ContactsUpdated { count: 2 });
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::default();
        bus.emit(AppEvent::OfferDismissed { offer_id: "x".into() });
        assert_eq!(bus.subscriber_count(), 0);
    }
}
