use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a bounded channel and returns the sender half wrapped.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Domain events published after an aggregate has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderCreated(Uuid),
    OrderItemsChanged(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Table events
    TableStatusChanged {
        table_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Goal management events
    GoalPeriodCreated {
        period_id: Uuid,
        team_id: i32,
        year: i32,
    },
    GoalSetCreated(Uuid),
    GoalAdded {
        goal_set_id: Uuid,
        goal_id: Uuid,
    },
    GoalUpdated {
        goal_set_id: Uuid,
        goal_id: Uuid,
    },
    GoalProgressSubmitted {
        goal_set_id: Uuid,
        goal_id: Uuid,
    },
    GoalProgressApproved {
        goal_set_id: Uuid,
        goal_id: Uuid,
    },
    GoalProgressRejected {
        goal_set_id: Uuid,
        goal_id: Uuid,
    },
    GoalSetSubmitted(Uuid),
    GoalSetApproved {
        goal_set_id: Uuid,
        approver_id: i32,
    },
    GoalSetRejected {
        goal_set_id: Uuid,
        approver_id: i32,
    },
}

/// Logs every published event until the channel closes or `shutdown` fires.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, shutdown: CancellationToken) {
    info!("Starting event processing loop");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Event processing stopped by shutdown");
                break;
            }
            event = rx.recv() => match event {
                Some(event) => match serde_json::to_string(&event) {
                    Ok(payload) => info!(event = %payload, "Domain event"),
                    Err(e) => error!("Failed to serialize event {:?}: {}", event, e),
                },
                None => {
                    info!("Event channel closed");
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_reach_the_receiver() {
        let (sender, mut rx) = EventSender::channel(4);
        let id = Uuid::new_v4();
        sender.send(Event::GoalSetCreated(id)).await.unwrap();
        assert_eq!(rx.recv().await, Some(Event::GoalSetCreated(id)));
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (sender, rx) = EventSender::channel(1);
        drop(rx);
        let err = sender.send(Event::OrderCreated(Uuid::new_v4())).await.unwrap_err();
        assert!(err.starts_with("Failed to send event"));
    }

    #[tokio::test]
    async fn processor_stops_on_shutdown() {
        let (sender, rx) = EventSender::channel(4);
        let shutdown = CancellationToken::new();
        let processor = tokio::spawn(process_events(rx, shutdown.clone()));

        sender.send(Event::OrderCreated(Uuid::new_v4())).await.unwrap();
        shutdown.cancel();

        tokio::time::timeout(std::time::Duration::from_secs(1), processor)
            .await
            .expect("processor exits")
            .unwrap();
    }
}
