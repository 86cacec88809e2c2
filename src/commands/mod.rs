use crate::{errors::ServiceError, events::EventSender, store::DataStore};
use async_trait::async_trait;
use std::sync::Arc;

/// Command trait for implementing the Command Pattern
///
/// A command validates its own input, loads one aggregate from the store,
/// applies a transition to it, persists the result and publishes a domain
/// event. A failed command never leaves a partially applied transition
/// behind.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command with the given dependencies
    ///
    /// # Arguments
    /// * `store` - Repositories and retry settings
    /// * `event_sender` - Channel to publish domain events
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}

pub mod goals;
pub mod orders;
pub mod tables;
