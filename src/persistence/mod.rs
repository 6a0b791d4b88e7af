//! Saving records to the backend over an event channel.

mod gateway;
mod record;
#[cfg(target_arch = "wasm32")]
pub mod websocket;

pub use gateway::{ack_outcome, acknowledged_id, LoadError, PersistenceGateway, SaveError};
pub use record::{NetworkListing, Record};

use futures::channel::oneshot;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A one-shot acknowledgment listener
pub struct Subscription {
    pub id: SubscriptionId,
    pub ack: oneshot::Receiver<serde_json::Value>,
}

/// Event-based bidirectional connection to the backend
pub trait PersistenceChannel {
    /// Send `payload` under the `event` name
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be sent
    fn emit(&self, event: &str, payload: serde_json::Value) -> Result<(), String>;

    /// Listen for the next message named `event`
    fn once(&self, event: &str) -> Subscription;

    /// Remove a listener; unknown or already fired ids are ignored
    fn off(&self, id: SubscriptionId);
}

#[allow(async_fn_in_trait)]
pub trait Timer {
    async fn sleep(&self, duration: Duration);
}

/// Browser timer
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooTimer;

impl Timer for GlooTimer {
    async fn sleep(&self, duration: Duration) {
        gloo_timers::future::sleep(duration).await;
    }
}
