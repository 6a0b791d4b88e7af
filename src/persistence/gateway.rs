#[allow(unused_imports)]
use crate::logging::log;
use crate::constants::{LIST_NETWORK_EVENT, NETWORK_LISTED_EVENT, SAVE_TIMEOUT_CAVEAT};
use crate::models::{NetworkError, TrailNetwork, ValidationError};
use futures::future::{select, Either};
use std::time::Duration;
use uuid::Uuid;

use super::record::{NetworkListing, Record};
use super::{PersistenceChannel, Timer};

#[derive(Debug, Clone, PartialEq)]
pub enum SaveError {
    /// The record failed validation and was not sent
    Invalid(ValidationError),
    Encode(String),
    /// The request could not be sent
    Transport(String),
    /// The backend acknowledged with an error
    Rejected(String),
    /// No acknowledgment within the deadline; the record may still have been stored
    Timeout { after: Duration },
    /// The channel dropped the acknowledgment listener
    ChannelClosed,
}

impl SaveError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, SaveError::Timeout { .. })
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(e) => write!(f, "Invalid record: {e}"),
            Self::Encode(e) => write!(f, "Failed to encode record: {e}"),
            Self::Transport(e) => write!(f, "Failed to send save request: {e}"),
            Self::Rejected(e) => write!(f, "The server rejected the save: {e}"),
            Self::Timeout { after } => {
                write!(f, "Save timed out after {}s. {SAVE_TIMEOUT_CAVEAT}", after.as_secs())
            }
            Self::ChannelClosed => write!(f, "The connection closed before the save was acknowledged"),
        }
    }
}

impl std::error::Error for SaveError {}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    Transport(String),
    Rejected(String),
    /// The listing could not be decoded
    Malformed(String),
    /// A listed segment references a node that is not listed
    Inconsistent(NetworkError),
    Timeout { after: Duration },
    ChannelClosed,
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "Failed to request the trail network: {e}"),
            Self::Rejected(e) => write!(f, "The server could not list the trail network: {e}"),
            Self::Malformed(e) => write!(f, "Unreadable trail network listing: {e}"),
            Self::Inconsistent(e) => write!(f, "Inconsistent trail network listing: {e}"),
            Self::Timeout { after } => write!(f, "The trail network did not load within {}s", after.as_secs()),
            Self::ChannelClosed => write!(f, "The connection closed before the trail network arrived"),
        }
    }
}

impl std::error::Error for LoadError {}

/// Interpret an acknowledgment payload: null or empty means success,
/// anything else is the error reported by the backend. An object holding
/// only the echoed record `id` is a success too.
///
/// # Errors
///
/// Returns the backend error message
pub fn ack_outcome(payload: &serde_json::Value) -> Result<(), String> {
    use serde_json::Value;

    match payload {
        Value::Null => Ok(()),
        Value::String(s) if s.is_empty() => Ok(()),
        Value::Array(items) if items.is_empty() => Ok(()),
        Value::String(s) => Err(s.clone()),
        Value::Object(map) => match map.get("message").and_then(Value::as_str) {
            Some(message) => Err(message.to_string()),
            None if map.keys().all(|key| key == "id") => Ok(()),
            None => Err(payload.to_string()),
        },
        other => Err(other.to_string()),
    }
}

/// Record id echoed in an acknowledgment, if the backend sent one
#[must_use]
pub fn acknowledged_id(payload: &serde_json::Value) -> Option<Uuid> {
    payload
        .get("id")
        .and_then(serde_json::Value::as_str)
        .and_then(|id| Uuid::parse_str(id).ok())
}

/// How a request/reply exchange ended
enum Reply {
    Payload(serde_json::Value),
    Closed,
    TimedOut,
}

/// Sends records to the backend and waits for their acknowledgment.
pub struct PersistenceGateway<C, T> {
    channel: C,
    timer: T,
    timeout: Duration,
}

impl<C: PersistenceChannel, T: Timer> PersistenceGateway<C, T> {
    pub fn new(channel: C, timer: T, timeout: Duration) -> Self {
        Self {
            channel,
            timer,
            timeout,
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `payload` as `event` and wait for the first `reply_event`
    /// payload that `accepts` takes, or the timeout.
    ///
    /// At most one reply listener exists at a time and the last one is
    /// removed on every exit path.
    async fn exchange(
        &self,
        event: &str,
        payload: serde_json::Value,
        reply_event: &str,
        accepts: impl Fn(&serde_json::Value) -> bool,
    ) -> Result<Reply, String> {
        // Listen before sending so a fast reply cannot be missed
        let mut subscription = self.channel.once(reply_event);
        if let Err(e) = self.channel.emit(event, payload) {
            self.channel.off(subscription.id);
            return Err(e);
        }

        let deadline = self.timer.sleep(self.timeout);
        futures::pin_mut!(deadline);
        loop {
            let outcome = select(subscription.ack, deadline.as_mut()).await;
            self.channel.off(subscription.id);
            let reply = match outcome {
                Either::Left((Ok(payload), _)) if !accepts(&payload) => {
                    log!("Skipping {} reply meant for another request", reply_event);
                    subscription = self.channel.once(reply_event);
                    continue;
                }
                Either::Left((Ok(payload), _)) => Reply::Payload(payload),
                Either::Left((Err(_), _)) => Reply::Closed,
                Either::Right(((), _)) => Reply::TimedOut,
            };
            return Ok(reply);
        }
    }

    /// Send a record and wait for its acknowledgment or the timeout.
    ///
    /// Exactly one acknowledgment listener exists while the save is
    /// outstanding and it is removed on every exit path. Acknowledgments
    /// echoing the id of a different record, such as a late answer to a
    /// save that already timed out, are skipped; one without an id is taken
    /// as the answer to this save.
    ///
    /// # Errors
    ///
    /// See [`SaveError`]
    pub async fn save(&self, record: &Record) -> Result<(), SaveError> {
        record.validate().map_err(SaveError::Invalid)?;
        let payload = record
            .to_payload()
            .map_err(|e| SaveError::Encode(e.to_string()))?;

        let id = record.id();
        let for_this_record = |ack: &serde_json::Value| acknowledged_id(ack).map_or(true, |acked| acked == id);
        let reply = self
            .exchange(record.save_event(), payload, record.ack_event(), for_this_record)
            .await
            .map_err(|e| {
                leptos::logging::error!("Failed to send {} {}: {}", record.kind(), id, e);
                SaveError::Transport(e)
            })?;
        log!("Sent {} {} on {}", record.kind(), id, record.save_event());

        match reply {
            Reply::Payload(payload) => {
                let result = ack_outcome(&payload).map_err(SaveError::Rejected);
                if let Err(e) = &result {
                    leptos::logging::warn!("Save of {} {} rejected: {}", record.kind(), id, e);
                }
                result
            }
            Reply::Closed => Err(SaveError::ChannelClosed),
            Reply::TimedOut => {
                leptos::logging::warn!(
                    "No {} acknowledgment for {} within {:?}",
                    record.ack_event(),
                    id,
                    self.timeout
                );
                Err(SaveError::Timeout { after: self.timeout })
            }
        }
    }

    /// Ask the backend for every stored node and segment.
    ///
    /// # Errors
    ///
    /// See [`LoadError`]
    pub async fn load_network(&self) -> Result<TrailNetwork, LoadError> {
        let reply = self
            .exchange(LIST_NETWORK_EVENT, serde_json::Value::Null, NETWORK_LISTED_EVENT, |_| true)
            .await
            .map_err(LoadError::Transport)?;
        let payload = match reply {
            Reply::Payload(payload) => payload,
            Reply::Closed => return Err(LoadError::ChannelClosed),
            Reply::TimedOut => return Err(LoadError::Timeout { after: self.timeout }),
        };
        if let Some(message) = payload.get("message").and_then(serde_json::Value::as_str) {
            return Err(LoadError::Rejected(message.to_string()));
        }

        let listing: NetworkListing =
            serde_json::from_value(payload).map_err(|e| LoadError::Malformed(e.to_string()))?;
        let (nodes, segments) = (listing.nodes.len(), listing.segments.len());
        let network = listing.into_network().map_err(LoadError::Inconsistent)?;
        log!("Loaded {} nodes and {} segments", nodes, segments);
        Ok(network)
    }
}
