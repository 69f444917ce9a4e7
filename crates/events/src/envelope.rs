//! Committed events as handed to history readers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ecopricing_core::{AggregateId, TenantId};

use crate::Event;

/// Where a committed event sits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamPosition {
    pub tenant_id: TenantId,
    pub aggregate_id: AggregateId,
    /// Starts at 1; equals the aggregate version right after the event.
    pub sequence: u64,
}

/// A committed event with its position and metadata.
///
/// `payload` is the typed event for in-process readers, or its stored JSON
/// form when read back from an event store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    pub event_id: Uuid,
    pub position: StreamPosition,
    pub aggregate_type: String,
    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,
    pub payload: E,
}

impl<E> EventEnvelope<E>
where
    E: Event,
{
    /// Envelope a typed event, taking type name, schema version and business
    /// time from the event itself.
    pub fn wrap(
        event_id: Uuid,
        position: StreamPosition,
        aggregate_type: impl Into<String>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            position,
            aggregate_type: aggregate_type.into(),
            event_type: payload.event_type().to_string(),
            event_version: payload.version(),
            occurred_at: payload.occurred_at(),
            payload,
        }
    }
}

impl<E> EventEnvelope<E> {
    pub fn is(&self, event_type: &str) -> bool {
        self.event_type == event_type
    }

    /// Same metadata, payload converted (e.g. JSON into a typed event).
    pub fn try_map<T, Err>(
        self,
        f: impl FnOnce(E) -> Result<T, Err>,
    ) -> Result<EventEnvelope<T>, Err> {
        Ok(EventEnvelope {
            event_id: self.event_id,
            position: self.position,
            aggregate_type: self.aggregate_type,
            event_type: self.event_type,
            event_version: self.event_version,
            occurred_at: self.occurred_at,
            payload: f(self.payload)?,
        })
    }
}
