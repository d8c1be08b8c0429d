use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RingError;
use crate::ring::{DEFAULT_EDGE_CAPACITY, DEFAULT_RING_SIZE, MIN_RING_SIZE};

/// Index of a node in the ring, `0..size`.
pub type Position = usize;

/// The message carried around the ring.
///
/// Field names on the wire keep the established JSON contract, including the
/// `reciever` spelling; `receiver` is accepted as well.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "data")]
    pub payload: String,
    #[serde(rename = "reciever", alias = "receiver")]
    pub destination: Position,
    #[serde(rename = "ttl")]
    pub remaining_hops: u64,
}

impl Token {
    pub fn new(payload: impl Into<String>, destination: Position, remaining_hops: u64) -> Self {
        Self {
            payload: payload.into(),
            destination,
            remaining_hops,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(to={}, ttl={}, {:?})",
            self.destination, self.remaining_hops, self.payload
        )
    }
}

/// Identifies one directed edge of the ring by the position of the node that
/// owns its sending end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub Position);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge({}->)", self.0)
    }
}

/// One row of the wiring table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    pub position: Position,
    pub inbound: EdgeId,
    pub outbound: EdgeId,
}

/// Terminal outcome of a token, as reported to an event sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenEvent {
    Accepted {
        position: Position,
        payload: String,
        destination: Position,
        remaining_hops: u64,
    },
    Expired {
        position: Position,
        payload: String,
        destination: Position,
    },
}

impl TokenEvent {
    pub fn position(&self) -> Position {
        match self {
            TokenEvent::Accepted { position, .. } | TokenEvent::Expired { position, .. } => {
                *position
            }
        }
    }

    pub fn payload(&self) -> &str {
        match self {
            TokenEvent::Accepted { payload, .. } | TokenEvent::Expired { payload, .. } => payload,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, TokenEvent::Accepted { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingConfig {
    pub size: usize,
    /// Node whose inbound edge receives injected tokens; `size / 2` when unset.
    pub ingress: Option<Position>,
    /// Slots per edge. tokio channels cannot be zero-sized, so 1 is the
    /// closest thing to a rendezvous.
    pub edge_capacity: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_RING_SIZE,
            ingress: None,
            edge_capacity: DEFAULT_EDGE_CAPACITY,
        }
    }
}

impl RingConfig {
    pub fn with_size(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), RingError> {
        if self.size < MIN_RING_SIZE {
            return Err(RingError::RingTooSmall(self.size));
        }
        if let Some(ingress) = self.ingress {
            if ingress >= self.size {
                return Err(RingError::InvalidIngress {
                    ingress,
                    size: self.size,
                });
            }
        }
        if self.edge_capacity == 0 {
            return Err(RingError::InvalidCapacity);
        }
        Ok(())
    }

    pub fn ingress_position(&self) -> Position {
        self.ingress.unwrap_or(self.size / 2)
    }
}

/// Number of forwards a token needs to get from `from` to `to` travelling
/// clockwise in a ring of `size` nodes. Positions outside the ring are
/// taken modulo `size`; `size` must be non-zero.
pub fn clockwise_distance(from: Position, to: Position, size: usize) -> usize {
    (to % size + (size - from % size)) % size
}
