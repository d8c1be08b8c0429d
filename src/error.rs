use thiserror::Error;

use crate::ring::types::Position;

#[derive(Error, Debug)]
pub enum TokenRingError {
    #[error("Ring error: {0}")]
    Ring(#[from] RingError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingError {
    #[error("Ring needs at least 2 nodes, got {0}")]
    RingTooSmall(usize),

    #[error("Ingress position {ingress} is outside a ring of {size} nodes")]
    InvalidIngress { ingress: Position, size: usize },

    #[error("Edge capacity must be at least 1")]
    InvalidCapacity,

    #[error("Ring is already running")]
    AlreadyRunning,

    #[error("Ring has stopped")]
    RingStopped,
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Failed to decode token: {0}")]
    Decode(String),

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind listener: {0}")]
    Bind(String),

    #[error("Server error: {0}")]
    Serve(String),

    #[error("Ring rejected token: {0}")]
    Ring(#[from] RingError),
}
