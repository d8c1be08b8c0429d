//! A token ring: a fixed cycle of concurrently running nodes that pass tokens
//! to their successor until the addressed node accepts them or their hop
//! budget runs out.

pub mod error;
pub mod network;
pub mod ring;

pub use error::{GatewayError, RingError, TokenRingError};
pub use ring::sink::{ChannelSink, EventSink, LogSink, MultiSink};
pub use ring::token_ring::{Ingress, TokenRing};
pub use ring::types::{Position, RingConfig, Token, TokenEvent};
