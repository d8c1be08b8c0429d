use std::sync::Arc;
use tokio::sync::mpsc;

use crate::ring::types::{Position, Token, TokenEvent};

/// Receives the terminal outcome of every token.
///
/// Sinks are called from inside node workers, so implementations must not
/// block.
pub trait EventSink: Send + Sync {
    fn accepted(&self, token: &Token, position: Position);
    fn expired(&self, token: &Token, position: Position);
}

/// Reports events as structured log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn accepted(&self, token: &Token, position: Position) {
        tracing::info!(
            position,
            destination = token.destination,
            remaining_hops = token.remaining_hops,
            payload = %token.payload,
            "Token accepted"
        );
    }

    fn expired(&self, token: &Token, position: Position) {
        tracing::info!(
            position,
            destination = token.destination,
            payload = %token.payload,
            "Token expired"
        );
    }
}

/// Forwards events into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<TokenEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TokenEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn publish(&self, event: TokenEvent) {
        // Nobody listening is fine.
        let _ = self.sender.send(event);
    }
}

impl EventSink for ChannelSink {
    fn accepted(&self, token: &Token, position: Position) {
        self.publish(TokenEvent::Accepted {
            position,
            payload: token.payload.clone(),
            destination: token.destination,
            remaining_hops: token.remaining_hops,
        });
    }

    fn expired(&self, token: &Token, position: Position) {
        self.publish(TokenEvent::Expired {
            position,
            payload: token.payload.clone(),
            destination: token.destination,
        });
    }
}

/// Fans every event out to each inner sink in order.
#[derive(Clone, Default)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for MultiSink {
    fn accepted(&self, token: &Token, position: Position) {
        for sink in &self.sinks {
            sink.accepted(token, position);
        }
    }

    fn expired(&self, token: &Token, position: Position) {
        for sink in &self.sinks {
            sink.expired(token, position);
        }
    }
}
