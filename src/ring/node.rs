use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::ring::sink::EventSink;
use crate::ring::types::{EdgeId, Link, Position, Token};

/// What a node does with a token it has just received.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The token is addressed to this node.
    Accept,
    /// Not ours and hops remain: decrement and pass to the successor.
    Forward,
    /// Not ours and the hop budget is spent.
    Expire,
}

/// Decides the fate of `token` at `position`.
pub fn transition(position: Position, token: &Token) -> Transition {
    if token.destination == position {
        Transition::Accept
    } else if token.remaining_hops > 0 {
        Transition::Forward
    } else {
        Transition::Expire
    }
}

/// Why a node worker stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeExit {
    /// The shutdown signal was observed.
    Shutdown,
    /// A neighbouring edge closed underneath the node.
    Disconnected,
}

enum Step {
    Continue,
    Stop(NodeExit),
}

/// One position in the ring.
///
/// A node exclusively owns the receiving end of the edge from its predecessor
/// and the sending end of the edge to its successor. Tokens move between nodes
/// only by being sent over those edges, so at any moment a token is held by
/// exactly one node.
pub struct Node {
    pub(crate) position: Position,
    pub(crate) inbound_edge: EdgeId,
    pub(crate) inbound: mpsc::Receiver<Token>,
    pub(crate) outbound: mpsc::Sender<Token>,
    shutdown: watch::Receiver<bool>,
    sink: Arc<dyn EventSink>,
}

impl Node {
    pub(crate) fn new(
        position: Position,
        inbound_edge: EdgeId,
        inbound: mpsc::Receiver<Token>,
        outbound: mpsc::Sender<Token>,
        shutdown: watch::Receiver<bool>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            position,
            inbound_edge,
            inbound,
            outbound,
            shutdown,
            sink,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn link(&self) -> Link {
        Link {
            position: self.position,
            inbound: self.inbound_edge,
            outbound: EdgeId(self.position),
        }
    }

    fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Processes tokens until shutdown is broadcast or an edge closes.
    pub async fn run(mut self) -> NodeExit {
        debug!("Node {} started", self.position);

        let exit = loop {
            let token = tokio::select! {
                biased;
                _ = self.shutdown.changed() => break NodeExit::Shutdown,
                received = self.inbound.recv() => match received {
                    Some(token) => token,
                    None => break NodeExit::Disconnected,
                },
            };

            if let Step::Stop(exit) = self.handle(token).await {
                break exit;
            }
        };

        debug!("Node {} stopped ({:?})", self.position, exit);
        exit
    }

    async fn handle(&mut self, mut token: Token) -> Step {
        // A token that raced the shutdown signal is dropped unreported.
        if self.is_shutting_down() {
            return Step::Stop(NodeExit::Shutdown);
        }

        match transition(self.position, &token) {
            Transition::Accept => {
                self.sink.accepted(&token, self.position);
                Step::Continue
            }
            Transition::Expire => {
                self.sink.expired(&token, self.position);
                Step::Continue
            }
            Transition::Forward => {
                token.remaining_hops -= 1;
                self.forward(token).await
            }
        }
    }

    /// Sends to the successor, giving up if shutdown arrives while the
    /// successor is not accepting.
    async fn forward(&mut self, token: Token) -> Step {
        tokio::select! {
            biased;
            _ = self.shutdown.changed() => Step::Stop(NodeExit::Shutdown),
            sent = self.outbound.send(token) => match sent {
                Ok(()) => Step::Continue,
                Err(mpsc::error::SendError(token)) => {
                    warn!(
                        "Node {} lost its successor while forwarding {}",
                        self.position, token
                    );
                    Step::Stop(NodeExit::Disconnected)
                }
            },
        }
    }
}
