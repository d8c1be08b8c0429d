use futures::future::join_all;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::error::RingError;
use crate::ring::node::{Node, NodeExit};
use crate::ring::sink::EventSink;
use crate::ring::types::{EdgeId, Link, Position, RingConfig, Token};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RingState {
    Built,
    Running,
    Stopped,
}

/// A fixed cycle of nodes, each wired to its successor by a one-way edge.
///
/// The ring is built fully wired but idle; [`TokenRing::run`] spawns one tokio
/// task per node and hands back the [`Ingress`]. Dropping the ring drops the
/// shutdown sender, which every node treats as a shutdown signal.
pub struct TokenRing {
    config: RingConfig,
    topology: Vec<Link>,
    nodes: Vec<Node>,
    ingress: mpsc::Sender<Token>,
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<JoinHandle<NodeExit>>,
    state: RingState,
}

impl TokenRing {
    pub fn new(config: RingConfig, sink: Arc<dyn EventSink>) -> Result<Self, RingError> {
        config.validate()?;
        let size = config.size;

        let (shutdown_tx, _) = watch::channel(false);

        // Edge i is owned by node i and read by node i + 1.
        let (senders, mut receivers): (Vec<_>, Vec<_>) = (0..size)
            .map(|_| mpsc::channel::<Token>(config.edge_capacity))
            .unzip();
        receivers.rotate_right(1);

        let nodes: Vec<Node> = senders
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(position, (outbound, inbound))| {
                Node::new(
                    position,
                    EdgeId(predecessor(position, size)),
                    inbound,
                    outbound,
                    shutdown_tx.subscribe(),
                    Arc::clone(&sink),
                )
            })
            .collect();

        let topology = nodes.iter().map(Node::link).collect();
        let ingress_position = config.ingress_position();
        let ingress = nodes[predecessor(ingress_position, size)].outbound.clone();

        info!(
            "Built token ring of {} nodes (ingress at {}, edge capacity {})",
            size, ingress_position, config.edge_capacity
        );

        Ok(Self {
            config,
            topology,
            nodes,
            ingress,
            shutdown_tx,
            workers: Vec::with_capacity(size),
            state: RingState::Built,
        })
    }

    pub fn with_size(size: usize, sink: Arc<dyn EventSink>) -> Result<Self, RingError> {
        Self::new(RingConfig::with_size(size), sink)
    }

    pub fn size(&self) -> usize {
        self.config.size
    }

    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    pub fn ingress_position(&self) -> Position {
        self.config.ingress_position()
    }

    /// The wiring table, indexed by position. Fixed at construction.
    pub fn topology(&self) -> &[Link] {
        &self.topology
    }

    pub fn is_running(&self) -> bool {
        self.state == RingState::Running
    }

    /// Spawns every node and returns the handle used to inject tokens.
    ///
    /// Must be called from within a tokio runtime. A ring runs at most once.
    pub fn run(&mut self) -> Result<Ingress, RingError> {
        if self.state != RingState::Built {
            return Err(RingError::AlreadyRunning);
        }

        for node in self.nodes.drain(..) {
            let span = tracing::info_span!("node", position = node.position());
            self.workers.push(tokio::spawn(node.run().instrument(span)));
        }
        self.state = RingState::Running;
        info!("Started {} ring workers", self.workers.len());

        Ok(Ingress {
            position: self.ingress_position(),
            sender: self.ingress.clone(),
            shutdown: self.shutdown_tx.subscribe(),
        })
    }

    /// Broadcasts shutdown and waits for every worker to finish.
    ///
    /// Returns the number of workers that exited cleanly. Calling it again, or
    /// on a ring that never ran, returns 0.
    pub async fn shutdown(&mut self) -> usize {
        if self.state == RingState::Stopped {
            return 0;
        }
        self.state = RingState::Stopped;
        self.shutdown_tx.send_replace(true);
        self.nodes.clear();

        let workers = std::mem::take(&mut self.workers);
        if workers.is_empty() {
            return 0;
        }
        info!("Shutting down {} ring workers", workers.len());

        let mut stopped = 0;
        for result in join_all(workers).await {
            match result {
                Ok(_) => stopped += 1,
                Err(e) => error!("Ring worker failed: {}", e),
            }
        }
        info!("Token ring stopped ({} workers)", stopped);
        stopped
    }
}

fn predecessor(position: Position, size: usize) -> Position {
    (position + size - 1) % size
}

/// Entry point for tokens into a running ring.
///
/// Writes into the inbound edge of the ingress node. Cloning is cheap; all
/// clones feed the same edge.
#[derive(Clone, Debug)]
pub struct Ingress {
    position: Position,
    sender: mpsc::Sender<Token>,
    shutdown: watch::Receiver<bool>,
}

impl Ingress {
    /// Node that sees an injected token first.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Hands `token` to the ingress node's edge, waiting for space if the edge
    /// is full. Fails once the ring has been shut down.
    pub async fn inject(&self, token: Token) -> Result<(), RingError> {
        let mut shutdown = self.shutdown.clone();
        if *shutdown.borrow_and_update() {
            return Err(RingError::RingStopped);
        }

        tokio::select! {
            biased;
            _ = shutdown.changed() => Err(RingError::RingStopped),
            sent = self.sender.send(token) => sent.map_err(|_| RingError::RingStopped),
        }
    }
}
