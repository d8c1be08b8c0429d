//! Direct-send injection: feeds tokens straight into a ring's ingress without
//! any transport in between.

use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

use crate::error::TokenRingError;
use crate::network::gateway::InjectionGateway;
use crate::ring::sink::{ChannelSink, EventSink, LogSink, MultiSink};
use crate::ring::token_ring::TokenRing;
use crate::ring::types::{RingConfig, Token, TokenEvent};

/// One token that gets delivered, one addressed to a position no ring of
/// ordinary size has, and one with no hop budget at all.
pub fn demo_tokens() -> Vec<Token> {
    vec![
        Token::new("Hello World", 1, 1000),
        Token::new("Undelivered, in some case it could be delivered :)", 1000, 9999),
        Token::new("Too short to live", 0, 0),
    ]
}

/// Injects each token in order through `gateway`, stopping at the first
/// refusal.
pub async fn inject_all<G>(gateway: &G, tokens: Vec<Token>) -> Result<usize, TokenRingError>
where
    G: InjectionGateway + ?Sized,
{
    let mut injected = 0;
    for token in tokens {
        gateway.inject(token).await?;
        injected += 1;
    }
    Ok(injected)
}

/// Runs a ring, injects `tokens`, and collects their outcomes.
///
/// Waits at most `wait` for every token to be accepted or expire, then shuts
/// the ring down. Events are also logged.
pub async fn run_direct(
    config: RingConfig,
    tokens: Vec<Token>,
    wait: Duration,
) -> Result<Vec<TokenEvent>, TokenRingError> {
    let (channel, mut events) = ChannelSink::new();
    let sink: Arc<dyn EventSink> = Arc::new(
        MultiSink::new()
            .with(Arc::new(LogSink))
            .with(Arc::new(channel)),
    );

    let mut ring = TokenRing::new(config, sink)?;
    let ingress = ring.run()?;
    info!("Injecting {} tokens at node {}", tokens.len(), ingress.position());

    let deadline = Instant::now() + wait;
    let expected = match inject_all(&ingress, tokens).await {
        Ok(n) => n,
        Err(e) => {
            ring.shutdown().await;
            return Err(e);
        }
    };

    let mut outcomes = Vec::with_capacity(expected);
    while outcomes.len() < expected {
        match timeout_at(deadline, events.recv()).await {
            Ok(Some(event)) => outcomes.push(event),
            Ok(None) => break,
            Err(_) => {
                warn!(
                    "Only {} of {} tokens resolved before the deadline",
                    outcomes.len(),
                    expected
                );
                break;
            }
        }
    }

    ring.shutdown().await;
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RingError;

    #[tokio::test]
    async fn test_demo_tokens_resolve_in_default_ring() {
        let mut events = run_direct(RingConfig::default(), demo_tokens(), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(events.len(), 3);
        events.sort_by_key(|e| e.payload().to_string());

        assert_eq!(
            events[0],
            TokenEvent::Accepted {
                position: 1,
                payload: "Hello World".into(),
                destination: 1,
                remaining_hops: 993,
            }
        );
        assert_eq!(
            events[1],
            TokenEvent::Expired {
                position: 6,
                payload: "Too short to live".into(),
                destination: 0,
            }
        );
        assert!(!events[2].is_accepted());
        assert_eq!(events[2].payload(), demo_tokens()[1].payload);
    }

    #[tokio::test]
    async fn test_invalid_config_is_reported() {
        let result = run_direct(RingConfig::with_size(1), demo_tokens(), Duration::from_secs(1)).await;
        assert!(matches!(
            result,
            Err(TokenRingError::Ring(RingError::RingTooSmall(1)))
        ));
    }

    #[tokio::test]
    async fn test_nothing_to_inject() {
        let events = run_direct(RingConfig::with_size(3), Vec::new(), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(events.is_empty());
    }
}
