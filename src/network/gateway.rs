use async_trait::async_trait;

use crate::error::RingError;
use crate::ring::token_ring::Ingress;
use crate::ring::types::Token;

/// Something that can place tokens into a ring.
///
/// The gateway does not judge destinations or hop budgets; a token addressed
/// to a position the ring does not have is still injected and will expire.
#[async_trait]
pub trait InjectionGateway: Send + Sync {
    async fn inject(&self, token: Token) -> Result<(), RingError>;
}

#[async_trait]
impl InjectionGateway for Ingress {
    async fn inject(&self, token: Token) -> Result<(), RingError> {
        Ingress::inject(self, token).await
    }
}
