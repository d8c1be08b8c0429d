use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Router};
use log::{debug, warn};
use std::sync::Arc;

use crate::error::GatewayError;
use crate::network::gateway::InjectionGateway;
use crate::ring::types::Token;

pub type SharedGateway = Arc<dyn InjectionGateway>;

/// `POST /` takes a JSON token and hands it to the ring.
///
/// Other methods on `/` get `405 Method Not Allowed` from the method router.
pub fn router(gateway: SharedGateway) -> Router {
    Router::new()
        .route("/", post(inject_token))
        .with_state(gateway)
}

pub fn decode_token(body: &[u8]) -> Result<Token, GatewayError> {
    serde_json::from_slice(body).map_err(|e| GatewayError::Decode(e.to_string()))
}

async fn inject_token(State(gateway): State<SharedGateway>, body: Bytes) -> StatusCode {
    let token = match decode_token(&body) {
        Ok(token) => token,
        Err(e) => {
            warn!("Rejected injection: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    debug!("Injecting {}", token);
    match gateway.inject(token).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!("Ring refused token: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RingError;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingGateway {
        tokens: Mutex<Vec<Token>>,
        stopped: bool,
    }

    #[async_trait]
    impl InjectionGateway for RecordingGateway {
        async fn inject(&self, token: Token) -> Result<(), RingError> {
            if self.stopped {
                return Err(RingError::RingStopped);
            }
            self.tokens.lock().unwrap().push(token);
            Ok(())
        }
    }

    fn request(method: Method, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_injects_token() {
        let gateway = Arc::new(RecordingGateway::default());
        let app = router(gateway.clone());

        let response = app
            .oneshot(request(
                Method::POST,
                r#"{"data":"Hello World","reciever":1,"ttl":1000}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
        assert_eq!(
            *gateway.tokens.lock().unwrap(),
            vec![Token::new("Hello World", 1, 1000)]
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let gateway = Arc::new(RecordingGateway::default());

        for body in [
            "not json",
            r#"{"data":"x","reciever":"one","ttl":1}"#,
            r#"{"data":"x","reciever":1,"ttl":-1}"#,
            r#"{"data":"x","ttl":1}"#,
            "",
        ] {
            let response = router(gateway.clone())
                .oneshot(request(Method::POST, body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {:?}", body);
        }
        assert!(gateway.tokens.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_methods_get_explicit_status() {
        let gateway = Arc::new(RecordingGateway::default());

        for method in [Method::GET, Method::PUT, Method::DELETE] {
            let response = router(gateway.clone())
                .oneshot(request(method.clone(), r#"{"data":"x","reciever":1,"ttl":1}"#))
                .await
                .unwrap();
            assert_eq!(
                response.status(),
                StatusCode::METHOD_NOT_ALLOWED,
                "method {}",
                method
            );
        }
        assert!(gateway.tokens.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stopped_ring_is_unavailable() {
        let gateway = Arc::new(RecordingGateway {
            stopped: true,
            ..Default::default()
        });

        let response = router(gateway)
            .oneshot(request(Method::POST, r#"{"data":"x","reciever":1,"ttl":1}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_decode_accepts_out_of_range_destination() {
        let token = decode_token(br#"{"data":"far","reciever":1000,"ttl":9999}"#).unwrap();
        assert_eq!(token, Token::new("far", 1000, 9999));
    }
}
