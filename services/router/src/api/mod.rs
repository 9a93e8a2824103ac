//! HTTP API handlers and routing.

pub mod error;
mod health;
pub mod request_context;
mod v1;

use axum::{
    http::{header, Method},
    routing::post,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Create the main API router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        // Health endpoints
        .merge(health::routes())
        // Original ingress path, kept alongside the versioned one
        .route("/notification", post(v1::notifications::post_notification))
        // API v1 routes
        .nest("/v1", v1::routes())
        // Middleware (last added runs first)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        // Application state
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::producer::IngressProducer;
    use crate::routing::{RoutingConfig, RoutingTable};

    fn test_router() -> (Router, tokio::sync::mpsc::Receiver<fanout_events::KeyedRecord>) {
        let config = RoutingConfig::default();
        let (producer, rx) = IngressProducer::channel("key_", 4);
        let (table, _receivers) = RoutingTable::build(&config);
        let state = AppState::new(producer, table.stats(), config.field);
        (create_router(state), rx)
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let (router, _rx) = test_router();

        let response = router
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_caller_request_id_is_propagated() {
        let (router, _rx) = test_router();

        let response = router
            .oneshot(
                Request::get("/livez")
                    .header("x-request-id", "req-abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "req-abc");
    }

    #[tokio::test]
    async fn test_post_notification_emits_keyed_record() {
        let (router, mut rx) = test_router();

        let response = router
            .oneshot(
                Request::post("/notification")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"id":3,"app":"app3","action":"object.deleted"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"sent to app3");

        let record = rx.recv().await.unwrap();
        assert_eq!(record.key(), "key_3");
        assert_eq!(record.event().app(), Some("app3"));
    }
}
