//! Turn submission integration tests

use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::json;
use tokochat_assistant::{mock::MockBehavior, FALLBACK_REPLY};
use tower::ServiceExt;

use crate::common::{create_test_jwt, parse_body, request, TestApp, PRICE_REPLY};

mod test_submit_turn {
    use super::*;

    #[tokio::test]
    async fn test_turn_returns_201_with_both_messages() {
        let app = TestApp::new();
        let jwt = create_test_jwt("u1").unwrap();

        let req = request(
            Method::POST,
            "/v1/chat/turns",
            Some(&jwt),
            Some(json!({
                "message": "What is the price?",
                "topicRef": "p42",
                "context": {"name": "Batik shirt", "price": 25000}
            })),
        );

        let resp = app.test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = parse_body(resp).await;
        assert_eq!(body["userMessage"]["authorRole"], "user");
        assert_eq!(body["userMessage"]["body"], "What is the price?");
        assert_eq!(body["userMessage"]["topicRef"], "p42");
        assert_eq!(body["assistantMessage"]["authorRole"], "assistant");
        assert_eq!(body["assistantMessage"]["body"], PRICE_REPLY);
        assert_eq!(
            body["assistantMessage"]["inReplyTo"],
            body["userMessage"]["id"]
        );
        assert_eq!(body["fallback"], false);
        assert_eq!(
            body["suggestions"],
            json!(["How do I order?", "Is it in stock?"])
        );

        let user_seq = body["userMessage"]["sequence"].as_i64().unwrap();
        let reply_seq = body["assistantMessage"]["sequence"].as_i64().unwrap();
        assert!(user_seq < reply_seq);
    }

    #[tokio::test]
    async fn test_turn_forwards_grounding_to_gateway() {
        let app = TestApp::new();
        let jwt = create_test_jwt("u1").unwrap();

        let req = request(
            Method::POST,
            "/v1/chat/turns",
            Some(&jwt),
            Some(json!({
                "message": "What is the price?",
                "topicRef": "p42",
                "context": {"price": 25000}
            })),
        );
        let resp = app.test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let requests = app.gateway.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].message, "What is the price?");
        assert_eq!(requests[0].topic_ref.as_deref(), Some("p42"));
        assert_eq!(requests[0].context, Some(json!({"price": 25000})));
        assert!(requests[0].session_id.ends_with(":p42"));
    }

    #[tokio::test]
    async fn test_turn_without_token_returns_401() {
        let app = TestApp::new();

        let req = request(
            Method::POST,
            "/v1/chat/turns",
            None,
            Some(json!({"message": "Hi"})),
        );

        let resp = app.test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(app.store.all_messages().is_empty());
        assert!(app.gateway.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_turn_with_invalid_token_returns_401() {
        let app = TestApp::new();

        let req = request(
            Method::POST,
            "/v1/chat/turns",
            Some("not-a-jwt"),
            Some(json!({"message": "Hi"})),
        );

        let resp = app.test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body = parse_body(resp).await;
        assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_blank_message_returns_400_without_side_effects() {
        let app = TestApp::new();
        let jwt = create_test_jwt("u1").unwrap();

        let req = request(
            Method::POST,
            "/v1/chat/turns",
            Some(&jwt),
            Some(json!({"message": "   "})),
        );

        let resp = app.test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = parse_body(resp).await;
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert!(app.store.all_messages().is_empty());
        assert!(app.gateway.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_overlong_message_returns_400() {
        let app = TestApp::new();
        let jwt = create_test_jwt("u1").unwrap();

        let req = request(
            Method::POST,
            "/v1/chat/turns",
            Some(&jwt),
            Some(json!({"message": "a".repeat(4001)})),
        );

        let resp = app.test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(app.store.all_messages().is_empty());
    }

    #[tokio::test]
    async fn test_missing_message_field_returns_400() {
        let app = TestApp::new();
        let jwt = create_test_jwt("u1").unwrap();

        let req = request(
            Method::POST,
            "/v1/chat/turns",
            Some(&jwt),
            Some(json!({"topicRef": "p42"})),
        );

        let resp = app.test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_object_context_returns_400() {
        let app = TestApp::new();
        let jwt = create_test_jwt("u1").unwrap();

        let req = request(
            Method::POST,
            "/v1/chat/turns",
            Some(&jwt),
            Some(json!({"message": "Hi", "context": [1, 2, 3]})),
        );

        let resp = app.test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

mod test_fallback {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_assistant_still_completes_turn() {
        let app = TestApp::new();
        app.gateway.set_behavior(MockBehavior::Unavailable);
        let jwt = create_test_jwt("u1").unwrap();

        let req = request(
            Method::POST,
            "/v1/chat/turns",
            Some(&jwt),
            Some(json!({"message": "Is this in stock?", "topicRef": "p42"})),
        );

        let resp = app.test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = parse_body(resp).await;
        assert_eq!(body["fallback"], true);
        assert_eq!(body["assistantMessage"]["body"], FALLBACK_REPLY);
        assert_eq!(app.store.all_messages().len(), 2);
    }

    #[tokio::test]
    async fn test_slow_assistant_times_out_into_fallback() {
        let app = TestApp::with_gateway_timeout(Duration::from_millis(100));
        app.gateway.set_delay(Some(Duration::from_secs(2)));
        let jwt = create_test_jwt("u1").unwrap();

        let req = request(
            Method::POST,
            "/v1/chat/turns",
            Some(&jwt),
            Some(json!({"message": "Hello?"})),
        );

        let resp = app.test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = parse_body(resp).await;
        assert_eq!(body["fallback"], true);
        assert_eq!(body["assistantMessage"]["body"], FALLBACK_REPLY);
    }
}

mod test_storage_failure {
    use super::*;

    #[tokio::test]
    async fn test_store_down_returns_500() {
        let app = TestApp::new();
        app.store.set_unavailable(true);
        let jwt = create_test_jwt("u1").unwrap();

        let req = request(
            Method::POST,
            "/v1/chat/turns",
            Some(&jwt),
            Some(json!({"message": "Hi"})),
        );

        let resp = app.test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = parse_body(resp).await;
        assert_eq!(body["error"]["code"], "STORAGE_UNAVAILABLE");
        assert!(app.gateway.recorded_requests().is_empty());
    }
}

mod test_client_disconnect {
    use super::*;

    #[tokio::test]
    async fn test_turn_completes_after_client_hangs_up() {
        let app = TestApp::new();
        app.gateway.set_delay(Some(Duration::from_millis(200)));
        let jwt = create_test_jwt("u1").unwrap();

        let req = request(
            Method::POST,
            "/v1/chat/turns",
            Some(&jwt),
            Some(json!({"message": "Still there?"})),
        );
        let router = app.test_router();
        let in_flight = tokio::spawn(async move { router.oneshot(req).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        in_flight.abort();
        assert!(in_flight.await.unwrap_err().is_cancelled());

        tokio::time::sleep(Duration::from_millis(400)).await;

        let stored = app.store.all_messages();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].body, "Still there?");
        assert_eq!(stored[1].body, PRICE_REPLY);
        assert_eq!(stored[1].in_reply_to, Some(stored[0].id));
    }
}
