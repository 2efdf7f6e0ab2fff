//! Chat client integration tests
//!
//! Runs the real server on an ephemeral port and drives it through the
//! HTTP transport and the chat surface.

#![allow(dead_code)]

mod common;

use serde_json::json;
use tokochat_assistant::mock::MockBehavior;
use tokochat_client::{
    ChatSurface, EntryStatus, HttpChatTransport, Role, SurfaceConfig, SurfaceState,
    TransportError,
};

use common::{create_test_jwt, TestApp, PRICE_REPLY};

fn bodies(surface: &ChatSurface<HttpChatTransport>) -> Vec<String> {
    surface
        .transcript()
        .entries()
        .iter()
        .map(|e| e.body.clone())
        .collect()
}

mod test_chat_surface {
    use super::*;

    #[tokio::test]
    async fn test_product_surface_full_turn() {
        let app = TestApp::new();
        let base_url = app.spawn_server().await.unwrap();
        let jwt = create_test_jwt("u1").unwrap();

        let transport = HttpChatTransport::new(base_url, Some(jwt));
        let config = SurfaceConfig::for_topic("p42", Some(json!({"price": 25000})));
        let mut surface = ChatSurface::open(transport, config).await;

        assert_eq!(surface.state(), SurfaceState::Idle);
        assert!(surface.transcript().is_empty());
        assert!(surface.error().is_none());

        surface.set_draft("What is the price?").unwrap();
        surface.submit().await.unwrap();

        assert_eq!(surface.state(), SurfaceState::Idle);
        assert!(!surface.is_typing());
        assert_eq!(bodies(&surface), vec!["What is the price?", PRICE_REPLY]);
        assert!(surface
            .transcript()
            .entries()
            .iter()
            .all(|e| e.status == EntryStatus::Confirmed));
        assert_eq!(surface.suggestions().len(), 2);
        assert!(!surface.last_reply_was_fallback());

        let requests = app.gateway.recorded_requests();
        assert_eq!(requests[0].context, Some(json!({"price": 25000})));
    }

    #[tokio::test]
    async fn test_reopened_surface_restores_history() {
        let app = TestApp::new();
        let base_url = app.spawn_server().await.unwrap();
        let jwt = create_test_jwt("u1").unwrap();

        {
            let transport = HttpChatTransport::new(base_url.clone(), Some(jwt.clone()));
            let mut surface =
                ChatSurface::open(transport, SurfaceConfig::for_topic("p42", None)).await;
            surface.set_draft("What is the price?").unwrap();
            surface.submit().await.unwrap();
        }

        let transport = HttpChatTransport::new(base_url.clone(), Some(jwt.clone()));
        let reopened = ChatSurface::open(transport, SurfaceConfig::for_topic("p42", None)).await;
        assert_eq!(bodies(&reopened), vec!["What is the price?", PRICE_REPLY]);
        assert_eq!(reopened.transcript().entries()[0].role, Role::User);

        // Another product's surface starts empty
        let transport = HttpChatTransport::new(base_url, Some(jwt));
        let other = ChatSurface::open(transport, SurfaceConfig::for_topic("p7", None)).await;
        assert!(other.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_suggestion_becomes_next_turn() {
        let app = TestApp::new();
        let base_url = app.spawn_server().await.unwrap();
        let jwt = create_test_jwt("u1").unwrap();

        let transport = HttpChatTransport::new(base_url, Some(jwt));
        let mut surface = ChatSurface::open(transport, SurfaceConfig::general()).await;

        surface.set_draft("Hi").unwrap();
        surface.submit().await.unwrap();

        surface.select_suggestion(0).unwrap();
        assert_eq!(surface.draft(), "How do I order?");
        surface.submit().await.unwrap();

        assert_eq!(surface.transcript().len(), 4);
        assert_eq!(surface.transcript().entries()[2].body, "How do I order?");
    }

    #[tokio::test]
    async fn test_signed_out_surface_is_gated() {
        let app = TestApp::new();
        let base_url = app.spawn_server().await.unwrap();

        let transport = HttpChatTransport::new(base_url, None);
        let mut surface = ChatSurface::open(transport, SurfaceConfig::general()).await;

        assert!(surface.is_gated());
        assert!(!surface.input_enabled());
        assert!(surface.set_draft("Hi").is_err());
        assert!(app.store.all_messages().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_ungated_surface_surfaces_401() {
        let app = TestApp::new();
        let base_url = app.spawn_server().await.unwrap();

        let transport = HttpChatTransport::new(base_url, None);
        let config = SurfaceConfig {
            requires_auth: false,
            ..SurfaceConfig::default()
        };
        let mut surface = ChatSurface::open(transport, config).await;
        assert_eq!(surface.state(), SurfaceState::Idle);

        surface.set_draft("Hi").unwrap();
        surface.submit().await.unwrap();

        assert_eq!(surface.state(), SurfaceState::Idle);
        assert_eq!(
            surface.error(),
            Some(TransportError::Unauthenticated.to_string().as_str())
        );
        assert_eq!(
            surface.transcript().last_failed().map(|e| e.body.as_str()),
            Some("Hi")
        );
    }

    #[tokio::test]
    async fn test_fallback_reply_is_shown_as_normal_answer() {
        let app = TestApp::new();
        app.gateway.set_behavior(MockBehavior::Unavailable);
        let base_url = app.spawn_server().await.unwrap();
        let jwt = create_test_jwt("u1").unwrap();

        let transport = HttpChatTransport::new(base_url, Some(jwt));
        let mut surface = ChatSurface::open(transport, SurfaceConfig::general()).await;

        surface.set_draft("Anyone there?").unwrap();
        surface.submit().await.unwrap();

        assert!(surface.last_reply_was_fallback());
        assert!(surface.error().is_none());
        let last = &surface.transcript().entries()[1];
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.status, EntryStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_failed_turn_can_be_retried() {
        let app = TestApp::new();
        let base_url = app.spawn_server().await.unwrap();
        let jwt = create_test_jwt("u1").unwrap();

        let transport = HttpChatTransport::new(base_url, Some(jwt));
        let mut surface = ChatSurface::open(transport, SurfaceConfig::general()).await;

        app.store.set_unavailable(true);
        surface.set_draft("Hello").unwrap();
        surface.submit().await.unwrap();

        assert!(surface.error().is_some());
        assert_eq!(surface.transcript().entries()[0].status, EntryStatus::Failed);

        app.store.set_unavailable(false);
        surface.retry().await.unwrap();

        assert!(surface.error().is_none());
        assert_eq!(bodies(&surface), vec!["Hello", PRICE_REPLY]);
        assert!(surface.transcript().last_failed().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_surfaces_are_independent() {
        let app = TestApp::new();
        let base_url = app.spawn_server().await.unwrap();
        let jwt = create_test_jwt("u1").unwrap();

        let mut drawer = ChatSurface::open(
            HttpChatTransport::new(base_url.clone(), Some(jwt.clone())),
            SurfaceConfig::for_topic("p42", None),
        )
        .await;
        let mut modal = ChatSurface::open(
            HttpChatTransport::new(base_url, Some(jwt)),
            SurfaceConfig::general(),
        )
        .await;

        drawer.set_draft("Drawer question").unwrap();
        modal.set_draft("Modal question").unwrap();

        let (a, b) = tokio::join!(drawer.submit(), modal.submit());
        a.unwrap();
        b.unwrap();

        assert_eq!(drawer.transcript().entries()[0].body, "Drawer question");
        assert_eq!(modal.transcript().entries()[0].body, "Modal question");
        assert_eq!(drawer.transcript().len(), 2);
        assert_eq!(modal.transcript().len(), 2);
        assert_eq!(app.store.all_messages().len(), 4);
    }
}
