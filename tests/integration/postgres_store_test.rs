//! Postgres conversation store tests
//!
//! Run against a real database when `TEST_DATABASE_URL` is set and are
//! skipped otherwise. Every test works under its own owner, so runs do not
//! interfere with each other or with earlier data.

use std::sync::Once;

use chrono::Utc;
use sqlx::PgPool;
use tokochat_conversations::{ConversationStore, Message, NewMessage, Owner, PgConversationStore};

static INIT: Once = Once::new();

/// Connect and migrate, or `None` when no test database is configured
async fn pg_store() -> Option<PgConversationStore> {
    INIT.call_once(|| {
        dotenvy::from_filename(".env.test").ok();
        dotenvy::dotenv().ok();
    });

    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping Postgres store test");
        return None;
    };

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    let store = PgConversationStore::new(pool);
    store.migrate().await.expect("Failed to run migrations");
    Some(store)
}

/// External id no other test run will reuse
fn unique_subject(label: &str) -> String {
    format!(
        "pg-{}-{}",
        label,
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

async fn owner(store: &PgConversationStore, label: &str) -> Owner {
    store
        .upsert_owner(&unique_subject(label), None)
        .await
        .unwrap()
}

async fn turn(
    store: &PgConversationStore,
    owner: &Owner,
    topic: Option<&str>,
    text: &str,
) -> (Message, Message) {
    let question = store
        .append(NewMessage::user(owner.id, topic.map(str::to_string), text.to_string()).unwrap())
        .await
        .unwrap();
    let answer = store
        .append(NewMessage::assistant_reply(&question, format!("re: {}", text)).unwrap())
        .await
        .unwrap();
    (question, answer)
}

fn bodies(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.body.as_str()).collect()
}

mod test_owners {
    use super::*;

    #[tokio::test]
    async fn test_upsert_owner_is_idempotent() {
        let Some(store) = pg_store().await else { return };
        let subject = unique_subject("upsert");

        let first = store.upsert_owner(&subject, None).await.unwrap();
        let second = store
            .upsert_owner(&subject, Some("buyer@example.com"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.external_id, subject);
        assert_eq!(second.email.as_deref(), Some("buyer@example.com"));
    }

    #[tokio::test]
    async fn test_upsert_keeps_email_when_absent() {
        let Some(store) = pg_store().await else { return };
        let subject = unique_subject("email");

        store
            .upsert_owner(&subject, Some("buyer@example.com"))
            .await
            .unwrap();
        let owner = store.upsert_owner(&subject, None).await.unwrap();

        assert_eq!(owner.email.as_deref(), Some("buyer@example.com"));
    }

    #[tokio::test]
    async fn test_find_owner_has_no_side_effect() {
        let Some(store) = pg_store().await else { return };
        let subject = unique_subject("ghost");

        assert!(store.find_owner(&subject).await.unwrap().is_none());
        assert!(store.find_owner(&subject).await.unwrap().is_none());
    }
}

mod test_history {
    use super::*;

    #[tokio::test]
    async fn test_append_assigns_increasing_sequence_and_time() {
        let Some(store) = pg_store().await else { return };
        let owner = owner(&store, "append").await;

        let (q, a) = turn(&store, &owner, Some("p42"), "price?").await;

        assert!(a.sequence > q.sequence);
        assert!(a.created_at >= q.created_at);
        assert_eq!(a.in_reply_to, Some(q.id));
    }

    #[tokio::test]
    async fn test_history_is_ordered_and_scoped() {
        let Some(store) = pg_store().await else { return };
        let u1 = owner(&store, "scoped-1").await;
        let u2 = owner(&store, "scoped-2").await;

        turn(&store, &u1, Some("p42"), "one").await;
        turn(&store, &u2, Some("p42"), "other owner").await;
        turn(&store, &u1, None, "general").await;
        turn(&store, &u1, Some("p42"), "two").await;

        let p42 = store.query_history(u1.id, Some("p42"), 50).await.unwrap();
        assert_eq!(bodies(&p42), vec!["one", "re: one", "two", "re: two"]);

        let all = store.query_history(u1.id, None, 50).await.unwrap();
        assert_eq!(all.len(), 6);
        assert!(all.iter().all(|m| m.owner_id == u1.id));
        assert!(all.windows(2).all(|w| w[0].sequence < w[1].sequence));
    }

    #[tokio::test]
    async fn test_history_limit_keeps_most_recent() {
        let Some(store) = pg_store().await else { return };
        let owner = owner(&store, "limit").await;

        for i in 0..5 {
            turn(&store, &owner, None, &format!("q{}", i)).await;
        }

        let history = store.query_history(owner.id, None, 3).await.unwrap();
        assert_eq!(bodies(&history), vec!["re: q3", "q4", "re: q4"]);
    }

    #[tokio::test]
    async fn test_unanswered_user_message_hidden() {
        let Some(store) = pg_store().await else { return };
        let owner = owner(&store, "pending").await;

        turn(&store, &owner, None, "answered").await;
        store
            .append(NewMessage::user(owner.id, None, "pending".to_string()).unwrap())
            .await
            .unwrap();

        let history = store.query_history(owner.id, None, 50).await.unwrap();
        assert_eq!(bodies(&history), vec!["answered", "re: answered"]);
    }
}
