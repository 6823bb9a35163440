//! 実サーバー（インメモリストア）をエフェメラルポートで起動し、
//! reqwest クライアント・セッション・キャッシュを通しで検証します。

use domain::NewTodo;
use shared::TokenIssuer;
use std::sync::Arc;
use todo_client::{
    CacheState, ClientConfig, ClientError, HttpApi, MemorySessionStore, SessionContext,
    StatusFilter, TodoCache, TodoFilter,
};
use tokio::net::TcpListener;

/// サーバーを起動してベース URL を返す
async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = todo_api::app(TokenIssuer::from_hours("e2e-secret", 1));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn http_api(base_url: &str) -> Arc<HttpApi> {
    Arc::new(HttpApi::new(&ClientConfig::new(base_url)))
}

#[tokio::test]
async fn test_register_create_toggle_delete() {
    // Arrange
    let base_url = spawn_server().await;
    let api = http_api(&base_url);
    let mut session = SessionContext::new(api.clone(), Arc::new(MemorySessionStore::new()));
    let mut cache = TodoCache::new(api);

    // Act: 登録 → サインイン → 作成
    let signed_in = session
        .register("Alice", "alice@example.com", "secret1")
        .await
        .unwrap()
        .clone();
    cache.sign_in(&signed_in).await.unwrap();
    assert_eq!(cache.state(), CacheState::Populated);

    let milk = cache.create(NewTodo::new("Buy milk")).await.unwrap();
    cache
        .create(NewTodo::new("Quarterly report").with_category("work"))
        .await
        .unwrap();

    // Assert
    assert_eq!(milk.owner, signed_in.user.id);
    assert_eq!(milk.category.as_str(), "personal");
    assert_eq!(cache.total_count(), 2);
    assert_eq!(cache.todos()[0].title, "Quarterly report");

    let toggled = cache.toggle_complete(&milk.id, true).await.unwrap();
    assert!(toggled.completed);
    assert!(toggled.updated_at >= milk.updated_at);
    assert_eq!(cache.completion_percentage(), 50.0);
    let done = cache.filtered(&TodoFilter::default().with_status(StatusFilter::Completed));
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].id, milk.id);

    // サーバーから読み直しても同じ内容
    let before = cache.todos().to_vec();
    cache.load().await.unwrap();
    assert_eq!(cache.todos(), before.as_slice());

    cache.delete(&milk.id).await.unwrap();
    assert_eq!(cache.total_count(), 1);
    assert!(cache.get(&milk.id).is_none());
}

#[tokio::test]
async fn test_users_cannot_touch_each_others_todos() {
    let base_url = spawn_server().await;
    let api = http_api(&base_url);

    let mut alice = SessionContext::new(api.clone(), Arc::new(MemorySessionStore::new()));
    let alice_session = alice
        .register("Alice", "alice@example.com", "secret1")
        .await
        .unwrap()
        .clone();
    let mut bob = SessionContext::new(api.clone(), Arc::new(MemorySessionStore::new()));
    let bob_session = bob
        .register("Bob", "bob@example.com", "secret1")
        .await
        .unwrap()
        .clone();

    let mut alice_cache = TodoCache::new(api.clone());
    alice_cache.sign_in(&alice_session).await.unwrap();
    let secret = alice_cache
        .create(NewTodo::new("Alice only"))
        .await
        .unwrap();

    let mut bob_cache = TodoCache::new(api);
    bob_cache.sign_in(&bob_session).await.unwrap();
    assert!(bob_cache.todos().is_empty());

    let err = bob_cache.delete(&secret.id).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(
        bob_cache.last_error(),
        Some("Not authorized to delete this todo")
    );

    alice_cache.load().await.unwrap();
    assert_eq!(alice_cache.todos(), &[secret]);
}

#[tokio::test]
async fn test_sign_in_with_wrong_password_is_rejected() {
    let base_url = spawn_server().await;
    let api = http_api(&base_url);
    let mut session = SessionContext::new(api, Arc::new(MemorySessionStore::new()));
    session
        .register("Alice", "alice@example.com", "secret1")
        .await
        .unwrap();
    session.sign_out().await.unwrap();

    let err = session
        .sign_in("alice@example.com", "wrong-password")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Api { status: 401, .. }));
    assert_eq!(session.last_error(), Some("Invalid credentials"));
    assert!(!session.is_signed_in());
}
