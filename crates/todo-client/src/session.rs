//! サインイン状態の保持と永続化
//!
//! `SessionContext` が現在のセッションを所有し、`SessionStore` に書き出します。
//! 起動時は `init` で復元し、`sign_out` で破棄します。

use crate::api::AuthApi;
use crate::error::ClientError;
use async_trait::async_trait;
use domain::{AuthResponse, Credentials, Registration, UserProfile};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Self {
            token: response.token,
            user: response.user,
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<Session>, ClientError>;

    async fn save(&self, session: &Session) -> Result<(), ClientError>;

    async fn clear(&self) -> Result<(), ClientError>;
}

/// JSON ファイルに保存するストア
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>, ClientError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ClientError::Storage(e.to_string())),
        };

        // 壊れたファイルはサインアウト状態として扱う
        match serde_json::from_slice(&bytes) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &Session) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ClientError::Storage(e.to_string()))?;
        }
        let json =
            serde_json::to_vec_pretty(session).map_err(|e| ClientError::Storage(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))
    }

    async fn clear(&self) -> Result<(), ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(e.to_string())),
        }
    }
}

/// プロセス内だけで保持するストア（テスト・一時利用向け）
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>, ClientError> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, session: &Session) -> Result<(), ClientError> {
        *self.slot.lock().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        *self.slot.lock().await = None;
        Ok(())
    }
}

pub struct SessionContext {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn SessionStore>,
    current: Option<Session>,
    last_error: Option<String>,
}

impl SessionContext {
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            api,
            store,
            current: None,
            last_error: None,
        }
    }

    /// 保存済みのセッションがあれば復元します。
    pub async fn init(&mut self) -> Result<Option<&Session>, ClientError> {
        self.current = self.store.load().await?;
        if let Some(session) = &self.current {
            info!(user_id = %session.user.id, "Session restored");
        }
        Ok(self.current.as_ref())
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.current.as_ref().map(|s| &s.user)
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<&Session, ClientError> {
        let registration = Registration {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let result = self.api.register(&registration).await;
        self.establish(result).await
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<&Session, ClientError> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let result = self.api.login(&credentials).await;
        self.establish(result).await
    }

    /// メモリ上のセッションと保存先の両方を消します。
    pub async fn sign_out(&mut self) -> Result<(), ClientError> {
        self.current = None;
        self.last_error = None;
        self.store.clear().await
    }

    // 失敗時は既存のセッションを残す
    async fn establish(
        &mut self,
        result: Result<AuthResponse, ClientError>,
    ) -> Result<&Session, ClientError> {
        let session = match result {
            Ok(response) => Session::from(response),
            Err(e) => {
                warn!(error = %e, "Authentication failed");
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        self.store.save(&session).await?;
        info!(user_id = %session.user.id, "Signed in");
        self.last_error = None;
        Ok(self.current.insert(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::UserId;

    fn session(token: &str) -> Session {
        Session {
            token: token.to_string(),
            user: UserProfile {
                id: UserId::from_string("u1".to_string()).unwrap(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            },
        }
    }

    /// 決まった応答を返す認証 API
    struct FakeAuth {
        accept_password: &'static str,
    }

    #[async_trait]
    impl AuthApi for FakeAuth {
        async fn register(&self, registration: &Registration) -> Result<AuthResponse, ClientError> {
            Ok(AuthResponse {
                token: "registered".to_string(),
                user: UserProfile {
                    name: registration.name.clone(),
                    ..session("").user
                },
            })
        }

        async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
            if credentials.password == self.accept_password {
                let Session { token, user } = session("logged-in");
                Ok(AuthResponse { token, user })
            } else {
                Err(ClientError::Api {
                    status: 401,
                    message: "Invalid credentials".to_string(),
                })
            }
        }
    }

    fn context(store: Arc<dyn SessionStore>) -> SessionContext {
        SessionContext::new(
            Arc::new(FakeAuth {
                accept_password: "secret1",
            }),
            store,
        )
    }

    #[tokio::test]
    async fn test_sign_in_persists_and_init_restores() {
        // Arrange
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let mut first = context(store.clone());

        // Act
        first.sign_in("alice@example.com", "secret1").await.unwrap();
        let mut second = context(store);
        let restored = second.init().await.unwrap().cloned();

        // Assert
        assert_eq!(restored, Some(session("logged-in")));
        assert!(second.is_signed_in());
    }

    #[tokio::test]
    async fn test_failed_sign_in_keeps_previous_session() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let mut ctx = context(store);
        ctx.register("Alice", "alice@example.com", "secret1")
            .await
            .unwrap();

        let err = ctx.sign_in("alice@example.com", "wrong").await.unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert_eq!(ctx.last_error(), Some("Invalid credentials"));
        assert_eq!(ctx.current().unwrap().token, "registered");
    }

    #[tokio::test]
    async fn test_sign_out_clears_store() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let mut ctx = context(store.clone());
        ctx.sign_in("alice@example.com", "secret1").await.unwrap();

        ctx.sign_out().await.unwrap();

        assert!(!ctx.is_signed_in());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_round_trip_and_clear() {
        let path = std::env::temp_dir()
            .join(format!("todo-client-{}", ulid::Ulid::new()))
            .join("session.json");
        let store = FileSessionStore::new(&path);

        assert!(store.load().await.unwrap().is_none());
        store.save(&session("abc")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(session("abc")));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        // 二重削除もエラーにしない
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_ignores_corrupt_file() {
        let path = std::env::temp_dir().join(format!("todo-client-{}.json", ulid::Ulid::new()));
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = FileSessionStore::new(&path);
        assert!(store.load().await.unwrap().is_none());

        store.clear().await.unwrap();
    }
}
