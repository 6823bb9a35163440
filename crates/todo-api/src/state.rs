use crate::auth::AuthService;
use crate::clock::{Clock, SystemClock};
use crate::service::TodoService;
use infrastructure::{InMemoryTodoRepository, InMemoryUserRepository, TodoRepository, UserRepository};
use shared::TokenIssuer;
use std::sync::Arc;

/// アプリケーションの共有状態（リポジトリ以外に可変状態は持たない）
#[derive(Clone)]
pub struct AppState {
    pub todos: TodoService,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(
        todos: Arc<dyn TodoRepository>,
        users: Arc<dyn UserRepository>,
        tokens: TokenIssuer,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            todos: TodoService::new(todos, clock.clone()),
            auth: AuthService::new(users, tokens, clock),
        }
    }

    /// インメモリのリポジトリとシステム時計で組み立てます（開発・テスト用）。
    pub fn in_memory(tokens: TokenIssuer) -> Self {
        Self::new(
            Arc::new(InMemoryTodoRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
            tokens,
            Arc::new(SystemClock),
        )
    }
}
