//! 個人用 ToDo の HTTP API（axum）
//!
//! `/users` で登録・ログインし、発行された JWT で `/todos` を操作します。
//! ToDo は作成者だけが参照・更新・削除できます。

pub mod auth;
pub mod clock;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod service;
pub mod state;

pub use auth::AuthService;
pub use clock::{Clock, SystemClock};
pub use error::ApiError;
pub use routes::app_with_state;
pub use service::TodoService;
pub use state::AppState;

use axum::Router;
use shared::TokenIssuer;

/// インメモリのストアでルータを構築して返します。
pub fn app(tokens: TokenIssuer) -> Router {
    app_with_state(AppState::in_memory(tokens))
}
