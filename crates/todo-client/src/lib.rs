//! 個人用 ToDo API のクライアント
//!
//! - `HttpApi`: reqwest による `/users`・`/todos` 呼び出し
//! - `SessionContext`: サインイン状態（トークン + プロフィール）の保持と永続化
//! - `TodoCache`: ToDo のメモリ上のミラーと、絞り込み・完了率・カテゴリ別の派生ビュー

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod session;
pub mod views;

pub use api::{AuthApi, HttpApi, TodoApi};
pub use cache::{CacheState, TodoCache};
pub use config::ClientConfig;
pub use error::ClientError;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionContext, SessionStore};
pub use views::{CategoryFilter, StatusFilter, TodoFilter};
