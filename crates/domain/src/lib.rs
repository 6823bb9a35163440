//! 個人用 ToDo サービスのドメインモデル
//!
//! ToDo レコード・ユーザー・所有者チェックを扱います。
//! 永続化や HTTP の知識は持たず、値の検証と状態遷移だけを担当します。

pub mod errors;
pub mod todo;
pub mod user;

pub use errors::*;
pub use todo::*;
pub use user::*;
