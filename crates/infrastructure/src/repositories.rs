use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{AuthError, Todo, TodoError, TodoId, TodoPatch, User, UserId};

/// ToDo の永続化境界
///
/// 各操作は 1 ドキュメント単位でアトミックであることを前提にします。
/// 所有者チェックは呼び出し側（サービス層）の責務です。
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// `owner` が一致する ToDo を作成日時の新しい順で返す
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Todo>, TodoError>;

    async fn find(&self, id: &TodoId) -> Result<Option<Todo>, TodoError>;

    async fn insert(&self, todo: &Todo) -> Result<(), TodoError>;

    /// パッチのフィールドだけを 1 回の書き込みで反映し、更新後のレコードを返す
    ///
    /// 存在しなければ `NotFound`、`owner` が一致しなければ `Unauthorized`。
    /// パッチにないフィールドは並行する他の更新の結果を保ちます。
    async fn update(
        &self,
        id: &TodoId,
        owner: &UserId,
        patch: TodoPatch,
        now: DateTime<Utc>,
    ) -> Result<Todo, TodoError>;

    /// 物理削除。存在しなければ `NotFound`
    async fn delete(&self, id: &TodoId) -> Result<(), TodoError>;
}

/// ユーザーの永続化境界（メールアドレスで一意）
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 既に同じメールアドレスが登録済みなら `EmailTaken`
    async fn create(&self, user: &User) -> Result<(), AuthError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
}
