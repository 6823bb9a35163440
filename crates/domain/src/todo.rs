use crate::errors::{DomainError, TodoError};
use crate::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// 外部から受け取った ID を取り込みます。
    /// 存在しない ID は NotFound として扱うため、空文字以外は受け付けます。
    pub fn from_string(id: String) -> Result<Self, DomainError> {
        if id.trim().is_empty() {
            return Err(DomainError::InvalidTodoId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// カテゴリ（自由なラベル。既定値は personal）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    pub const PERSONAL: &'static str = "personal";

    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation(
                "Category cannot be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn personal() -> Self {
        Self(Self::PERSONAL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::personal()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Category {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.0
    }
}

/// ToDo レコード（ストアが返す正規の形）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 作成リクエストの内容
///
/// `owner` や `id` はここに含めません。ペイロードに含まれていても
/// デシリアライズ時に捨てられ、所有者は常に呼び出し元になります。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// 部分更新。指定されたフィールドだけが既存レコードに上書きされます。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// 検証済みのパッチを返します（タイトルとカテゴリは前後の空白を除去）。
    /// ストア側で部分更新する前にも同じ規則を通します。
    pub fn normalized(self) -> Result<Self, DomainError> {
        let title = self.title.as_deref().map(validate_title).transpose()?;
        let category = self
            .category
            .map(|c| Category::parse(c).map(String::from))
            .transpose()?;

        Ok(Self {
            title,
            category,
            ..self
        })
    }
}

fn validate_title(title: &str) -> Result<String, DomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation("Title is required".to_string()));
    }
    Ok(trimmed.to_string())
}

impl Todo {
    /// 新しい ToDo を作成します。所有者は引数の `owner` で固定されます。
    pub fn create(owner: UserId, draft: NewTodo, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let title = validate_title(&draft.title)?;
        let category = match draft.category {
            Some(c) => Category::parse(c)?,
            None => Category::default(),
        };

        Ok(Self {
            id: TodoId::new(),
            owner,
            title,
            description: draft.description.unwrap_or_default(),
            category,
            completed: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_owned_by(&self, caller: &UserId) -> bool {
        self.owner == *caller
    }

    /// パッチを適用し `updated_at` を更新します。
    /// 検証はすべて適用前に行うため、失敗時にレコードは変化しません。
    pub fn apply(&mut self, patch: TodoPatch, now: DateTime<Utc>) -> Result<(), DomainError> {
        let patch = patch.normalized()?;

        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(category) = patch.category {
            self.category = Category(category);
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.updated_at = now;

        Ok(())
    }
}

/// 所有者チェック。単一レコードの取得・更新・削除の前に必ず通します。
pub fn authorize(todo: Todo, caller: &UserId) -> Result<Todo, TodoError> {
    if todo.is_owned_by(caller) {
        Ok(todo)
    } else {
        Err(TodoError::Unauthorized(todo.id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(id: &str) -> UserId {
        UserId::from_string(id.to_string()).unwrap()
    }

    #[test]
    fn test_create_applies_defaults() {
        // Arrange
        let now = Utc::now();

        // Act
        let todo = Todo::create(user("u1"), NewTodo::new("Buy milk"), now).unwrap();

        // Assert
        assert_eq!(todo.owner, user("u1"));
        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.description, "");
        assert_eq!(todo.category, Category::personal());
        assert!(!todo.completed);
        assert_eq!(todo.created_at, now);
        assert_eq!(todo.updated_at, now);
        assert_eq!(todo.id.as_str().len(), 26);
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let err = Todo::create(user("u1"), NewTodo::new("   "), Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::Validation("Title is required".to_string()));
    }

    #[test]
    fn test_create_rejects_empty_category() {
        let draft = NewTodo::new("Run").with_category(" ");
        assert!(Todo::create(user("u1"), draft, Utc::now()).is_err());
    }

    #[test]
    fn test_new_todo_ignores_owner_in_payload() {
        let draft: NewTodo = serde_json::from_value(serde_json::json!({
            "title": "Stretch",
            "owner": "someone-else",
            "category": "health"
        }))
        .unwrap();

        let todo = Todo::create(user("u1"), draft, Utc::now()).unwrap();
        assert_eq!(todo.owner, user("u1"));
        assert_eq!(todo.category.as_str(), "health");
    }

    #[test]
    fn test_apply_patch_only_touches_given_fields() {
        let created = Utc::now();
        let mut todo = Todo::create(
            user("u1"),
            NewTodo::new("Read").with_description("chapter 3"),
            created,
        )
        .unwrap();
        let later = created + Duration::seconds(5);

        todo.apply(TodoPatch::completed(true), later).unwrap();

        assert!(todo.completed);
        assert_eq!(todo.title, "Read");
        assert_eq!(todo.description, "chapter 3");
        assert_eq!(todo.created_at, created);
        assert_eq!(todo.updated_at, later);
    }

    #[test]
    fn test_empty_patch_only_bumps_updated_at() {
        let created = Utc::now();
        let original = Todo::create(user("u1"), NewTodo::new("Read"), created).unwrap();
        let mut todo = original.clone();
        let later = created + Duration::seconds(1);

        todo.apply(TodoPatch::default(), later).unwrap();

        assert_eq!(todo.updated_at, later);
        todo.updated_at = original.updated_at;
        assert_eq!(todo, original);
    }

    #[test]
    fn test_invalid_patch_leaves_record_unchanged() {
        let mut todo = Todo::create(user("u1"), NewTodo::new("Read"), Utc::now()).unwrap();
        let before = todo.clone();

        let patch = TodoPatch::completed(true).with_title("");
        assert!(todo.apply(patch, Utc::now()).is_err());
        assert_eq!(todo, before);
    }

    #[test]
    fn test_normalized_patch_trims_and_validates() {
        let patch = TodoPatch::default()
            .with_title("  Read  ")
            .with_category(" work ")
            .normalized()
            .unwrap();

        assert_eq!(patch.title.as_deref(), Some("Read"));
        assert_eq!(patch.category.as_deref(), Some("work"));
        assert!(patch.description.is_none());
        assert!(patch.completed.is_none());
        assert!(TodoPatch::default().with_category(" ").normalized().is_err());
    }

    #[test]
    fn test_patch_ignores_immutable_fields_in_payload() {
        let patch: TodoPatch = serde_json::from_value(serde_json::json!({
            "id": "other",
            "owner": "u2",
            "createdAt": "2000-01-01T00:00:00Z",
            "completed": true
        }))
        .unwrap();

        assert_eq!(patch, TodoPatch::completed(true));
    }

    #[test]
    fn test_authorize_rejects_other_users() {
        let todo = Todo::create(user("u1"), NewTodo::new("Secret"), Utc::now()).unwrap();
        let id = todo.id.to_string();

        assert!(authorize(todo.clone(), &user("u1")).is_ok());
        assert_eq!(
            authorize(todo, &user("u2")).unwrap_err(),
            TodoError::Unauthorized(id)
        );
    }

    #[test]
    fn test_todo_serializes_camel_case() {
        let todo = Todo::create(user("u1"), NewTodo::new("Buy milk"), Utc::now()).unwrap();
        let json = serde_json::to_value(&todo).unwrap();

        assert_eq!(json["owner"], "u1");
        assert_eq!(json["category"], "personal");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn only_the_owner_is_authorized(owner in "[a-z0-9]{1,12}", caller in "[a-z0-9]{1,12}") {
                let todo = Todo::create(user(&owner), NewTodo::new("t"), Utc::now()).unwrap();
                prop_assert_eq!(authorize(todo, &user(&caller)).is_ok(), owner == caller);
            }

            #[test]
            fn any_non_blank_title_is_accepted_trimmed(title in "[ ]{0,3}[a-zA-Z0-9]{1,20}[ ]{0,3}") {
                let todo = Todo::create(user("u1"), NewTodo::new(title.clone()), Utc::now()).unwrap();
                prop_assert_eq!(todo.title, title.trim().to_string());
            }
        }
    }
}
