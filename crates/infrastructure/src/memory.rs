//! 開発・テスト用のインメモリ実装

use crate::repositories::{TodoRepository, UserRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{AuthError, Todo, TodoError, TodoId, TodoPatch, User, UserId};
use std::cmp::Reverse;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct TodoTable {
    // 挿入順。作成日時が同じなら後から入ったものを先に返す
    next_seq: u64,
    rows: HashMap<TodoId, (u64, Todo)>,
}

#[derive(Default)]
pub struct InMemoryTodoRepository {
    table: RwLock<TodoTable>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Todo>, TodoError> {
        let table = self.table.read().await;
        let mut rows: Vec<&(u64, Todo)> = table
            .rows
            .values()
            .filter(|(_, todo)| todo.owner == *owner)
            .collect();
        rows.sort_by_key(|(seq, todo)| (Reverse(todo.created_at), Reverse(*seq)));

        Ok(rows.into_iter().map(|(_, todo)| todo.clone()).collect())
    }

    async fn find(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        let table = self.table.read().await;
        Ok(table.rows.get(id).map(|(_, todo)| todo.clone()))
    }

    async fn insert(&self, todo: &Todo) -> Result<(), TodoError> {
        let mut table = self.table.write().await;
        if table.rows.contains_key(&todo.id) {
            return Err(TodoError::Store(format!("duplicate todo id {}", todo.id)));
        }
        let seq = table.next_seq;
        table.next_seq += 1;
        table.rows.insert(todo.id.clone(), (seq, todo.clone()));
        Ok(())
    }

    async fn update(
        &self,
        id: &TodoId,
        owner: &UserId,
        patch: TodoPatch,
        now: DateTime<Utc>,
    ) -> Result<Todo, TodoError> {
        // 読み取りから書き込みまで同じロックの中で行う
        let mut table = self.table.write().await;
        let (_, stored) = table
            .rows
            .get_mut(id)
            .ok_or_else(|| TodoError::NotFound(id.to_string()))?;
        if !stored.is_owned_by(owner) {
            return Err(TodoError::Unauthorized(id.to_string()));
        }

        let mut updated = stored.clone();
        updated.apply(patch, now)?;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &TodoId) -> Result<(), TodoError> {
        let mut table = self.table.write().await;
        table
            .rows
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| TodoError::NotFound(id.to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    by_email: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> Result<(), AuthError> {
        let mut users = self.by_email.write().await;
        if users.contains_key(&user.email) {
            return Err(AuthError::EmailTaken(user.email.clone()));
        }
        users.insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self.by_email.read().await.get(email).cloned())
    }
}
