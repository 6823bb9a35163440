use crate::api::TodoApi;
use crate::error::ClientError;
use crate::session::Session;
use crate::views::{self, TodoFilter};
use domain::{NewTodo, Todo, TodoId, TodoPatch};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Loading,
    Populated,
}

/// サインイン中のユーザーの ToDo をメモリ上に保持するキャッシュ
///
/// 変更はサーバーへのリクエスト → 応答待ち → 正規レコードで置き換え、の順で反映します。
/// 失敗した操作はコレクションにも状態にも何も残しません（エラーメッセージだけを記録します）。
pub struct TodoCache {
    api: Arc<dyn TodoApi>,
    token: Option<String>,
    todos: Vec<Todo>,
    state: CacheState,
    last_error: Option<String>,
}

impl TodoCache {
    pub fn new(api: Arc<dyn TodoApi>) -> Self {
        Self {
            api,
            token: None,
            todos: Vec::new(),
            state: CacheState::Empty,
            last_error: None,
        }
    }

    /// トークンを受け取り、一覧を読み込みます。
    pub async fn sign_in(&mut self, session: &Session) -> Result<(), ClientError> {
        self.token = Some(session.token.clone());
        self.todos.clear();
        self.state = CacheState::Empty;
        self.load().await
    }

    pub fn sign_out(&mut self) {
        self.token = None;
        self.todos.clear();
        self.state = CacheState::Empty;
        self.last_error = None;
    }

    /// サーバーの一覧でキャッシュを丸ごと置き換えます。
    pub async fn load(&mut self) -> Result<(), ClientError> {
        let token = self.token()?;
        let prior = self.state;
        self.state = CacheState::Loading;

        let result = self.api.list(&token).await;
        match result {
            Ok(todos) => {
                debug!(count = todos.len(), "Todos loaded");
                self.todos = todos;
                self.state = CacheState::Populated;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                self.state = prior;
                Err(self.fail(e))
            }
        }
    }

    /// 作成されたレコードは先頭に入ります（新しい順を保つ）。
    pub async fn create(&mut self, draft: NewTodo) -> Result<Todo, ClientError> {
        let token = self.token()?;
        let result = self.api.create(&token, &draft).await;
        let todo = result.map_err(|e| self.fail(e))?;

        self.todos.insert(0, todo.clone());
        self.settle();
        Ok(todo)
    }

    pub async fn update(&mut self, id: &TodoId, patch: TodoPatch) -> Result<Todo, ClientError> {
        let token = self.token()?;
        let result = self.api.update(&token, id, &patch).await;
        let todo = result.map_err(|e| self.fail(e))?;

        if let Some(slot) = self.todos.iter_mut().find(|t| t.id == todo.id) {
            *slot = todo.clone();
        }
        self.settle();
        Ok(todo)
    }

    pub async fn toggle_complete(&mut self, id: &TodoId, completed: bool) -> Result<Todo, ClientError> {
        self.update(id, TodoPatch::completed(completed)).await
    }

    pub async fn delete(&mut self, id: &TodoId) -> Result<(), ClientError> {
        let token = self.token()?;
        let result = self.api.delete(&token, id).await;
        result.map_err(|e| self.fail(e))?;

        self.todos.retain(|t| t.id != *id);
        self.settle();
        Ok(())
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == *id)
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn filtered(&self, filter: &TodoFilter) -> Vec<&Todo> {
        views::filtered(&self.todos, filter)
    }

    pub fn completion_percentage(&self) -> f64 {
        views::completion_percentage(&self.todos)
    }

    pub fn completed_count(&self) -> usize {
        views::completed_count(&self.todos)
    }

    pub fn total_count(&self) -> usize {
        self.todos.len()
    }

    pub fn by_category(&self) -> Vec<(String, Vec<&Todo>)> {
        views::by_category(&self.todos)
    }

    fn token(&mut self) -> Result<String, ClientError> {
        match &self.token {
            Some(token) => Ok(token.clone()),
            None => Err(self.fail(ClientError::NotSignedIn)),
        }
    }

    fn settle(&mut self) {
        self.state = CacheState::Populated;
        self.last_error = None;
    }

    fn fail(&mut self, e: ClientError) -> ClientError {
        warn!(error = %e, "Todo request failed");
        self.last_error = Some(e.to_string());
        e
    }
}
