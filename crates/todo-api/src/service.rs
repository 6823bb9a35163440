use crate::clock::Clock;
use domain::{authorize, NewTodo, Todo, TodoError, TodoId, TodoPatch, UserId};
use infrastructure::TodoRepository;
use std::sync::Arc;
use tracing::{info, instrument};

/// ToDo の CRUD。すべての操作は認証済みの呼び出し元に限定されます。
#[derive(Clone)]
pub struct TodoService {
    repo: Arc<dyn TodoRepository>,
    clock: Arc<dyn Clock>,
}

impl TodoService {
    pub fn new(repo: Arc<dyn TodoRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// 呼び出し元が所有する ToDo を新しい順で返します。
    #[instrument(skip(self), fields(user_id = %caller))]
    pub async fn list(&self, caller: &UserId) -> Result<Vec<Todo>, TodoError> {
        self.repo.list_by_owner(caller).await
    }

    /// 所有者は常に呼び出し元です。
    #[instrument(skip(self, draft), fields(user_id = %caller))]
    pub async fn create(&self, caller: &UserId, draft: NewTodo) -> Result<Todo, TodoError> {
        let todo = Todo::create(caller.clone(), draft, self.clock.now())?;
        self.repo.insert(&todo).await?;

        info!(todo_id = %todo.id, "Todo created");
        Ok(todo)
    }

    #[instrument(skip(self), fields(user_id = %caller))]
    pub async fn get(&self, caller: &UserId, id: &str) -> Result<Todo, TodoError> {
        self.load_owned(caller, id).await
    }

    /// パッチに含まれるフィールドだけを更新し、`updatedAt` を進めます。
    /// 存在確認・所有者確認・書き込みはストアの 1 操作で行います。
    #[instrument(skip(self, patch), fields(user_id = %caller))]
    pub async fn update(
        &self,
        caller: &UserId,
        id: &str,
        patch: TodoPatch,
    ) -> Result<Todo, TodoError> {
        let id = parse_id(id)?;
        let todo = self
            .repo
            .update(&id, caller, patch, self.clock.now())
            .await?;

        info!(todo_id = %todo.id, "Todo updated");
        Ok(todo)
    }

    #[instrument(skip(self), fields(user_id = %caller))]
    pub async fn delete(&self, caller: &UserId, id: &str) -> Result<(), TodoError> {
        let todo = self.load_owned(caller, id).await?;
        self.repo.delete(&todo.id).await?;

        info!(todo_id = %todo.id, "Todo deleted");
        Ok(())
    }

    // 存在確認 → 所有者確認の順。他人のレコードは NotFound ではなく Unauthorized
    async fn load_owned(&self, caller: &UserId, id: &str) -> Result<Todo, TodoError> {
        let id = parse_id(id)?;
        let todo = self
            .repo
            .find(&id)
            .await?
            .ok_or_else(|| TodoError::NotFound(id.to_string()))?;

        authorize(todo, caller)
    }
}

fn parse_id(id: &str) -> Result<TodoId, TodoError> {
    TodoId::from_string(id.to_string()).map_err(|_| TodoError::NotFound(id.to_string()))
}
