use crate::dynamodb::{log_store_failure, DynamoDbClient};
use crate::models::{item_to_todo, todo_to_item, todo_update, DynamoDbKeys, Item, GSI1};
use crate::repositories::TodoRepository;
use async_trait::async_trait;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue, ReturnValuesOnConditionCheckFailure};
use chrono::{DateTime, Utc};
use domain::{Todo, TodoError, TodoId, TodoPatch, UserId};
use tracing::{debug, instrument};

/// DynamoDB 上の ToDo ストア
///
/// 本体は `TODO#<id>` で保存し、所有者ごとの一覧は GSI1 を新しい順に読みます。
#[derive(Clone)]
pub struct DynamoDbTodoRepository {
    db: DynamoDbClient,
}

impl DynamoDbTodoRepository {
    pub fn new(db: DynamoDbClient) -> Self {
        Self { db }
    }

    fn decode(item: &Item) -> Result<Todo, TodoError> {
        item_to_todo(item).map_err(|e| TodoError::Store(format!("corrupt todo item: {e}")))
    }
}

#[async_trait]
impl TodoRepository for DynamoDbTodoRepository {
    #[instrument(skip(self))]
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Todo>, TodoError> {
        let mut todos = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let output = self
                .db
                .client()
                .query()
                .table_name(self.db.table_name())
                .index_name(GSI1)
                .key_condition_expression("GSI1PK = :owner")
                .expression_attribute_values(
                    ":owner",
                    AttributeValue::S(DynamoDbKeys::owner_partition(owner)),
                )
                .scan_index_forward(false)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| TodoError::Store(log_store_failure("Query", &e)))?;

            for item in output.items() {
                todos.push(Self::decode(item)?);
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        debug!(count = todos.len(), "Listed todos");
        Ok(todos)
    }

    async fn find(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        let output = self
            .db
            .client()
            .get_item()
            .table_name(self.db.table_name())
            .set_key(Some(DynamoDbKeys::for_todo(id).primary_key()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| TodoError::Store(log_store_failure("GetItem", &e)))?;

        output.item.as_ref().map(Self::decode).transpose()
    }

    async fn insert(&self, todo: &Todo) -> Result<(), TodoError> {
        self.db
            .client()
            .put_item()
            .table_name(self.db.table_name())
            .set_item(Some(todo_to_item(todo)))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await
            .map_err(|e| TodoError::Store(log_store_failure("PutItem", &e)))?;

        debug!(todo_id = %todo.id, "Todo stored");
        Ok(())
    }

    /// 所有者の一致を条件にした UpdateItem。パッチにない属性には触れない
    #[instrument(skip(self, patch))]
    async fn update(
        &self,
        id: &TodoId,
        owner: &UserId,
        patch: TodoPatch,
        now: DateTime<Utc>,
    ) -> Result<Todo, TodoError> {
        let patch = patch.normalized()?;
        let update = todo_update(&patch, &now);

        let result = self
            .db
            .client()
            .update_item()
            .table_name(self.db.table_name())
            .set_key(Some(DynamoDbKeys::for_todo(id).primary_key()))
            .update_expression(update.expression)
            .condition_expression("attribute_exists(PK) AND GSI1PK = :owner")
            .set_expression_attribute_names(Some(update.names))
            .set_expression_attribute_values(Some(update.values))
            .expression_attribute_values(
                ":owner",
                AttributeValue::S(DynamoDbKeys::owner_partition(owner)),
            )
            .return_values(ReturnValue::AllNew)
            .return_values_on_condition_check_failure(ReturnValuesOnConditionCheckFailure::AllOld)
            .send()
            .await;

        match result {
            Ok(output) => {
                let item = output
                    .attributes
                    .ok_or_else(|| TodoError::Store("UpdateItem returned no attributes".to_string()))?;
                debug!(todo_id = %id, "Todo patched");
                Self::decode(&item)
            }
            Err(e) => match e.as_service_error() {
                // 旧アイテムが返ってくれば所有者違い、なければ存在しない
                Some(UpdateItemError::ConditionalCheckFailedException(failed)) => {
                    if failed.item().is_some() {
                        Err(TodoError::Unauthorized(id.to_string()))
                    } else {
                        Err(TodoError::NotFound(id.to_string()))
                    }
                }
                _ => Err(TodoError::Store(log_store_failure("UpdateItem", &e))),
            },
        }
    }

    async fn delete(&self, id: &TodoId) -> Result<(), TodoError> {
        let result = self
            .db
            .client()
            .delete_item()
            .table_name(self.db.table_name())
            .set_key(Some(DynamoDbKeys::for_todo(id).primary_key()))
            .condition_expression("attribute_exists(PK)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Err(TodoError::NotFound(id.to_string()))
            }
            Err(e) => Err(TodoError::Store(log_store_failure("DeleteItem", &e))),
        }
    }
}
