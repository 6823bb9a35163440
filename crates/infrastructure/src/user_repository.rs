use crate::dynamodb::{log_store_failure, DynamoDbClient};
use crate::models::{item_to_user, user_to_item, DynamoDbKeys};
use crate::repositories::UserRepository;
use async_trait::async_trait;
use domain::{AuthError, User};
use tracing::info;

/// DynamoDB 上のユーザーストア（`EMAIL#<email>` で一意）
#[derive(Clone)]
pub struct DynamoDbUserRepository {
    db: DynamoDbClient,
}

impl DynamoDbUserRepository {
    pub fn new(db: DynamoDbClient) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for DynamoDbUserRepository {
    async fn create(&self, user: &User) -> Result<(), AuthError> {
        let result = self
            .db
            .client()
            .put_item()
            .table_name(self.db.table_name())
            .set_item(Some(user_to_item(user)))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await;

        match result {
            Ok(_) => {
                info!(user_id = %user.id, "User stored");
                Ok(())
            }
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Err(AuthError::EmailTaken(user.email.clone()))
            }
            Err(e) => Err(AuthError::Store(log_store_failure("PutItem", &e))),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let output = self
            .db
            .client()
            .get_item()
            .table_name(self.db.table_name())
            .set_key(Some(DynamoDbKeys::for_user(email).primary_key()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| AuthError::Store(log_store_failure("GetItem", &e)))?;

        output
            .item
            .as_ref()
            .map(|item| {
                item_to_user(item).map_err(|e| AuthError::Store(format!("corrupt user item: {e}")))
            })
            .transpose()
    }
}
