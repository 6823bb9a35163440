use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType,
    Projection, ProjectionType, ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use shared::Config;
use tracing::{error, info};

use crate::models::GSI1;

#[derive(Clone)]
pub struct DynamoDbClient {
    client: Client,
    table_name: String,
}

impl DynamoDbClient {
    pub async fn new(config: &Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()));
        if let Some(endpoint) = &config.dynamodb_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        Self {
            client: Client::new(&aws_config),
            table_name: config.dynamodb_table.clone(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// テーブル（PK/SK + GSI1）が無ければ作成します。DynamoDB Local 向け。
    pub async fn ensure_table(&self) -> anyhow::Result<()> {
        match self
            .client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
        {
            Ok(_) => return Ok(()),
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_resource_not_found_exception()) => {}
            Err(e) => return Err(anyhow::anyhow!(describe(&e))),
        }

        let string_attr = |name: &str| {
            AttributeDefinition::builder()
                .attribute_name(name)
                .attribute_type(ScalarAttributeType::S)
                .build()
        };
        let key = |name: &str, key_type: KeyType| {
            KeySchemaElement::builder()
                .attribute_name(name)
                .key_type(key_type)
                .build()
        };

        let gsi1 = GlobalSecondaryIndex::builder()
            .index_name(GSI1)
            .key_schema(key("GSI1PK", KeyType::Hash)?)
            .key_schema(key("GSI1SK", KeyType::Range)?)
            .projection(
                Projection::builder()
                    .projection_type(ProjectionType::All)
                    .build(),
            )
            .build()?;

        self.client
            .create_table()
            .table_name(&self.table_name)
            .billing_mode(BillingMode::PayPerRequest)
            .attribute_definitions(string_attr("PK")?)
            .attribute_definitions(string_attr("SK")?)
            .attribute_definitions(string_attr("GSI1PK")?)
            .attribute_definitions(string_attr("GSI1SK")?)
            .key_schema(key("PK", KeyType::Hash)?)
            .key_schema(key("SK", KeyType::Range)?)
            .global_secondary_indexes(gsi1)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!(describe(&e)))?;

        info!(table = %self.table_name, "DynamoDB table created");
        Ok(())
    }
}

/// SDK エラーを原因まで含めた文字列にする
pub(crate) fn describe<E: std::error::Error>(e: &E) -> String {
    DisplayErrorContext(e).to_string()
}

/// 永続化失敗をログに残し、呼び出し側へ返すメッセージを作る
pub(crate) fn log_store_failure<E: std::error::Error>(operation: &str, e: &E) -> String {
    let detail = describe(e);
    error!(operation = operation, error = %detail, "DynamoDB operation failed");
    format!("{operation} failed: {detail}")
}
