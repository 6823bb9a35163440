//! todo-api バイナリのエントリポイント
//! 環境変数（と任意の .env）から設定を読み、HTTP サーバを起動します。

use anyhow::Context;
use infrastructure::{
    DynamoDbClient, DynamoDbTodoRepository, DynamoDbUserRepository, InMemoryTodoRepository,
    InMemoryUserRepository, TodoRepository, UserRepository,
};
use shared::{init_tracing, Config, StorageBackend, TokenIssuer};
use std::sync::Arc;
use todo_api::{app_with_state, AppState, SystemClock};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("failed to load configuration")?;
    init_tracing(config.is_production())
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))?;

    info!(
        environment = %config.environment,
        storage = ?config.storage,
        "Starting todo-api"
    );
    if config.uses_dev_secret() {
        warn!("JWT_SECRET is not set; using the development secret");
    }

    let (todos, users) = build_repositories(&config).await?;
    let tokens = TokenIssuer::from_hours(&config.jwt_secret, config.token_ttl_hours);
    let state = AppState::new(todos, users, tokens, Arc::new(SystemClock));

    let bind_address = config.bind_address();
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    info!(address = %bind_address, "Server listening");

    axum::serve(listener, app_with_state(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn build_repositories(
    config: &Config,
) -> anyhow::Result<(Arc<dyn TodoRepository>, Arc<dyn UserRepository>)> {
    match config.storage {
        StorageBackend::Memory => Ok((
            Arc::new(InMemoryTodoRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
        )),
        StorageBackend::DynamoDb => {
            let db = DynamoDbClient::new(config).await;
            // ローカルエンドポイントのときだけテーブルを自動作成する
            if config.dynamodb_endpoint.is_some() {
                db.ensure_table().await?;
            }
            info!(table = %db.table_name(), "Using DynamoDB storage");
            Ok((
                Arc::new(DynamoDbTodoRepository::new(db.clone())),
                Arc::new(DynamoDbUserRepository::new(db)),
            ))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
