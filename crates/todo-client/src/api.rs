use crate::config::ClientConfig;
use crate::error::ClientError;
use async_trait::async_trait;
use domain::{AuthResponse, Credentials, NewTodo, Registration, Todo, TodoId, TodoPatch};
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};

/// ToDo エンドポイント。すべてベアラートークンが必要です。
#[async_trait]
pub trait TodoApi: Send + Sync {
    async fn list(&self, token: &str) -> Result<Vec<Todo>, ClientError>;

    async fn create(&self, token: &str, draft: &NewTodo) -> Result<Todo, ClientError>;

    async fn update(&self, token: &str, id: &TodoId, patch: &TodoPatch)
        -> Result<Todo, ClientError>;

    async fn delete(&self, token: &str, id: &TodoId) -> Result<(), ClientError>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn register(&self, registration: &Registration) -> Result<AuthResponse, ClientError>;

    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError>;
}

/// reqwest による実装
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        parse_response(request.send().await?).await
    }
}

#[async_trait]
impl TodoApi for HttpApi {
    async fn list(&self, token: &str) -> Result<Vec<Todo>, ClientError> {
        Self::send(self.client.get(self.url("/todos")).bearer_auth(token)).await
    }

    async fn create(&self, token: &str, draft: &NewTodo) -> Result<Todo, ClientError> {
        Self::send(
            self.client
                .post(self.url("/todos"))
                .bearer_auth(token)
                .json(draft),
        )
        .await
    }

    async fn update(
        &self,
        token: &str,
        id: &TodoId,
        patch: &TodoPatch,
    ) -> Result<Todo, ClientError> {
        Self::send(
            self.client
                .put(self.url(&format!("/todos/{id}")))
                .bearer_auth(token)
                .json(patch),
        )
        .await
    }

    async fn delete(&self, token: &str, id: &TodoId) -> Result<(), ClientError> {
        let _: serde::de::IgnoredAny = Self::send(
            self.client
                .delete(self.url(&format!("/todos/{id}")))
                .bearer_auth(token),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AuthApi for HttpApi {
    async fn register(&self, registration: &Registration) -> Result<AuthResponse, ClientError> {
        Self::send(self.client.post(self.url("/users/register")).json(registration)).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        Self::send(self.client.post(self.url("/users/login")).json(credentials)).await
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json().await?);
    }

    // 本文が読めない場合は HTTP の理由句で代用する
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
