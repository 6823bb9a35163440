use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{AuthError, TodoError};
use serde_json::json;
use thiserror::Error;

/// HTTP 境界のエラー。本文は `{"success": false, "message": ...}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// 詳細はログにだけ残し、呼び出し元には汎用メッセージを返す
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// 操作名（update/delete など）を所有者エラーのメッセージに含めて変換します。
    pub fn from_todo(action: &str, e: TodoError) -> Self {
        match e {
            TodoError::Validation(message) => ApiError::BadRequest(message),
            TodoError::NotFound(_) => ApiError::NotFound("Todo not found".to_string()),
            TodoError::Unauthorized(_) => {
                ApiError::Unauthorized(format!("Not authorized to {action} this todo"))
            }
            TodoError::Store(detail) => ApiError::Internal(detail),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TodoError> for ApiError {
    fn from(e: TodoError) -> Self {
        ApiError::from_todo("access", e)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(message) => ApiError::BadRequest(message),
            AuthError::EmailTaken(_) => ApiError::BadRequest("User already exists".to_string()),
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::InvalidToken(_) => {
                ApiError::Unauthorized("Not authorized, token failed".to_string())
            }
            AuthError::Store(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                "Server error".to_string()
            }
            other => {
                tracing::debug!(status = status.as_u16(), message = %other, "Request rejected");
                other.to_string()
            }
        };

        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = ApiError::from(TodoError::Store("table gone".to_string())).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Server error");
    }

    #[tokio::test]
    async fn test_todo_errors_map_to_statuses() {
        let cases = [
            (TodoError::Validation("Title is required".into()), StatusCode::BAD_REQUEST),
            (TodoError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (TodoError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_unauthorized_message_names_the_action() {
        let response =
            ApiError::from_todo("delete", TodoError::Unauthorized("x".into())).into_response();
        let json = body_json(response).await;
        assert_eq!(json["message"], "Not authorized to delete this todo");
    }

    #[test]
    fn test_auth_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(AuthError::EmailTaken("a@b".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Store("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
