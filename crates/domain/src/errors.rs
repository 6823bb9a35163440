use thiserror::Error;

/// 値オブジェクトの検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid TodoId: {0}")]
    InvalidTodoId(String),

    #[error("Invalid UserId: {0}")]
    InvalidUserId(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("{0}")]
    Validation(String),
}

/// ToDo 操作のエラー分類
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TodoError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Todo not found: {0}")]
    NotFound(String),

    /// レコードは存在するが呼び出し元が所有者ではない
    #[error("Not authorized to access todo: {0}")]
    Unauthorized(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<DomainError> for TodoError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(message) => TodoError::Validation(message),
            other => TodoError::Validation(other.to_string()),
        }
    }
}

/// 認証（登録・ログイン・トークン検証）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User already exists: {0}")]
    EmailTaken(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<DomainError> for AuthError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(message) => AuthError::Validation(message),
            other => AuthError::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_validation_message_is_passed_through() {
        let err: TodoError = DomainError::Validation("Title is required".to_string()).into();
        assert_eq!(err, TodoError::Validation("Title is required".to_string()));
    }

    #[test]
    fn test_invalid_email_becomes_auth_validation() {
        let err: AuthError = DomainError::InvalidEmail("nobody".to_string()).into();
        assert_eq!(
            err,
            AuthError::Validation("Invalid email: nobody".to_string())
        );
    }
}
