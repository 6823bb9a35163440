use crate::clock::Clock;
use domain::{normalize_email, AuthError, AuthResponse, Credentials, Registration, User, UserId};
use infrastructure::UserRepository;
use shared::{extract_bearer, hash_password, verify_password, TokenIssuer};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 登録・ログイン・ベアラートークン検証
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenIssuer,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenIssuer, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            tokens,
            clock,
        }
    }

    #[instrument(skip_all)]
    pub async fn register(&self, registration: Registration) -> Result<AuthResponse, AuthError> {
        let email = registration.validate()?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken(email));
        }

        let user = User {
            id: UserId::new(),
            name: registration.name.trim().to_string(),
            email,
            password_hash: hash_password(&registration.password),
            created_at: self.clock.now(),
        };
        // find と create の間に同じメールが登録された場合も create が EmailTaken を返す
        self.users.create(&user).await?;

        info!(user_id = %user.id, "User registered");
        self.respond(&user)
    }

    /// メールアドレス違いとパスワード違いは同じエラーになります。
    #[instrument(skip_all)]
    pub async fn login(&self, credentials: Credentials) -> Result<AuthResponse, AuthError> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(AuthError::Validation(
                "Please provide email and password".to_string(),
            ));
        }
        let email = normalize_email(&credentials.email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = match self.users.find_by_email(&email).await? {
            Some(user) if verify_password(&credentials.password, &user.password_hash) => user,
            _ => {
                warn!("Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        info!(user_id = %user.id, "User logged in");
        self.respond(&user)
    }

    /// `Authorization` ヘッダー値から呼び出し元を特定します。
    pub fn authenticate(&self, header: Option<&str>) -> Result<UserId, AuthError> {
        let token = header
            .and_then(extract_bearer)
            .ok_or_else(|| AuthError::InvalidToken("missing bearer token".to_string()))?;

        self.tokens.verify(token)?.user_id()
    }

    fn respond(&self, user: &User) -> Result<AuthResponse, AuthError> {
        let profile = user.profile();
        let token = self.tokens.issue_at(&profile, self.clock.now())?;
        Ok(AuthResponse {
            token,
            user: profile,
        })
    }
}
