use std::env;
use std::str::FromStr;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "personal-todo-dev-secret";

/// ToDo/ユーザーの保存先
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    DynamoDb,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "dynamodb" => Ok(StorageBackend::DynamoDb),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub storage: StorageBackend,
    pub dynamodb_table: String,
    pub dynamodb_endpoint: Option<String>,
    pub aws_region: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_hours: 24 * 30,
            storage: StorageBackend::Memory,
            dynamodb_table: "personal-todo".to_string(),
            dynamodb_endpoint: None,
            aws_region: "ap-northeast-1".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意のキー参照関数から設定を組み立てます（テストでは HashMap を渡す）。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let environment = lookup("ENVIRONMENT").unwrap_or(defaults.environment);
        let production = environment == "production";

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ if production => return Err(ConfigError::Missing("JWT_SECRET".to_string())),
            _ => defaults.jwt_secret,
        };

        let token_ttl_hours = parse_or(&lookup, "TOKEN_TTL_HOURS", defaults.token_ttl_hours)?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_HOURS".to_string(),
                message: "must be positive".to_string(),
            });
        }

        Ok(Config {
            environment,
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            jwt_secret,
            token_ttl_hours,
            storage: parse_or(&lookup, "STORAGE_BACKEND", defaults.storage)?,
            dynamodb_table: lookup("DYNAMODB_TABLE").unwrap_or(defaults.dynamodb_table),
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT").filter(|s| !s.is_empty()),
            aws_region: lookup("AWS_REGION").unwrap_or(defaults.aws_region),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 開発用の固定シークレットで動いているか
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}
