pub mod auth;
pub mod config;
pub mod password;
pub mod telemetry;

pub use auth::{extract_bearer, Claims, TokenIssuer};
pub use config::{Config, ConfigError, StorageBackend};
pub use password::{hash_password, verify_password};
pub use telemetry::init_tracing;
