use std::env;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    /// 末尾の `/` は取り除きます。
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `TODO_API_URL` から読み込みます（未設定なら既定値）。
    pub fn from_env() -> Self {
        env::var("TODO_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }
}
