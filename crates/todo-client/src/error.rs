use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// サーバーが `{"success": false, "message"}` で拒否した
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Session storage error: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
