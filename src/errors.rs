use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MenuError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("menu data unavailable: {0}")]
    DataUnavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate name: {0}")]
    DuplicateName(String),
    #[error("invalid menu item: {0}")]
    InvalidItem(String),
}

// every backend failure surfaces to callers as DataUnavailable
impl From<rusqlite::Error> for MenuError {
    fn from(e: rusqlite::Error) -> Self {
        MenuError::DataUnavailable(format!("sqlite: {}", e))
    }
}

impl From<serde_json::Error> for MenuError {
    fn from(e: serde_json::Error) -> Self {
        MenuError::DataUnavailable(format!("json: {}", e))
    }
}

impl From<reqwest::Error> for MenuError {
    fn from(e: reqwest::Error) -> Self {
        MenuError::DataUnavailable(format!("http: {}", e))
    }
}

impl From<tokio::task::JoinError> for MenuError {
    fn from(e: tokio::task::JoinError) -> Self {
        MenuError::DataUnavailable(format!("blocking task: {}", e))
    }
}
