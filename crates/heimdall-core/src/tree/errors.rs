use crate::errors::HeimdallError;

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("Invalid path '{path}': segments must be non-empty and dot-separated")]
    InvalidPath { path: String },

    #[error("Failed to convert configuration to a tree: {message}")]
    ToTree { message: String },

    #[error("Tree does not describe a valid configuration: {message}")]
    FromTree { message: String },
}

impl HeimdallError for TreeError {
    fn error_code(&self) -> &'static str {
        match self {
            TreeError::InvalidPath { .. } => "TREE_INVALID_PATH",
            TreeError::ToTree { .. } => "TREE_TO_TREE_FAILED",
            TreeError::FromTree { .. } => "TREE_FROM_TREE_FAILED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            TreeError::InvalidPath { .. } | TreeError::FromTree { .. }
        )
    }
}
