use crate::errors::HeimdallError;
use crate::tree::errors::TreeError;

#[derive(Debug, thiserror::Error)]
pub enum InjectionError {
    #[error("Failed to convert configuration for injection: {source}")]
    Conversion {
        #[from]
        source: TreeError,
    },
}

impl HeimdallError for InjectionError {
    fn error_code(&self) -> &'static str {
        match self {
            InjectionError::Conversion { .. } => "INJECTION_CONVERSION_FAILED",
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            InjectionError::Conversion { source } => source.is_user_error(),
        }
    }
}
