//! JSON encoding of the configuration document.

use crate::config::types::ShellConfiguration;
use crate::errors::ConfigError;

/// Serialize a document as pretty JSON with a trailing newline.
pub fn encode(config: &ShellConfiguration) -> Result<Vec<u8>, ConfigError> {
    let mut bytes = serde_json::to_vec_pretty(config).map_err(|e| ConfigError::Parse {
        message: format!("Failed to serialize configuration: {}", e),
    })?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse a document, rejecting one without a version.
pub fn decode(bytes: &[u8]) -> Result<ShellConfiguration, ConfigError> {
    let config: ShellConfiguration =
        serde_json::from_slice(bytes).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;

    if config.version.trim().is_empty() {
        return Err(ConfigError::Parse {
            message: "configuration has no version".to_string(),
        });
    }

    Ok(config)
}
