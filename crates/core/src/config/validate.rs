use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Flush threshold is at least 1 (a zero threshold would flush on every
///   ingest and defeat the buffering entirely)
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.ingest.flush_threshold == 0 {
        return Err(ConfigError::ValidationError(
            "ingest.flush_threshold cannot be 0".to_string(),
        ));
    }

    Ok(())
}
