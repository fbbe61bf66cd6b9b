//! Error types for threshold loading and schedule parsing.

/// Errors that can occur while loading thresholds or parsing schedules.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Threshold validation error; one message per failed check.
    #[error("Validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Unknown IANA timezone name.
    #[error("Unknown timezone: {0}")]
    Timezone(String),

    /// Cron expression could not be parsed.
    #[error("Invalid cron expression '{expr}': {message}")]
    Schedule { expr: String, message: String },
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, RulesError>;
