use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate a trimmed title (1-256 Unicode characters).
pub fn validate_title(title: &str) -> Result<(), AppError> {
    validate_name(title, "Title", 256)
}

/// Validate a trimmed name of 1 to `max` Unicode characters.
pub fn validate_name(value: &str, field: &str, max: usize) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be 1-{max} characters"
        )));
    }
    Ok(())
}

/// Validate non-empty free text of at most `max_bytes` bytes.
pub fn validate_text(value: &str, field: &str, max_bytes: usize) -> Result<(), AppError> {
    if value.trim().is_empty() || value.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "{field} must be non-empty and at most {max_bytes} bytes"
        )));
    }
    Ok(())
}
