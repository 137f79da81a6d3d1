/// Record validation utilities shared by hives and crops.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{0} must not be negative")]
    Negative(&'static str),
    #[error("latitude must be within [-90, 90] and longitude within [-180, 180], got ({latitude}, {longitude})")]
    Coordinates { latitude: f64, longitude: f64 },
    #[error("floweringEnd must not be before floweringStart")]
    InvertedWindow,
}

/// Rejections of query-string parameters on the read endpoints.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("page and limit must be positive integers")]
    Pagination,
    #[error("page and limit must be at most {}", u32::MAX)]
    PaginationTooLarge,
    #[error("Invalid {0}")]
    Date(&'static str),
    #[error("Invalid latitude or longitude")]
    Coordinates,
    #[error("Invalid radius")]
    Radius,
}

/// Unwrap a required field, reporting it by its wire name when absent.
pub fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::Missing(field))
}

/// Validate that a required string field is present and not blank.
pub fn required_text(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        None => Err(ValidationError::Missing(field)),
        Some(s) if s.trim().is_empty() => Err(ValidationError::Empty(field)),
        Some(s) => Ok(s),
    }
}
