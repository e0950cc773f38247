//! Input validation helpers for the REST routes.
//!
//! Field limits mirror the catalog constraints: titles, names, and
//! descriptions are bounded, money and stock are never negative.

use crate::error::ApiError;

/// Maximum session title length.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum session description length.
pub const MAX_SESSION_DESCRIPTION_LENGTH: usize = 500;

/// Maximum product name length.
pub const MAX_PRODUCT_NAME_LENGTH: usize = 100;

/// Maximum product description length.
pub const MAX_PRODUCT_DESCRIPTION_LENGTH: usize = 1000;

/// Validate a required, bounded string field.
pub fn require_bounded(value: &str, label: &str, max_len: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{label} is required")));
    }
    if value.chars().count() > max_len {
        return Err(ApiError::Validation(format!(
            "{label} cannot exceed {max_len} characters"
        )));
    }
    Ok(())
}

/// Validate a non-negative number.
pub fn require_non_negative(value: f64, label: &str) -> Result<(), ApiError> {
    if value < 0.0 || !value.is_finite() {
        return Err(ApiError::Validation(format!("{label} cannot be negative")));
    }
    Ok(())
}

/// Validate a non-negative integer count.
pub fn require_non_negative_count(value: i64, label: &str) -> Result<(), ApiError> {
    if value < 0 {
        return Err(ApiError::Validation(format!("{label} cannot be negative")));
    }
    Ok(())
}
