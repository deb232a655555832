use crate::errors::CoreError;

/// Amounts and quantities entered for a new holding must be finite and > 0.
pub fn require_positive(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() {
        return Err(CoreError::ValidationError(format!("{field} must be a finite number")));
    }
    if value <= 0.0 {
        return Err(CoreError::ValidationError(format!("{field} must be positive, got {value}")));
    }
    Ok(())
}

/// Rates and edited balances may be zero but never negative.
pub fn require_non_negative(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() {
        return Err(CoreError::ValidationError(format!("{field} must be a finite number")));
    }
    if value < 0.0 {
        return Err(CoreError::ValidationError(format!("{field} must not be negative, got {value}")));
    }
    Ok(())
}

pub fn require_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::ValidationError("name must not be empty".into()));
    }
    Ok(())
}
