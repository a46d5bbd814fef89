//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted display name, in characters.
const MAX_NAME_CHARS: usize = 64;

/// Validates that a display name is non-blank and of reasonable length.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }

    if name.chars().count() > MAX_NAME_CHARS {
        let mut err = ValidationError::new("name_length");
        err.message =
            Some(format!("Name must be at most {MAX_NAME_CHARS} characters").into());
        return Err(err);
    }

    Ok(())
}
