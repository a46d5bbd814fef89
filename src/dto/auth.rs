use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::dto::validation::validate_display_name;

/// Payload creating a new administrator account.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Login email, unique across administrators.
    pub email: String,
    /// Login password.
    pub password: String,
    /// Display name of the administrator.
    pub name: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_credentials(&self.email, &self.password) {
            errors.merge_self("credentials", Err(e));
        }

        if let Err(e) = validate_display_name(&self.name) {
            errors.add("name", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Credentials presented on login.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Login password.
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_credentials(&self.email, &self.password)
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if !email.validate_email() {
        let mut err = ValidationError::new("email_format");
        err.message = Some("Email address is not valid".into());
        errors.add("email", err);
    }

    if password.is_empty() {
        let mut err = ValidationError::new("password_empty");
        err.message = Some("Password must not be empty".into());
        errors.add("password", err);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Bearer credential returned by register and login.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// Opaque token to present as `Authorization: Bearer`.
    pub token: String,
}
