//! Auth form payloads with client-side validation.
//!
//! Validation runs before any request is made; a failing form never
//! reaches the network.

use serde::Serialize;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::CoreError;

#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(skip)]
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct ForgotPasswordForm {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct ResetPasswordForm {
    #[validate(length(min = 1, message = "Reset token is missing"))]
    pub token: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(skip)]
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

/// Validate a form, converting failures into [`CoreError::Validation`].
pub fn check<T: Validate>(form: &T) -> Result<(), CoreError> {
    form.validate().map_err(CoreError::from)
}

/// Flatten validator errors into one human-readable line, sorted by field
/// so the message is deterministic.
pub fn describe_errors(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .errors()
        .iter()
        .flat_map(|(field, kind)| match kind {
            ValidationErrorsKind::Field(errs) => errs
                .iter()
                .map(|e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{field}: {}", e.code),
                })
                .collect::<Vec<_>>(),
            ValidationErrorsKind::Struct(inner) => vec![describe_errors(inner)],
            ValidationErrorsKind::List(items) => items
                .values()
                .map(|inner| describe_errors(inner))
                .collect(),
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn login_requires_valid_email() {
        let form = LoginForm {
            email: "not-an-email".into(),
            password: "secret".into(),
        };
        assert_matches!(check(&form), Err(CoreError::Validation(msg)) if msg.contains("valid email"));
    }

    #[test]
    fn register_checks_length_and_confirmation() {
        let form = RegisterForm {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "short".into(),
            confirm_password: "other".into(),
        };
        let msg = match check(&form) {
            Err(CoreError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert!(msg.contains("at least 8"));
        assert!(msg.contains("do not match"));
    }

    #[test]
    fn valid_register_passes_and_omits_confirmation() {
        let form = RegisterForm {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "long enough".into(),
            confirm_password: "long enough".into(),
        };
        assert!(check(&form).is_ok());
        let json = serde_json::to_value(&form).unwrap();
        assert!(json.get("confirm_password").is_none());
    }

    #[test]
    fn reset_requires_token() {
        let form = ResetPasswordForm {
            token: String::new(),
            password: "long enough".into(),
            confirm_password: "long enough".into(),
        };
        assert!(check(&form).is_err());
    }
}
