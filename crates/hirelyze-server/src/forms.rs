//! Sign-in and sign-up form input and validation.

use hirelyze_identity::{is_valid_email, password::MIN_PASSWORD_LEN};
use serde::Deserialize;

const MIN_NAME_LEN: usize = 3;

/// Which of the two auth forms is being rendered or submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormType {
    SignIn,
    SignUp,
}

impl FormType {
    pub fn action(self) -> &'static str {
        match self {
            FormType::SignIn => "/sign-in",
            FormType::SignUp => "/sign-up",
        }
    }

    pub fn submit_label(self) -> &'static str {
        match self {
            FormType::SignIn => "Sign In",
            FormType::SignUp => "Create Account",
        }
    }
}

/// Raw form fields. `name` is only submitted by the sign-up form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthFormInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A validation message attached to one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Validates `input` for `form`, returning every failing field in form order.
pub fn validate(form: FormType, input: &AuthFormInput) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if form == FormType::SignUp && input.name.trim().chars().count() < MIN_NAME_LEN {
        errors.push(FieldError {
            field: "name",
            message: "Name must be at least 3 characters",
        });
    }
    if !is_valid_email(input.email.trim()) {
        errors.push(FieldError {
            field: "email",
            message: "Please enter a valid email",
        });
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError {
            field: "password",
            message: "Password must be at least 6 characters",
        });
    }

    errors
}
