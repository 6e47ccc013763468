use serde::{Deserialize, Serialize};

use crate::forms::{NAME_MAX_LEN, ValidationErrors};

// -- Session claims --

/// Claims carried by the signed session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub name: String,
    pub exp: usize,
}

// -- Auth forms --

pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "must not be blank");
        } else if name.chars().count() > NAME_MAX_LEN {
            errors.add("name", format!("must be at most {} characters", NAME_MAX_LEN));
        }
        if !self.email.contains('@') {
            errors.add("email", "must be an email address");
        }
        if self.password.len() < PASSWORD_MIN_LEN {
            errors.add(
                "password",
                format!("must be at least {} characters", PASSWORD_MIN_LEN),
            );
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}
