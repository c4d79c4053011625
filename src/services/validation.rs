use std::collections::HashMap;
use std::fmt;

use crate::types::TodoStatus;

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Request validation failure with one message per offending field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field_errors: HashMap<String, String>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.into(), message.into());
        Self { field_errors }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.field_errors.contains_key(field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&str> = self.field_errors.keys().map(String::as_str).collect();
        fields.sort_unstable();
        write!(f, "invalid request fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationError {}

/// Collects field errors so a client sees every problem in one response
#[derive(Debug, Default)]
pub struct Validator {
    field_errors: HashMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, field: &str, value: &str) -> Self {
        if value.trim().chars().count() < MIN_NAME_LEN {
            self.reject(field, format!("must be at least {} characters", MIN_NAME_LEN));
        }
        self
    }

    pub fn email(mut self, field: &str, value: &str) -> Self {
        if !is_email(value) {
            self.reject(field, "must be a valid email address".to_string());
        }
        self
    }

    pub fn password(mut self, field: &str, value: &str) -> Self {
        if value.chars().count() < MIN_PASSWORD_LEN {
            self.reject(field, format!("must be at least {} characters", MIN_PASSWORD_LEN));
        }
        self
    }

    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.reject(field, "is required".to_string());
        }
        self
    }

    pub fn initial_status(mut self, field: &str, status: TodoStatus) -> Self {
        if !status.allowed_on_create() {
            self.reject(field, "must be one of: todo, process".to_string());
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.field_errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { field_errors: self.field_errors })
        }
    }

    fn reject(&mut self, field: &str, message: String) {
        self.field_errors.entry(field.to_string()).or_insert(message);
    }
}

/// `local@domain.tld` with no whitespace and a single `@`
fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !host.starts_with('.') && !host.ends_with('.'),
        None => false,
    }
}
