use std::fmt::Write as _;
use std::sync::Arc;

use thiserror::Error;

use crate::constants::DEFAULT_VALIDATION_MESSAGE;
use crate::errors::{Errors, RawErrors};

/// 校验失败
///
/// 携带完整的错误表；显示时在消息后按字段列出所有错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}\n{}", format_errors(.errors, 4))]
pub struct ValidationError {
    errors: Errors,
    message: String,
}

impl ValidationError {
    pub fn new(errors: Errors, message: Option<&str>) -> Self {
        Self {
            errors,
            message: message.unwrap_or(DEFAULT_VALIDATION_MESSAGE).to_string(),
        }
    }

    pub fn field_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        let (field, message): (String, String) = (field.into(), message.into());
        let mut errors = Errors::new();
        errors.add([(field, message)]);
        Self::new(errors, None)
    }

    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    pub fn into_errors(self) -> Errors {
        self.errors
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn merge(&mut self, other: ValidationError) {
        self.errors.add(RawErrors::from(other.errors.all()));
    }
}

/// 按字段缩进列出错误
pub fn format_errors(errors: &Errors, indent: usize) -> String {
    let indentation = " ".repeat(indent);
    let mut formatted = String::new();

    for (field, messages) in errors {
        let _ = writeln!(formatted, "{indentation}{field}:");
        for message in messages {
            let _ = writeln!(formatted, "{indentation}{indentation}{message}");
        }
    }

    formatted
}

/// 表单操作错误
#[derive(Debug, Clone, Error)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Validation data must be an object")]
    NonObjectData,

    #[error("Field path must not be empty")]
    EmptyPath,

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Can not create form fields for non-object data at '{path}'")]
    NonObjectFields { path: String },

    #[error("{0}")]
    Other(Arc<anyhow::Error>),
}

impl FormError {
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            FormError::Validation(error) => Some(error),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for FormError {
    fn from(error: anyhow::Error) -> Self {
        FormError::Other(Arc::new(error))
    }
}

pub type FormResult<T> = Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_fields() {
        let mut errors = Errors::new();
        errors.record([("name", vec!["Too short", "Invalid"]), ("age", vec!["Required"])]);

        let error = ValidationError::new(errors, None);

        assert_eq!(
            error.to_string(),
            "Validation failed\n    name:\n        Too short\n        Invalid\n    age:\n        Required\n"
        );
    }

    #[test]
    fn test_custom_message() {
        let error = ValidationError::new(Errors::new(), Some("Bad input"));
        assert_eq!(error.message(), "Bad input");
        assert_eq!(error.to_string(), "Bad input\n");
    }

    #[test]
    fn test_field_error_and_merge() {
        let mut error = ValidationError::field_error("email", "Invalid");
        error.merge(ValidationError::field_error("email", "Taken"));
        error.merge(ValidationError::field_error("name", "Required"));

        assert_eq!(error.errors().get("email"), ["Invalid", "Taken"]);
        assert!(error.errors().has("name"));
    }

    #[test]
    fn test_form_error_from_anyhow() {
        let error: FormError = anyhow::anyhow!("boom").into();
        assert_eq!(error.to_string(), "boom");
        assert!(error.as_validation().is_none());
    }
}
