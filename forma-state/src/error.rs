use std::sync::Arc;

use forma_core::{FormError, ValidationError};
use serde_json::Value;
use thiserror::Error;

/// 提交失败
///
/// `Rejected` 表示提交处理函数返回的不透明失败，`payload` 在错误对账时按候选路径探测。
#[derive(Debug, Clone, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{message}")]
    Rejected { message: String, payload: Value },

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("{0}")]
    Other(Arc<anyhow::Error>),
}

impl SubmitError {
    pub fn rejected(message: impl Into<String>, payload: Value) -> Self {
        SubmitError::Rejected {
            message: message.into(),
            payload,
        }
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            SubmitError::Validation(error) => Some(error),
            SubmitError::Form(error) => error.as_validation(),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for SubmitError {
    fn from(error: anyhow::Error) -> Self {
        SubmitError::Other(Arc::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display() {
        let rejected = SubmitError::rejected("Request failed with status 422", json!({}));
        assert_eq!(rejected.to_string(), "Request failed with status 422");

        let other: SubmitError = anyhow::anyhow!("connection reset").into();
        assert_eq!(other.to_string(), "connection reset");
    }

    #[test]
    fn test_as_validation() {
        let validation = ValidationError::field_error("name", "Taken");

        assert!(SubmitError::from(validation.clone()).as_validation().is_some());
        assert!(SubmitError::from(FormError::from(validation)).as_validation().is_some());
        assert!(SubmitError::from(FormError::EmptyPath).as_validation().is_none());
    }
}
