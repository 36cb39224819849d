//! 提交失败的错误对账
//!
//! 从不透明的提交失败中恢复结构化错误表：已是校验失败的直接采用；被拒绝的请求按
//! 候选路径依次探测其载荷，第一个存在、形状合法且非空的错误树胜出。

use std::sync::Arc;

use forma_core::path::{self, is_falsy};
use forma_core::{Errors, FormError, RawErrors, ValidationError};

use crate::error::SubmitError;

/// 自定义错误解析器，替换默认的对账逻辑
pub type ErrorParser = Arc<dyn Fn(&SubmitError) -> Option<ValidationError> + Send + Sync>;

pub fn error_parser<F>(f: F) -> ErrorParser
where
    F: Fn(&SubmitError) -> Option<ValidationError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 默认对账
pub fn parse_errors_from_failure<S: AsRef<str>>(
    error: &SubmitError,
    candidate_paths: &[S],
) -> Option<ValidationError> {
    match error {
        SubmitError::Validation(validation) => Some(validation.clone()),
        SubmitError::Form(form_error) => form_error.as_validation().cloned(),
        SubmitError::Rejected { message, payload } => {
            if !payload.is_object() {
                return None;
            }

            let message = (!message.is_empty()).then_some(message.as_str());

            candidate_paths.iter().find_map(|candidate| {
                let candidate = candidate.as_ref();
                let raw = path::get(payload, candidate).filter(|raw| !is_falsy(raw))?;
                let errors = Errors::from(RawErrors::from_value(raw)?);

                if !errors.any() {
                    return None;
                }

                tracing::debug!(
                    "Recovered {} field error(s) from '{}'",
                    errors.len(),
                    candidate
                );
                Some(ValidationError::new(errors, message))
            })
        }
        SubmitError::Other(source) => source
            .downcast_ref::<ValidationError>()
            .cloned()
            .or_else(|| {
                source
                    .downcast_ref::<FormError>()
                    .and_then(FormError::as_validation)
                    .cloned()
            }),
    }
}
