//! 提交流程
//!
//! 同一时刻只允许一个提交：提交进行中再次调用会立即返回
//! [`SubmitOutcome::AlreadySubmitting`]，不会排队，也不会再次调用处理函数。

use std::fmt;
use std::future::Future;

use forma_core::SubmitDefaults;
use serde_json::Value;

use crate::error::SubmitError;
use crate::event::FormEvent;
use crate::form::{Form, Validated};
use crate::reconcile::{parse_errors_from_failure, ErrorParser};

type AfterValidateHook = Box<dyn FnOnce(&Form) -> bool + Send>;
type ErrorHook = Box<dyn FnOnce(&SubmitError) -> bool + Send>;

/// 提交选项
pub struct SubmitOptions {
    /// 提交前是否校验
    pub validate: bool,
    /// 成功后是否重置表单
    pub reset_on_success: bool,
    /// 失败时不向调用方返回错误，调用方通过 [`Form::last_error`] 查看
    pub silent: bool,
    on_after_validate: Option<AfterValidateHook>,
    on_error: Option<ErrorHook>,
    error_parser: Option<ErrorParser>,
}

impl SubmitOptions {
    pub fn new() -> Self {
        Self::from(&SubmitDefaults::default())
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn reset_on_success(mut self, reset: bool) -> Self {
        self.reset_on_success = reset;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// 校验之后调用；返回 `false` 中止提交。
    /// 在回调中清空错误时，处理函数收到的是当前数据而不是校验后的数据。
    pub fn on_after_validate<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&Form) -> bool + Send + 'static,
    {
        self.on_after_validate = Some(Box::new(hook));
        self
    }

    /// 失败且错误已记录后调用，参数为原始失败；返回 `false` 时不再向调用方返回错误
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&SubmitError) -> bool + Send + 'static,
    {
        self.on_error = Some(Box::new(hook));
        self
    }

    pub fn error_parser(mut self, parser: ErrorParser) -> Self {
        self.error_parser = Some(parser);
        self
    }
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&SubmitDefaults> for SubmitOptions {
    fn from(defaults: &SubmitDefaults) -> Self {
        Self {
            validate: defaults.validate,
            reset_on_success: defaults.reset_on_success,
            silent: defaults.silent,
            on_after_validate: None,
            on_error: None,
            error_parser: None,
        }
    }
}

impl fmt::Debug for SubmitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmitOptions")
            .field("validate", &self.validate)
            .field("reset_on_success", &self.reset_on_success)
            .field("silent", &self.silent)
            .field("on_after_validate", &self.on_after_validate.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("error_parser", &self.error_parser.is_some())
            .finish()
    }
}

/// 提交结果
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<R> {
    /// 已有提交在进行中，本次调用被丢弃
    AlreadySubmitting,
    /// 校验未通过，处理函数未被调用
    Invalid,
    /// `on_after_validate` 返回了 `false`
    Aborted,
    /// 处理函数成功
    Sent(R),
    /// 处理函数失败且错误未返回给调用方（`silent` 或 `on_error` 返回 `false`）
    Failed,
}

impl<R> SubmitOutcome<R> {
    pub fn is_sent(&self) -> bool {
        matches!(self, SubmitOutcome::Sent(_))
    }

    pub fn into_sent(self) -> Option<R> {
        match self {
            SubmitOutcome::Sent(result) => Some(result),
            _ => None,
        }
    }
}

/// 提交期间持有；释放时总会清除 loading
struct LoadingGuard<'a> {
    form: &'a Form,
}

impl<'a> LoadingGuard<'a> {
    fn acquire(form: &'a Form) -> Option<Self> {
        {
            let mut state = form.state.write();
            if state.loading {
                return None;
            }
            state.loading = true;
            state.sent = false;
        }

        form.emit(FormEvent::SubmitStateChanged {
            loading: true,
            sent: false,
        });
        Some(Self { form })
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let sent = {
            let mut state = self.form.state.write();
            state.loading = false;
            state.sent
        };

        self.form.emit(FormEvent::SubmitStateChanged {
            loading: false,
            sent,
        });
    }
}

impl Form {
    /// 使用配置中的提交默认选项
    pub fn submit_options(&self) -> SubmitOptions {
        SubmitOptions::from(&self.config.submit)
    }

    /// 校验并提交
    ///
    /// 处理函数收到校验后的数据（未校验或校验后错误被清空时为当前数据）。失败时先对账：
    /// 能恢复出校验错误就记录到错误表并保存为 [`SubmitError::Validation`]，否则保存
    /// 原始失败。
    pub async fn submit<F, Fut, R>(
        &self,
        resolver: F,
        options: SubmitOptions,
    ) -> Result<SubmitOutcome<R>, SubmitError>
    where
        F: FnOnce(Value) -> Fut,
        Fut: Future<Output = Result<R, SubmitError>>,
    {
        let Some(_guard) = LoadingGuard::acquire(self) else {
            tracing::debug!("Submit skipped, form is already submitting");
            return Ok(SubmitOutcome::AlreadySubmitting);
        };

        let SubmitOptions {
            validate,
            reset_on_success,
            silent,
            on_after_validate,
            on_error,
            error_parser,
        } = options;

        let payload = if validate {
            let validated = self.validate_async().await?;
            let proceed = on_after_validate.map_or(true, |hook| hook(self));

            if self.read_errors(|errors| errors.any()) {
                tracing::debug!("Submit stopped, form has validation errors");
                return Ok(SubmitOutcome::Invalid);
            }
            if !proceed {
                tracing::debug!("Submit aborted after validation");
                return Ok(SubmitOutcome::Aborted);
            }

            match validated {
                Validated::Valid(data) => data,
                Validated::Invalid(_) => self.data(),
            }
        } else {
            self.data()
        };

        tracing::debug!("Submitting form");

        match resolver(payload).await {
            Ok(result) => {
                {
                    let mut state = self.state.write();
                    state.error = None;
                    state.sent = true;
                }

                tracing::debug!("Form submitted");
                if reset_on_success {
                    self.reset();
                }
                Ok(SubmitOutcome::Sent(result))
            }
            Err(error) => {
                let parsed = match &error_parser {
                    Some(parser) => parser(&error),
                    None => parse_errors_from_failure(&error, &self.config.reconcile.candidate_paths),
                };

                let stored = match parsed {
                    Some(validation) => {
                        self.update_errors(|errors| errors.record(validation.errors()));
                        SubmitError::Validation(validation)
                    }
                    None => error.clone(),
                };

                tracing::warn!("Form submission failed: {}", error);
                self.state.write().error = Some(stored.clone());

                if let Some(hook) = on_error {
                    if !hook(&error) {
                        return Ok(SubmitOutcome::Failed);
                    }
                }

                if silent {
                    return Ok(SubmitOutcome::Failed);
                }

                Err(stored)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::error_parser;
    use forma_core::{FormConfig, ValidationError};
    use forma_validator::{builtin, rules, DerivedSchema, SchemaValidator};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use validator::Validate;

    fn signup_form() -> Form {
        Form::new(json!({ "name": "John", "email": "john@example.com" }))
            .unwrap()
            .with_rules(rules! {
                "name" => [builtin::required(), builtin::length(Some(3), None)],
                "email" => [builtin::email()],
            })
    }

    fn unprocessable() -> SubmitError {
        SubmitError::rejected(
            "Request failed with status code 422",
            json!({ "response": { "data": { "errors": { "email": ["Already taken"] } } } }),
        )
    }

    #[tokio::test]
    async fn test_successful_submit() {
        let form = signup_form();

        let outcome = form
            .submit(|data| async move { Ok::<_, SubmitError>(data["name"].clone()) }, SubmitOptions::new())
            .await
            .unwrap();

        assert_eq!(outcome, SubmitOutcome::Sent(json!("John")));
        assert!(form.is_sent());
        assert!(!form.is_loading());
        assert!(form.last_error().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_submit_is_dropped() {
        let form = signup_form();
        let calls = Arc::new(AtomicUsize::new(0));

        let resolver = |calls: Arc<AtomicUsize>| {
            move |_data: Value| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, SubmitError>(())
            }
        };

        let (first, second) = tokio::join!(
            form.submit(resolver(Arc::clone(&calls)), SubmitOptions::new()),
            form.submit(resolver(Arc::clone(&calls)), SubmitOptions::new()),
        );

        assert_eq!(first.unwrap(), SubmitOutcome::Sent(()));
        assert_eq!(second.unwrap(), SubmitOutcome::AlreadySubmitting);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!form.is_loading());
    }

    #[tokio::test]
    async fn test_invalid_form_skips_resolver() {
        let form = signup_form();
        form.field("name").unwrap().set_value("Jo").unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let outcome = form
            .submit(
                move |_| async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, SubmitError>(())
                },
                SubmitOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome, SubmitOutcome::Invalid);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!form.is_loading());
        assert!(!form.is_sent());
    }

    #[tokio::test]
    async fn test_submit_without_validation() {
        let form = signup_form();
        form.update_data(json!({ "name": "Jo" }).as_object().unwrap());

        let outcome = form
            .submit(|data| async move { Ok::<_, SubmitError>(data) }, SubmitOptions::new().validate(false))
            .await
            .unwrap();

        assert_eq!(outcome.into_sent().unwrap()["name"], json!("Jo"));
    }

    #[tokio::test]
    async fn test_after_validate_hook() {
        let form = signup_form();

        let outcome = form
            .submit(
                |_| async { Ok::<_, SubmitError>(()) },
                SubmitOptions::new().on_after_validate(|_| false),
            )
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Aborted);

        // 在回调中清空错误后，处理函数收到当前数据
        form.update_data(json!({ "name": "Jo" }).as_object().unwrap());
        let outcome = form
            .submit(
                |data| async move { Ok::<_, SubmitError>(data) },
                SubmitOptions::new().on_after_validate(|form| {
                    form.update_errors(|errors| errors.clear());
                    true
                }),
            )
            .await
            .unwrap();
        assert_eq!(outcome.into_sent().unwrap()["name"], json!("Jo"));
    }

    #[tokio::test]
    async fn test_reset_on_success() {
        let form = signup_form();
        form.update_data(json!({ "name": "Joan" }).as_object().unwrap());

        form.submit(|_| async { Ok::<_, SubmitError>(()) }, SubmitOptions::new().reset_on_success(true))
            .await
            .unwrap();

        assert_eq!(form.value("name"), Some(json!("John")));
        assert!(form.is_sent());
    }

    #[tokio::test]
    async fn test_rejected_submit_is_reconciled() {
        let form = signup_form();

        let error = form
            .submit(|_| async { Err::<(), _>(unprocessable()) }, SubmitOptions::new())
            .await
            .unwrap_err();

        let validation = error.as_validation().unwrap();
        assert_eq!(validation.message(), "Request failed with status code 422");
        assert_eq!(form.errors().get("email"), ["Already taken"]);
        assert!(matches!(form.last_error(), Some(SubmitError::Validation(_))));
        assert!(!form.is_sent());
        assert!(!form.is_loading());
    }

    #[tokio::test]
    async fn test_unparsed_failure_is_stored_verbatim() {
        let form = signup_form();

        let error = form
            .submit(
                |_| async { Err::<(), SubmitError>(anyhow::anyhow!("connection reset").into()) },
                SubmitOptions::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "connection reset");
        assert!(matches!(form.last_error(), Some(SubmitError::Other(_))));
        assert!(!form.errors().any());
    }

    #[tokio::test]
    async fn test_silent_submit() {
        let form = signup_form();

        let outcome = form
            .submit(|_| async { Err::<(), _>(unprocessable()) }, SubmitOptions::new().silent(true))
            .await
            .unwrap();

        assert_eq!(outcome, SubmitOutcome::Failed);
        assert!(form.last_error().is_some());
        assert!(form.errors().has("email"));
    }

    #[tokio::test]
    async fn test_on_error_receives_original_failure() {
        let form = signup_form();
        let seen = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&seen);
        let outcome = form
            .submit(
                |_| async { Err::<(), _>(unprocessable()) },
                SubmitOptions::new().on_error(move |error| {
                    *sink.lock().unwrap() = Some(error.clone());
                    false
                }),
            )
            .await
            .unwrap();

        assert_eq!(outcome, SubmitOutcome::Failed);
        assert!(matches!(
            seen.lock().unwrap().as_ref(),
            Some(SubmitError::Rejected { .. })
        ));
        assert!(matches!(form.last_error(), Some(SubmitError::Validation(_))));
    }

    #[tokio::test]
    async fn test_custom_error_parser() {
        let form = signup_form();

        let parser = error_parser(|error| match error {
            SubmitError::Rejected { payload, .. } => payload["field"]
                .as_str()
                .map(|field| ValidationError::field_error(field, "Rejected by server")),
            _ => None,
        });

        let result = form
            .submit(
                |_| async { Err::<(), _>(SubmitError::rejected("", json!({ "field": "name" }))) },
                SubmitOptions::new().error_parser(parser),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(form.errors().get("name"), ["Rejected by server"]);
    }

    #[tokio::test]
    async fn test_config_defaults_apply() {
        let mut config = FormConfig::default();
        config.submit.silent = true;
        config.reconcile.candidate_paths = vec!["body.errors".to_string()];

        let form = signup_form().with_config(config);
        let options = form.submit_options();
        assert!(options.silent);

        let outcome = form
            .submit(
                |_| async {
                    Err::<(), _>(SubmitError::rejected(
                        "",
                        json!({ "body": { "errors": { "name": "Taken" } } }),
                    ))
                },
                options,
            )
            .await
            .unwrap();

        assert_eq!(outcome, SubmitOutcome::Failed);
        assert_eq!(form.errors().get("name"), ["Taken"]);
    }

    #[derive(Deserialize, Serialize, Validate)]
    struct Signup {
        #[validate(length(min = 3, message = "Name is too short"))]
        name: String,
        #[validate(email(message = "Email is invalid"))]
        email: String,
    }

    #[tokio::test]
    async fn test_async_validation_is_used_by_submit() {
        let form = Form::new(json!({ "name": "Jo", "email": "jo" }))
            .unwrap()
            .with_async_validation(SchemaValidator::new(DerivedSchema::<Signup>::new()));

        let outcome = form
            .submit(|_| async { Ok::<_, SubmitError>(()) }, SubmitOptions::new())
            .await
            .unwrap();

        assert_eq!(outcome, SubmitOutcome::Invalid);
        assert_eq!(form.errors().get("name"), ["Name is too short"]);
        assert_eq!(form.errors().get("email"), ["Email is invalid"]);
    }

    #[tokio::test]
    async fn test_submit_state_events() {
        let form = signup_form();
        let states = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&states);
        form.subscribe(move |event: &FormEvent| {
            if let FormEvent::SubmitStateChanged { loading, sent } = event {
                sink.lock().unwrap().push((*loading, *sent));
            }
        });

        form.submit(|_| async { Ok::<_, SubmitError>(()) }, SubmitOptions::new())
            .await
            .unwrap();

        assert_eq!(*states.lock().unwrap(), vec![(true, false), (false, true)]);
    }
}
