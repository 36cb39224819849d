//! 模式校验适配
//!
//! 把任意模式库的解析结果（问题列表）转换为错误表。[`DerivedSchema`] 以
//! `validator` 派生宏作为模式实现。

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use forma_core::{
    AsyncValidator, Errors, ErrorsObject, FormResult, ValidationError, ValidationFn,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 问题路径中的一段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// 模式校验发现的单个问题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl Issue {
    pub fn new(path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// 不属于任何字段的问题，记录在空键下
    pub fn root(message: impl Into<String>) -> Self {
        Self::new(Vec::new(), message)
    }

    pub fn key(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// 同步模式
pub trait Schema: Send + Sync {
    fn safe_parse(&self, data: &Value) -> Result<Value, Vec<Issue>>;
}

/// 异步模式
#[async_trait]
pub trait AsyncSchema: Send + Sync {
    async fn safe_parse_async(&self, data: &Value) -> Result<Value, Vec<Issue>>;
}

#[async_trait]
impl<S: Schema> AsyncSchema for S {
    async fn safe_parse_async(&self, data: &Value) -> Result<Value, Vec<Issue>> {
        self.safe_parse(data)
    }
}

/// 按路径分组问题，同一路径的消息保持出现顺序
pub fn issues_to_errors(issues: &[Issue]) -> Errors {
    let mut grouped = ErrorsObject::new();

    for issue in issues {
        grouped.entry(issue.key()).or_default().push(issue.message.clone());
    }

    let mut errors = Errors::new();
    errors.record(grouped);
    errors
}

fn into_result(parsed: Result<Value, Vec<Issue>>, message: Option<&str>) -> FormResult<Value> {
    parsed.map_err(|issues| {
        tracing::debug!("Schema rejected data with {} issue(s)", issues.len());
        ValidationError::new(issues_to_errors(&issues), message).into()
    })
}

/// 用同步模式校验数据，返回模式输出的数据
pub fn validate_data_using_schema<S>(data: &Value, schema: &S, message: Option<&str>) -> FormResult<Value>
where
    S: Schema + ?Sized,
{
    into_result(schema.safe_parse(data), message)
}

pub async fn validate_data_using_schema_async<S>(
    data: &Value,
    schema: &S,
    message: Option<&str>,
) -> FormResult<Value>
where
    S: AsyncSchema + ?Sized,
{
    into_result(schema.safe_parse_async(data).await, message)
}

/// 基于同步模式的校验函数
pub fn schema_validation<S>(schema: S) -> ValidationFn
where
    S: Schema + 'static,
{
    Arc::new(move |data: &Value| validate_data_using_schema(data, &schema, None))
}

/// 以 [`AsyncValidator`] 暴露异步模式
pub struct SchemaValidator<S> {
    schema: S,
    message: Option<String>,
}

impl<S> SchemaValidator<S> {
    pub fn new(schema: S) -> Self {
        Self {
            schema,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[async_trait]
impl<S: AsyncSchema> AsyncValidator for SchemaValidator<S> {
    async fn validate(&self, data: &Value) -> FormResult<Value> {
        validate_data_using_schema_async(data, &self.schema, self.message.as_deref()).await
    }

    fn validator_name(&self) -> &str {
        "SchemaValidator"
    }
}

/// 以 `#[derive(Deserialize, Serialize, Validate)]` 结构体作为模式
///
/// 数据先反序列化为 `T`，再运行 `validate()`；通过时输出 `T` 重新序列化的结果。
///
/// ```
/// use forma_validator::{DerivedSchema, Schema};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
/// use validator::Validate;
///
/// #[derive(Deserialize, Serialize, Validate)]
/// struct Signup {
///     #[validate(length(min = 3, message = "Too short"))]
///     name: String,
/// }
///
/// let schema = DerivedSchema::<Signup>::new();
/// let issues = schema.safe_parse(&json!({ "name": "Jo" })).unwrap_err();
///
/// assert_eq!(issues[0].key(), "name");
/// assert_eq!(issues[0].message, "Too short");
/// ```
pub struct DerivedSchema<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> DerivedSchema<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for DerivedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Schema for DerivedSchema<T>
where
    T: DeserializeOwned + Serialize + Validate,
{
    fn safe_parse(&self, data: &Value) -> Result<Value, Vec<Issue>> {
        let parsed: T = serde_json::from_value(data.clone())
            .map_err(|e| vec![Issue::root(e.to_string())])?;

        if let Err(errors) = parsed.validate() {
            let mut issues = Vec::new();
            collect_issues(&errors, &mut Vec::new(), &mut issues);
            return Err(issues);
        }

        serde_json::to_value(&parsed).map_err(|e| vec![Issue::root(e.to_string())])
    }
}

fn collect_issues(errors: &ValidationErrors, path: &mut Vec<PathSegment>, issues: &mut Vec<Issue>) {
    // HashMap 顺序不稳定，按字段名排序
    let sorted: BTreeMap<String, &ValidationErrorsKind> = errors
        .errors()
        .iter()
        .map(|(field, kind)| (field.to_string(), kind))
        .collect();

    for (field, kind) in sorted {
        path.push(PathSegment::Key(field));

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|cow| cow.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", error.code));
                    issues.push(Issue::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_issues(nested, path, issues),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    path.push(PathSegment::Index(*index));
                    collect_issues(nested, path, issues);
                    path.pop();
                }
            }
        }

        path.pop();
    }
}
