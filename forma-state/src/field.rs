use std::fmt;

use forma_core::{FormError, FormResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::form::Form;

/// 单个路径上的字段句柄
///
/// 写值总会触发该字段的校验。
#[derive(Clone)]
pub struct FormField {
    form: Form,
    path: String,
}

impl FormField {
    pub fn new(form: &Form, path: &str) -> FormResult<Self> {
        if path.is_empty() {
            return Err(FormError::EmptyPath);
        }

        Ok(Self {
            form: form.clone(),
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn value(&self) -> Option<Value> {
        self.form.value(&self.path)
    }

    /// 按类型读取值，缺失时按 `null` 反序列化
    pub fn value_as<T: DeserializeOwned>(&self) -> FormResult<T> {
        let value = self.value().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| FormError::from(anyhow::Error::new(e)))
    }

    /// 写值并校验该字段，返回字段是否没有错误
    pub fn set_value(&self, value: impl Into<Value>) -> FormResult<bool> {
        self.form.write(&self.path, value.into())?;
        self.form.validate_field(&self.path)
    }

    pub fn errors(&self) -> Vec<String> {
        self.form.read_errors(|errors| errors.get(&self.path).to_vec())
    }

    pub fn error(&self) -> Option<String> {
        self.form
            .read_errors(|errors| errors.first(&self.path).map(String::from))
    }

    /// 字段本身或其下级路径是否有错误
    pub fn has_error(&self) -> bool {
        self.form.read_errors(|errors| errors.has(&self.path))
    }
}

impl fmt::Debug for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormField").field("path", &self.path).finish()
    }
}
