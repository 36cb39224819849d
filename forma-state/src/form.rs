//! 表单状态
//!
//! [`Form`] 持有工作数据与初始快照、当前错误表和提交状态。所有写入都经过表单自身
//! 的方法，写入完成后通知监听器。

use std::sync::Arc;

use forma_core::path;
use forma_core::{
    AsyncValidator, Errors, FormConfig, FormError, FormResult, ValidationError, ValidationFn,
};
use forma_validator::{schema_validation, validate_data_using_rules, RulesSet, Schema};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::SubmitError;
use crate::event::{FormEvent, FormListener, Listeners};
use crate::field::FormField;

/// 校验结果：通过时为校验后的数据，失败时为携带当前错误表的校验错误
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    Valid(Value),
    Invalid(ValidationError),
}

impl Validated {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validated::Valid(_))
    }

    pub fn into_data(self) -> Option<Value> {
        match self {
            Validated::Valid(data) => Some(data),
            Validated::Invalid(_) => None,
        }
    }

    pub fn into_result(self) -> Result<Value, ValidationError> {
        match self {
            Validated::Valid(data) => Ok(data),
            Validated::Invalid(error) => Err(error),
        }
    }
}

/// 同步校验来源；规则集的失败消息在校验时取自表单配置
#[derive(Clone)]
enum Validation {
    Function(ValidationFn),
    Rules(Arc<RulesSet>),
}

/// 字段视图：对象的每个键一个 [`FormField`]，数组则逐项展开
#[derive(Clone)]
pub enum FormFields {
    Fields(IndexMap<String, FormField>),
    List(Vec<FormFields>),
}

impl FormFields {
    pub fn get(&self, key: &str) -> Option<&FormField> {
        match self {
            FormFields::Fields(fields) => fields.get(key),
            FormFields::List(_) => None,
        }
    }

    pub fn item(&self, index: usize) -> Option<&FormFields> {
        match self {
            FormFields::List(items) => items.get(index),
            FormFields::Fields(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FormFields::Fields(fields) => fields.len(),
            FormFields::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) struct FormState {
    pub(crate) data: Value,
    pub(crate) initial_data: Value,
    pub(crate) errors: Errors,
    pub(crate) loading: bool,
    pub(crate) sent: bool,
    pub(crate) error: Option<SubmitError>,
    data_revision: u64,
    initial_revision: u64,
    changes_cache: Option<(u64, u64, bool)>,
}

impl FormState {
    fn new(data: Value) -> Self {
        Self {
            initial_data: data.clone(),
            data,
            errors: Errors::new(),
            loading: false,
            sent: false,
            error: None,
            data_revision: 0,
            initial_revision: 0,
            changes_cache: None,
        }
    }

    fn touch_data(&mut self) {
        self.data_revision = self.data_revision.wrapping_add(1);
    }
}

/// 表单
///
/// 克隆得到的是同一表单的另一个句柄。
#[derive(Clone)]
pub struct Form {
    pub(crate) state: Arc<RwLock<FormState>>,
    validation: Option<Validation>,
    async_validation: Option<Arc<dyn AsyncValidator>>,
    listeners: Arc<Listeners>,
    pub(crate) config: Arc<FormConfig>,
}

impl Form {
    /// 以初始数据创建表单，数据必须是对象
    pub fn new(initial_data: Value) -> FormResult<Self> {
        if !initial_data.is_object() {
            return Err(FormError::NonObjectData);
        }

        Ok(Self {
            state: Arc::new(RwLock::new(FormState::new(initial_data))),
            validation: None,
            async_validation: None,
            listeners: Arc::new(Listeners::default()),
            config: Arc::new(FormConfig::default()),
        })
    }

    pub fn with_validation(mut self, validation: ValidationFn) -> Self {
        self.validation = Some(Validation::Function(validation));
        self
    }

    /// 以规则集校验；失败消息在每次校验时取自当前配置，与构建顺序无关
    pub fn with_rules(mut self, rules: RulesSet) -> Self {
        self.validation = Some(Validation::Rules(Arc::new(rules)));
        self
    }

    pub fn with_schema<S>(self, schema: S) -> Self
    where
        S: Schema + 'static,
    {
        self.with_validation(schema_validation(schema))
    }

    /// 设置异步校验器；提交时优先使用
    pub fn with_async_validation(mut self, validator: impl AsyncValidator + 'static) -> Self {
        self.async_validation = Some(Arc::new(validator));
        self
    }

    pub fn with_config(mut self, config: FormConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    // 监听

    pub fn subscribe(&self, listener: impl FormListener + 'static) {
        self.listeners.add(Arc::new(listener));
    }

    pub fn unsubscribe(&self, listener_name: &str) -> bool {
        self.listeners.remove(listener_name)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn emit(&self, event: FormEvent) {
        self.listeners.notify(&event);
    }

    // 读取

    /// 当前数据的快照
    pub fn data(&self) -> Value {
        self.state.read().data.clone()
    }

    pub fn initial_data(&self) -> Value {
        self.state.read().initial_data.clone()
    }

    pub fn value(&self, path: &str) -> Option<Value> {
        path::get(&self.state.read().data, path).cloned()
    }

    /// 当前错误表的快照
    pub fn errors(&self) -> Errors {
        self.state.read().errors.clone()
    }

    /// 在读锁下访问错误表；闭包内不要再调用表单的写入方法
    pub fn read_errors<R>(&self, f: impl FnOnce(&Errors) -> R) -> R {
        f(&self.state.read().errors)
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn is_sent(&self) -> bool {
        self.state.read().sent
    }

    /// 最近一次提交失败
    pub fn last_error(&self) -> Option<SubmitError> {
        self.state.read().error.clone()
    }

    // 写入

    /// 按顶层键合并新值
    pub fn update_data(&self, new_props: &Map<String, Value>) {
        {
            let mut state = self.state.write();
            path::update_props(&mut state.data, new_props);
            state.touch_data();
        }

        tracing::trace!("Updated {} top-level field(s)", new_props.len());
        self.emit(FormEvent::DataChanged { path: None });
    }

    /// 重新设定初始数据；未提供时以当前数据为准，提供时同时写入当前数据
    pub fn update_initial_data(&self, new_data: Option<Value>) -> FormResult<()> {
        let props = match &new_data {
            Some(Value::Object(map)) => Some(map.clone()),
            Some(_) => return Err(FormError::NonObjectData),
            None => None,
        };

        {
            let mut state = self.state.write();
            let initial = new_data.unwrap_or_else(|| state.data.clone());
            state.initial_data = initial;
            state.initial_revision = state.initial_revision.wrapping_add(1);
        }
        self.emit(FormEvent::InitialDataChanged);

        if let Some(props) = props {
            self.update_data(&props);
        }

        Ok(())
    }

    /// 按初始数据的顶层键恢复数据，并清空错误
    pub fn reset(&self) {
        {
            let mut state = self.state.write();
            let FormState {
                data, initial_data, ..
            } = &mut *state;

            if let Value::Object(initial) = initial_data {
                path::update_props(data, initial);
            }
            state.touch_data();
            state.errors.clear();
        }

        tracing::debug!("Form reset to initial data");
        self.emit(FormEvent::DataChanged { path: None });
        self.emit(FormEvent::ErrorsChanged);
    }

    /// 写入单个路径；空路径是编程错误
    pub(crate) fn write(&self, field: &str, value: Value) -> FormResult<()> {
        if field.is_empty() {
            return Err(FormError::EmptyPath);
        }

        {
            let mut state = self.state.write();
            path::set(&mut state.data, field, value)?;
            state.touch_data();
        }

        tracing::trace!("Wrote field '{}'", field);
        self.emit(FormEvent::DataChanged {
            path: Some(field.to_string()),
        });
        Ok(())
    }

    /// 修改错误表并通知监听器
    ///
    /// 闭包作用于错误表的副本，执行期间不持有锁，可以读取表单；结束后整体写回。
    pub fn update_errors<R>(&self, f: impl FnOnce(&mut Errors) -> R) -> R {
        let mut errors = self.errors();
        let result = f(&mut errors);
        self.state.write().errors = errors;

        self.emit(FormEvent::ErrorsChanged);
        result
    }

    /// 当前数据与初始数据是否不同
    pub fn has_changes(&self) -> bool {
        let mut state = self.state.write();
        let key = (state.data_revision, state.initial_revision);

        if let Some((data_revision, initial_revision, changed)) = state.changes_cache {
            if (data_revision, initial_revision) == key {
                return changed;
            }
        }

        let changed = !path::equal(&state.data, &state.initial_data);
        state.changes_cache = Some((key.0, key.1, changed));
        changed
    }

    // 校验

    /// 整体校验；结果完全替换错误表
    ///
    /// 未设置校验函数时直接返回当前数据。校验函数返回的非校验错误原样传播。
    pub fn validate(&self) -> FormResult<Validated> {
        let data = self.data();
        let Some(outcome) = self.run_validation(&data) else {
            return Ok(Validated::Valid(data));
        };

        self.apply_validation(outcome)
    }

    fn run_validation(&self, data: &Value) -> Option<FormResult<Value>> {
        match self.validation.as_ref()? {
            Validation::Function(validation) => Some(validation(data)),
            Validation::Rules(rules) => Some(validate_data_using_rules(
                data,
                rules,
                Some(self.config.validation.message.as_str()),
            )),
        }
    }

    /// 异步整体校验；未设置异步校验器时退回同步校验
    pub async fn validate_async(&self) -> FormResult<Validated> {
        let Some(validator) = &self.async_validation else {
            return self.validate();
        };

        let data = self.data();
        tracing::debug!("Running async validator '{}'", validator.validator_name());
        let outcome = validator.validate(&data).await;
        self.apply_validation(outcome)
    }

    fn apply_validation(&self, outcome: FormResult<Value>) -> FormResult<Validated> {
        let validated = match outcome {
            Ok(data) => {
                self.state.write().errors.clear();
                Validated::Valid(data)
            }
            Err(FormError::Validation(error)) => {
                let mut state = self.state.write();
                state.errors.record(error.errors());
                Validated::Invalid(ValidationError::new(
                    state.errors.clone(),
                    Some(error.message()),
                ))
            }
            Err(error) => return Err(error),
        };

        tracing::debug!("Form validated, valid: {}", validated.is_valid());
        self.emit(FormEvent::ErrorsChanged);
        Ok(validated)
    }

    /// 校验单个字段，只替换该字段及其下级路径的错误
    ///
    /// 返回字段现在是否没有错误。
    pub fn validate_field(&self, field: &str) -> FormResult<bool> {
        let data = self.data();
        let Some(outcome) = self.run_validation(&data) else {
            return Ok(true);
        };

        let fresh = match outcome {
            Ok(_) => Errors::new(),
            Err(FormError::Validation(error)) => error.errors().subtree(field),
            Err(error) => return Err(error),
        };

        let valid = !fresh.any();
        {
            let mut state = self.state.write();
            state.errors.clear_field(field);
            state.errors.add(&fresh);
        }

        tracing::debug!("Validated field '{}', valid: {}", field, valid);
        self.emit(FormEvent::ErrorsChanged);
        Ok(valid)
    }

    // 字段

    pub fn field(&self, path: &str) -> FormResult<FormField> {
        FormField::new(self, path)
    }

    /// 为 `path` 处的对象创建字段视图（`None` 为根对象），数组逐项展开
    pub fn fields(&self, path: Option<&str>) -> FormResult<FormFields> {
        let segments: Vec<String> = path
            .map(path::segments)
            .unwrap_or_default()
            .into_iter()
            .map(String::from)
            .collect();

        let data = self.data();
        let target = path::get_segments(&data, &segments).unwrap_or(&Value::Null);
        self.build_fields(target, segments)
    }

    fn build_fields(&self, value: &Value, segments: Vec<String>) -> FormResult<FormFields> {
        match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let mut child = segments.clone();
                    child.push(index.to_string());
                    self.build_fields(item, child)
                })
                .collect::<FormResult<Vec<_>>>()
                .map(FormFields::List),
            Value::Object(map) => map
                .keys()
                .map(|key| {
                    let mut child = segments.clone();
                    child.push(key.clone());
                    Ok((key.clone(), FormField::new(self, &path::join(&child))?))
                })
                .collect::<FormResult<IndexMap<_, _>>>()
                .map(FormFields::Fields),
            _ => Err(FormError::NonObjectFields {
                path: path::join(&segments),
            }),
        }
    }
}
