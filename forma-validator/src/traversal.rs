//! 规则集遍历
//!
//! 按数据的顶层字段逐个求值，嵌套规则集递归进入子对象，叶子规则的结果经过
//! 规范化与 `{field}` 模板替换后合并进错误表。

use std::sync::Arc;

use forma_core::constants::VALUE_FIELD_NAME;
use forma_core::path::{self, is_falsy};
use forma_core::{
    apply_field_template, normalize_message, Errors, ErrorsObject, FormError, FormResult,
    ValidationError, ValidationFn, ValidationMessage,
};
use serde_json::{Map, Value};

use crate::rule::{FieldRules, Rule, RulesSet};

/// 对单个字段求值并把错误累加到 `accumulator`
///
/// `value` 为 `None` 时取 `data[field]`；`path` 为字段所在对象的路径。
pub fn evaluate(
    data: &Value,
    rules: &RulesSet,
    field: &str,
    value: Option<&Value>,
    path: &[String],
    accumulator: &mut Errors,
) {
    let value = value
        .or_else(|| data.get(field))
        .unwrap_or(&Value::Null);

    let Some(current) = rules.get(field) else {
        return;
    };

    match current {
        FieldRules::Nested(nested) => {
            let nested_path = child_path(path, field);

            for nested_field in nested.fields() {
                if is_falsy(value) {
                    continue;
                }
                let Some(nested_value) = path::child(value, nested_field) else {
                    continue;
                };

                evaluate(data, nested, nested_field, Some(nested_value), &nested_path, accumulator);
            }
        }
        FieldRules::Leaf(list) => run_leaf_rules(data, list, field, value, path, accumulator),
    }
}

fn run_leaf_rules(
    data: &Value,
    rules: &[Rule],
    field: &str,
    value: &Value,
    path: &[String],
    accumulator: &mut Errors,
) {
    let siblings = path::get_segments(data, path)
        .filter(|v| !v.is_null())
        .unwrap_or(data);
    let field_path = child_path(path, field);
    let field_key = path::join(&field_path);

    for rule in rules {
        let Some(message) = rule.call(value, field, siblings) else {
            continue;
        };
        if message.is_empty() {
            continue;
        }

        match message {
            ValidationMessage::Redirect(targets) => {
                for (target, messages) in targets {
                    let key = path::join(&child_path(&field_path, &target));
                    let mut redirected = ErrorsObject::new();
                    redirected.insert(key, messages);
                    record_templated(accumulator, redirected);
                }
            }
            message => record_templated(accumulator, normalize_message(&message, &field_key)),
        }
    }
}

fn record_templated(accumulator: &mut Errors, mut errors: ErrorsObject) {
    apply_field_template(&mut errors);
    accumulator.add(errors);
}

fn child_path(path: &[String], field: &str) -> Vec<String> {
    let mut child = path.to_vec();
    child.push(field.to_string());
    child
}

/// 校验整个对象，返回完整的错误集合（不是增量补丁）
pub fn validate_object(data: &Value, rules: &RulesSet) -> FormResult<Errors> {
    let object = data.as_object().ok_or(FormError::NonObjectData)?;
    let mut errors = Errors::new();

    for (field, value) in object {
        let mut calculated = Errors::new();
        evaluate(data, rules, field, Some(value), &[], &mut calculated);

        if calculated.any() {
            errors.add(calculated.all());
        }
    }

    tracing::debug!("Validated {} field(s), {} with errors", object.len(), errors.len());
    Ok(errors)
}

/// 用规则集校验数据，存在错误时返回 `FormError::Validation`
pub fn validate_data_using_rules(
    data: &Value,
    rules: &RulesSet,
    message: Option<&str>,
) -> FormResult<Value> {
    let errors = validate_object(data, rules)?;

    if errors.any() {
        return Err(ValidationError::new(errors, message).into());
    }

    Ok(data.clone())
}

/// 基于规则集的校验函数
pub fn rules_validation(rules: RulesSet) -> ValidationFn {
    rules_validation_with_message(rules, None)
}

pub fn rules_validation_with_message(rules: RulesSet, message: Option<String>) -> ValidationFn {
    Arc::new(move |data: &Value| validate_data_using_rules(data, &rules, message.as_deref()))
}

/// 对单个值运行规则列表，字段名固定为 `field`
pub fn validate_value(value: &Value, rules: &[Rule]) -> ErrorsObject {
    let mut context = Map::new();
    context.insert(VALUE_FIELD_NAME.to_string(), value.clone());
    let context = Value::Object(context);
    let mut calculated = Errors::new();

    for rule in rules {
        let Some(message) = rule.call(value, VALUE_FIELD_NAME, &context) else {
            continue;
        };
        if message.is_empty() {
            continue;
        }

        record_templated(&mut calculated, normalize_message(&message, VALUE_FIELD_NAME));
    }

    calculated.all().clone()
}
