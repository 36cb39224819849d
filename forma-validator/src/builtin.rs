//! 内置规则
//!
//! 消息中的 `{field}` 会在遍历时替换为字段的可读名称。除 [`required`] 外，
//! 其他规则对 `null` 值直接放行。

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::rule::Rule;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex is valid")
});

/// 必填：`null`、空字符串与空数组视为缺失
pub fn required() -> Rule {
    required_with_message("{field} is required")
}

pub fn required_with_message(message: impl Into<String>) -> Rule {
    let message = message.into();
    Rule::new(move |value, _, _| {
        let missing = match value {
            Value::Null => true,
            Value::String(text) => text.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        };
        missing.then(|| message.clone().into())
    })
}

/// 字符串不能只包含空白
pub fn not_blank() -> Rule {
    Rule::new(|value, _, _| {
        let blank = value.as_str().is_some_and(|text| text.trim().is_empty());
        blank.then(|| "{field} must not be blank".into())
    })
}

/// 字符串长度（按字符计）
pub fn length(min: Option<usize>, max: Option<usize>) -> Rule {
    Rule::new(move |value, _, _| {
        let len = value.as_str()?.chars().count();

        if let Some(min_len) = min {
            if len < min_len {
                return Some(format!("{{field}} must be at least {min_len} characters").into());
            }
        }

        if let Some(max_len) = max {
            if len > max_len {
                return Some(format!("{{field}} must be at most {max_len} characters").into());
            }
        }

        None
    })
}

/// 数值范围
pub fn range(min: Option<f64>, max: Option<f64>) -> Rule {
    Rule::new(move |value, _, _| {
        let number = value.as_f64()?;

        if let Some(min_val) = min {
            if number < min_val {
                return Some(format!("{{field}} must be at least {min_val}").into());
            }
        }

        if let Some(max_val) = max {
            if number > max_val {
                return Some(format!("{{field}} must be at most {max_val}").into());
            }
        }

        None
    })
}

/// 数组元素个数
pub fn size(min: Option<usize>, max: Option<usize>) -> Rule {
    Rule::new(move |value, _, _| {
        let len = value.as_array()?.len();

        if let Some(min_size) = min {
            if len < min_size {
                return Some(format!("{{field}} must contain at least {min_size} item(s)").into());
            }
        }

        if let Some(max_size) = max {
            if len > max_size {
                return Some(format!("{{field}} must contain at most {max_size} item(s)").into());
            }
        }

        None
    })
}

/// 邮箱格式；空字符串交给 [`required`] 处理
pub fn email() -> Rule {
    Rule::new(|value, _, _| {
        let text = value.as_str().filter(|text| !text.is_empty())?;
        (!EMAIL_REGEX.is_match(text)).then(|| "{field} must be a valid email address".into())
    })
}

/// 正则匹配，表达式无效时返回错误
pub fn pattern(expression: &str) -> Result<Rule, regex::Error> {
    let regex = Regex::new(expression)?;
    let message = format!("{{field}} must match pattern: {expression}");

    Ok(Rule::new(move |value, _, _| {
        let text = value.as_str()?;
        (!regex.is_match(text)).then(|| message.clone().into())
    }))
}

/// 与同级字段的值相等，例如确认密码
pub fn same_as(other: impl Into<String>) -> Rule {
    let other = other.into();
    Rule::new(move |value, _, siblings| {
        let expected = siblings.get(&other).unwrap_or(&Value::Null);
        (value != expected).then(|| "{field} does not match".into())
    })
}
