//! 校验规则的返回值与消息规范化

use indexmap::IndexMap;

use crate::constants::FIELD_PLACEHOLDER;
use crate::errors::ErrorsObject;
use crate::utils::naming::to_human_phrase;
use crate::utils::template::template_string;

/// 规则返回的校验消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationMessage {
    /// 单条消息
    Message(String),
    /// 多条消息
    Messages(Vec<String>),
    /// 把错误转交给其他字段
    Redirect(IndexMap<String, Vec<String>>),
}

impl ValidationMessage {
    /// 构造转交消息，例如 `redirect([("city", "Required")])`
    pub fn redirect<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MessageList>,
    {
        ValidationMessage::Redirect(
            entries
                .into_iter()
                .map(|(field, messages)| (field.into(), Into::<MessageList>::into(messages).0))
                .collect(),
        )
    }

    /// 空字符串、空列表与空映射都视为"没有错误"
    pub fn is_empty(&self) -> bool {
        match self {
            ValidationMessage::Message(message) => message.is_empty(),
            ValidationMessage::Messages(messages) => messages.is_empty(),
            ValidationMessage::Redirect(fields) => fields.is_empty(),
        }
    }
}

impl From<&str> for ValidationMessage {
    fn from(message: &str) -> Self {
        ValidationMessage::Message(message.to_string())
    }
}

impl From<String> for ValidationMessage {
    fn from(message: String) -> Self {
        ValidationMessage::Message(message)
    }
}

impl From<Vec<String>> for ValidationMessage {
    fn from(messages: Vec<String>) -> Self {
        ValidationMessage::Messages(messages)
    }
}

impl From<Vec<&str>> for ValidationMessage {
    fn from(messages: Vec<&str>) -> Self {
        ValidationMessage::Messages(messages.into_iter().map(String::from).collect())
    }
}

/// 单条或多条消息，用于构造转交消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageList(pub Vec<String>);

impl From<&str> for MessageList {
    fn from(message: &str) -> Self {
        MessageList(vec![message.to_string()])
    }
}

impl From<String> for MessageList {
    fn from(message: String) -> Self {
        MessageList(vec![message])
    }
}

impl From<Vec<String>> for MessageList {
    fn from(messages: Vec<String>) -> Self {
        MessageList(messages)
    }
}

impl From<Vec<&str>> for MessageList {
    fn from(messages: Vec<&str>) -> Self {
        MessageList(messages.into_iter().map(String::from).collect())
    }
}

/// 把规则结果展开为 `路径 -> 消息列表`。
///
/// 单条与多条消息挂在 `field_path` 下；转交消息按自身的键展开。
pub fn normalize_message(message: &ValidationMessage, field_path: &str) -> ErrorsObject {
    let mut result = ErrorsObject::new();

    match message {
        ValidationMessage::Message(text) => {
            result.insert(field_path.to_string(), vec![text.clone()]);
        }
        ValidationMessage::Messages(messages) => {
            result.insert(field_path.to_string(), messages.clone());
        }
        ValidationMessage::Redirect(fields) => {
            for (field, messages) in fields {
                result.insert(field.clone(), messages.clone());
            }
        }
    }

    result
}

/// 用每个键最后一段的可读名称替换消息中的 `{field}`
pub fn apply_field_template(errors: &mut ErrorsObject) {
    for (key, messages) in errors.iter_mut() {
        let last = key.rsplit('.').next().unwrap_or(key);
        let phrase = to_human_phrase(last);

        for message in messages.iter_mut() {
            *message = template_string(message, &[(FIELD_PLACEHOLDER, phrase.as_str())]);
        }
    }
}
