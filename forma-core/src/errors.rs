//! 错误表
//!
//! 以点分字段路径（`users.0.name`）为键、按插入顺序保存多条错误消息的错误集合。
//! 前缀查询（`has` / `clear_field`）把 `parent.child` 与 `parent[0]` 视为 `parent` 的下级。

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 扁平化后的错误表：字段路径 -> 消息列表
pub type ErrorsObject = IndexMap<String, Vec<String>>;

/// 未展开的错误树节点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorNode {
    Message(String),
    Messages(Vec<String>),
    Nested(RawErrors),
    List(Vec<RawErrors>),
}

impl From<&str> for ErrorNode {
    fn from(message: &str) -> Self {
        ErrorNode::Message(message.to_string())
    }
}

impl From<String> for ErrorNode {
    fn from(message: String) -> Self {
        ErrorNode::Message(message)
    }
}

impl From<Vec<String>> for ErrorNode {
    fn from(messages: Vec<String>) -> Self {
        ErrorNode::Messages(messages)
    }
}

impl From<Vec<&str>> for ErrorNode {
    fn from(messages: Vec<&str>) -> Self {
        ErrorNode::Messages(messages.into_iter().map(String::from).collect())
    }
}

impl From<&[String]> for ErrorNode {
    fn from(messages: &[String]) -> Self {
        ErrorNode::Messages(messages.to_vec())
    }
}

impl From<RawErrors> for ErrorNode {
    fn from(tree: RawErrors) -> Self {
        ErrorNode::Nested(tree)
    }
}

impl From<Vec<RawErrors>> for ErrorNode {
    fn from(trees: Vec<RawErrors>) -> Self {
        ErrorNode::List(trees)
    }
}

/// 未展开的错误树，例如服务端返回的 `{"user": {"name": ["required"]}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawErrors(IndexMap<String, ErrorNode>);

impl RawErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, node: impl Into<ErrorNode>) {
        self.0.insert(field.into(), node.into());
    }

    pub fn with(mut self, field: impl Into<String>, node: impl Into<ErrorNode>) -> Self {
        self.insert(field, node);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ErrorNode)> {
        self.0.iter()
    }

    /// 形状检查：只有字符串、字符串数组、嵌套错误树或错误树数组组成的对象才可记录。
    /// 不满足形状时返回 `None`，不会部分转换。
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut tree = RawErrors::new();

        for (field, node) in object {
            let node = match node {
                Value::String(message) => ErrorNode::Message(message.clone()),
                Value::Object(_) => ErrorNode::Nested(RawErrors::from_value(node)?),
                Value::Array(items) => {
                    if items.iter().all(Value::is_string) {
                        ErrorNode::Messages(
                            items
                                .iter()
                                .filter_map(|item| item.as_str().map(String::from))
                                .collect(),
                        )
                    } else if items.iter().all(Value::is_object) {
                        ErrorNode::List(
                            items
                                .iter()
                                .map(RawErrors::from_value)
                                .collect::<Option<Vec<_>>>()?,
                        )
                    } else {
                        return None;
                    }
                }
                _ => return None,
            };
            tree.0.insert(field.clone(), node);
        }

        Some(tree)
    }
}

impl<K, V> FromIterator<(K, V)> for RawErrors
where
    K: Into<String>,
    V: Into<ErrorNode>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, node)| (field.into(), node.into()))
                .collect(),
        )
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for RawErrors
where
    K: Into<String>,
    V: Into<ErrorNode>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl From<ErrorsObject> for RawErrors {
    fn from(errors: ErrorsObject) -> Self {
        errors.into_iter().collect()
    }
}

impl From<&ErrorsObject> for RawErrors {
    fn from(errors: &ErrorsObject) -> Self {
        errors
            .iter()
            .map(|(field, messages)| (field.clone(), messages.clone()))
            .collect()
    }
}

impl From<&Errors> for RawErrors {
    fn from(errors: &Errors) -> Self {
        errors.all().into()
    }
}

/// 错误集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Errors {
    errors: ErrorsObject,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取全部错误
    pub fn all(&self) -> &ErrorsObject {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    /// 字段本身或其任一下级路径存在错误
    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field) || self.errors.keys().any(|key| is_nested_under(key, field))
    }

    /// 精确匹配字段的错误，不存在时为空
    pub fn get(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field).first().map(String::as_str)
    }

    /// 按插入顺序第一个字段的第一条错误
    pub fn first_error(&self) -> Option<&str> {
        self.errors
            .values()
            .next()
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    /// 是否存在任何错误
    pub fn any(&self) -> bool {
        !self.errors.is_empty()
    }

    /// 给定字段中是否有任何一个存在错误（只做精确匹配）
    pub fn any_of<S: AsRef<str>>(&self, fields: &[S]) -> bool {
        if fields.is_empty() {
            return self.any();
        }

        fields.iter().any(|field| !self.get(field.as_ref()).is_empty())
    }

    /// 清空后重新记录
    pub fn record(&mut self, errors: impl Into<RawErrors>) {
        self.clear();
        self.traverse(&errors.into(), "", false);
    }

    /// 合并到已有错误，同一字段的消息追加并去重
    pub fn add(&mut self, errors: impl Into<RawErrors>) {
        self.traverse(&errors.into(), "", true);
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// 清除字段本身及其所有下级路径
    pub fn clear_field(&mut self, field: &str) {
        self.errors
            .retain(|key, _| key != field && !is_nested_under(key, field));
    }

    /// 截取 `namespace.` 之下的错误并去掉前缀
    pub fn slice(&self, namespace: &str) -> Errors {
        let prefix = format!("{namespace}.");
        let errors = self
            .errors
            .iter()
            .filter_map(|(key, messages)| {
                key.strip_prefix(&prefix)
                    .map(|rest| (rest.to_string(), messages.clone()))
            })
            .collect();

        Errors { errors }
    }

    /// 字段本身及其下级路径的错误，键保持不变
    pub fn subtree(&self, field: &str) -> Errors {
        let errors = self
            .errors
            .iter()
            .filter(|(key, _)| key.as_str() == field || is_nested_under(key, field))
            .map(|(key, messages)| (key.clone(), messages.clone()))
            .collect();

        Errors { errors }
    }

    fn traverse(&mut self, errors: &RawErrors, prefix: &str, add: bool) {
        for (field, node) in errors.iter() {
            let key = if prefix.is_empty() {
                field.clone()
            } else {
                format!("{prefix}.{field}")
            };

            match node {
                ErrorNode::Message(message) => self.merge(key, std::slice::from_ref(message), add),
                ErrorNode::Messages(messages) => self.merge(key, messages, add),
                ErrorNode::Nested(tree) => self.traverse(tree, &key, add),
                ErrorNode::List(trees) => {
                    for (index, tree) in trees.iter().enumerate() {
                        self.traverse(tree, &format!("{key}.{index}"), add);
                    }
                }
            }
        }
    }

    fn merge(&mut self, key: String, messages: &[String], add: bool) {
        let mut merged: IndexSet<String> = IndexSet::new();

        if add {
            if let Some(existing) = self.errors.get(&key) {
                merged.extend(existing.iter().cloned());
            }
        }
        merged.extend(messages.iter().cloned());

        if merged.is_empty() {
            if !add {
                self.errors.shift_remove(&key);
            }
            return;
        }

        self.errors.insert(key, merged.into_iter().collect());
    }
}

impl From<RawErrors> for Errors {
    fn from(raw: RawErrors) -> Self {
        let mut errors = Errors::new();
        errors.record(raw);
        errors
    }
}

impl From<ErrorsObject> for Errors {
    fn from(raw: ErrorsObject) -> Self {
        RawErrors::from(raw).into()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = indexmap::map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

fn is_nested_under(key: &str, field: &str) -> bool {
    key.strip_prefix(field)
        .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_flattens_nested_tree() {
        let raw = RawErrors::from_value(&json!({
            "name": "Required",
            "user": { "email": ["Invalid", "Invalid", "Taken"] },
            "items": [{ "title": "Too long" }, { "title": ["Empty"] }],
        }))
        .unwrap();

        let mut errors = Errors::new();
        errors.record(raw);

        let keys: Vec<&str> = errors.keys().collect();
        assert_eq!(keys, vec!["name", "user.email", "items.0.title", "items.1.title"]);
        assert_eq!(errors.get("name"), ["Required"]);
        assert_eq!(errors.get("user.email"), ["Invalid", "Taken"]);
        assert_eq!(errors.get("items.1.title"), ["Empty"]);

        errors.record(RawErrors::new());
        assert!(!errors.any());
    }

    #[test]
    fn test_record_replaces_previous_errors() {
        let mut errors = Errors::new();
        errors.record([("a", "x")]);
        errors.record([("b", "y")]);

        assert!(errors.get("a").is_empty());
        assert_eq!(errors.get("b"), ["y"]);
    }

    #[test]
    fn test_add_deduplicates_and_appends() {
        let mut errors = Errors::new();
        errors.add([("a", vec!["x"])]);
        errors.add([("a", vec!["x"])]);
        assert_eq!(errors.get("a"), ["x"]);

        errors.add([("a", vec!["y"])]);
        assert_eq!(errors.get("a"), ["x", "y"]);
    }

    #[test]
    fn test_has_matches_prefix() {
        let mut errors = Errors::new();
        errors.record([("user.name", vec!["e"])]);

        assert!(errors.has("user"));
        assert!(errors.has("user.name"));
        assert!(!errors.has("use"));
        assert!(!errors.has("user.email"));

        errors.clear_field("user");
        assert!(!errors.has("user"));
    }

    #[test]
    fn test_has_matches_bracket_index() {
        let mut errors = Errors::new();
        errors.record([("tags[0]", "bad")]);

        assert!(errors.has("tags"));
        errors.clear_field("tags");
        assert!(!errors.any());
    }

    #[test]
    fn test_clear_field_keeps_similar_prefixes() {
        let mut errors = Errors::new();
        errors.record([("user", "a"), ("user.name", "b"), ("username", "c")]);

        errors.clear_field("user");

        let keys: Vec<&str> = errors.keys().collect();
        assert_eq!(keys, vec!["username"]);
    }

    #[test]
    fn test_first_and_any() {
        let mut errors = Errors::new();
        assert_eq!(errors.first_error(), None);
        assert!(!errors.any_of(&["a"]));

        errors.record([("b", vec!["first", "second"]), ("a", vec!["other"])]);

        assert_eq!(errors.first_error(), Some("first"));
        assert_eq!(errors.first("a"), Some("other"));
        assert_eq!(errors.first("missing"), None);
        assert!(errors.any_of(&["missing", "a"]));
        assert!(!errors.any_of(&["missing"]));
        assert!(errors.any_of::<&str>(&[]));
    }

    #[test]
    fn test_any_of_is_exact_match() {
        let mut errors = Errors::new();
        errors.record([("user.name", "e")]);

        assert!(!errors.any_of(&["user"]));
    }

    #[test]
    fn test_empty_messages_are_not_stored() {
        let mut errors = Errors::new();
        errors.record([("a", Vec::<String>::new())]);

        assert!(!errors.has("a"));
        assert!(!errors.any());
    }

    #[test]
    fn test_subtree_keeps_keys() {
        let mut errors = Errors::new();
        errors.record([("user", "a"), ("user.name", "b"), ("username", "c")]);

        let subtree = errors.subtree("user");
        assert_eq!(subtree.keys().collect::<Vec<_>>(), vec!["user", "user.name"]);
    }

    #[test]
    fn test_slice_strips_namespace() {
        let mut errors = Errors::new();
        errors.record([("user.name", "a"), ("user.address.city", "b"), ("other", "c")]);

        let sliced = errors.slice("user");

        let keys: Vec<&str> = sliced.keys().collect();
        assert_eq!(keys, vec!["name", "address.city"]);
        assert_eq!(sliced.get("address.city"), ["b"]);
    }

    #[test]
    fn test_shape_check() {
        assert!(RawErrors::from_value(&json!({ "a": "x" })).is_some());
        assert!(RawErrors::from_value(&json!({ "a": [] })).is_some());
        assert!(RawErrors::from_value(&json!({ "a": [{ "b": ["x"] }] })).is_some());

        assert!(RawErrors::from_value(&json!("x")).is_none());
        assert!(RawErrors::from_value(&json!(["x"])).is_none());
        assert!(RawErrors::from_value(&json!({ "a": 1 })).is_none());
        assert!(RawErrors::from_value(&json!({ "a": ["x", { "b": "y" }] })).is_none());
        assert!(RawErrors::from_value(&json!({ "a": { "b": null } })).is_none());
    }
}
