use std::fmt;
use std::sync::Arc;

use forma_core::ValidationMessage;
use indexmap::IndexMap;
use serde_json::Value;

type RuleFn = dyn Fn(&Value, &str, &Value) -> Option<ValidationMessage> + Send + Sync;

/// 校验规则
///
/// 参数依次为字段值、字段名、字段所在对象（嵌套规则时为父对象，否则为整个数据）。
/// 返回 `None` 或空消息表示通过。
#[derive(Clone)]
pub struct Rule(Arc<RuleFn>);

impl Rule {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &str, &Value) -> Option<ValidationMessage> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, value: &Value, field: &str, data: &Value) -> Option<ValidationMessage> {
        (self.0)(value, field, data)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Rule")
    }
}

/// 可转换为 [`Rule`] 的类型（规则本身或闭包）
pub trait IntoRule {
    fn into_rule(self) -> Rule;
}

impl IntoRule for Rule {
    fn into_rule(self) -> Rule {
        self
    }
}

impl<F> IntoRule for F
where
    F: Fn(&Value, &str, &Value) -> Option<ValidationMessage> + Send + Sync + 'static,
{
    fn into_rule(self) -> Rule {
        Rule::new(self)
    }
}

/// 单个字段的规则：叶子规则列表或嵌套规则集
#[derive(Debug, Clone)]
pub enum FieldRules {
    Leaf(Vec<Rule>),
    Nested(RulesSet),
}

impl FieldRules {
    pub fn is_nested(&self) -> bool {
        matches!(self, FieldRules::Nested(_))
    }
}

impl From<Rule> for FieldRules {
    fn from(rule: Rule) -> Self {
        FieldRules::Leaf(vec![rule])
    }
}

impl From<Vec<Rule>> for FieldRules {
    fn from(rules: Vec<Rule>) -> Self {
        FieldRules::Leaf(rules)
    }
}

impl From<RulesSet> for FieldRules {
    fn from(rules: RulesSet) -> Self {
        FieldRules::Nested(rules)
    }
}

/// 规则集：字段名 -> 规则
#[derive(Debug, Clone, Default)]
pub struct RulesSet {
    fields: IndexMap<String, FieldRules>,
}

impl RulesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, rules: impl Into<FieldRules>) {
        self.fields.insert(field.into(), rules.into());
    }

    /// 添加单条闭包规则
    pub fn rule<F>(mut self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &str, &Value) -> Option<ValidationMessage> + Send + Sync + 'static,
    {
        self.insert(field, Rule::new(f));
        self
    }

    /// 添加规则列表
    pub fn rules(mut self, field: impl Into<String>, rules: Vec<Rule>) -> Self {
        self.insert(field, rules);
        self
    }

    /// 添加嵌套规则集
    pub fn nested(mut self, field: impl Into<String>, rules: RulesSet) -> Self {
        self.insert(field, rules);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldRules> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// 声明式构造 [`RulesSet`]：`[...]` 为规则列表，`{...}` 为嵌套规则集
///
/// ```
/// use forma_validator::{builtin, rules};
///
/// let set = rules! {
///     "name" => [builtin::required(), builtin::length(Some(3), None)],
///     "user" => {
///         "email" => [builtin::email()],
///     },
/// };
///
/// assert_eq!(set.len(), 2);
/// assert!(set.get("user").unwrap().is_nested());
/// ```
#[macro_export]
macro_rules! rules {
    (@entry { $($inner:tt)* }) => {
        $crate::FieldRules::Nested($crate::rules!($($inner)*))
    };
    (@entry [ $($rule:expr),* $(,)? ]) => {
        $crate::FieldRules::Leaf(vec![$($crate::IntoRule::into_rule($rule)),*])
    };
    () => {
        $crate::RulesSet::new()
    };
    ($($field:literal => $rules:tt),+ $(,)?) => {{
        let mut set = $crate::RulesSet::new();
        $( set.insert($field, $crate::rules!(@entry $rules)); )+
        set
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_call() {
        let rule = Rule::new(|value, field, _| {
            value.is_null().then(|| format!("{field} missing").into())
        });

        assert_eq!(
            rule.call(&Value::Null, "name", &json!({})),
            Some(ValidationMessage::from("name missing"))
        );
        assert_eq!(rule.call(&json!("x"), "name", &json!({})), None);
    }

    #[test]
    fn test_builder_and_macro_agree() {
        let built = RulesSet::new()
            .rule("name", |_, _, _| None)
            .nested("user", RulesSet::new().rule("email", |_, _, _| None));

        let declared = rules! {
            "name" => [Rule::new(|_, _, _| None)],
            "user" => { "email" => [Rule::new(|_, _, _| None)] },
        };

        assert_eq!(built.fields().collect::<Vec<_>>(), declared.fields().collect::<Vec<_>>());
        assert!(declared.get("user").unwrap().is_nested());
        assert!(!declared.get("name").unwrap().is_nested());
        assert!(rules!().is_empty());
    }
}
