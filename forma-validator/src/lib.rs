// forma-validator: 规则集校验与模式适配
//
// 提供：
// - 回调规则与可嵌套的规则集（`rules!` 宏）
// - 规则集遍历，产出以点分路径为键的错误表
// - 常用内置规则
// - 模式库适配（含基于 `validator` 派生宏的模式）

pub mod builtin;
pub mod rule;
pub mod schema;
pub mod traversal;

pub use rule::{FieldRules, IntoRule, Rule, RulesSet};
pub use schema::{
    issues_to_errors, schema_validation, validate_data_using_schema,
    validate_data_using_schema_async, AsyncSchema, DerivedSchema, Issue, PathSegment, Schema,
    SchemaValidator,
};
pub use traversal::{
    evaluate, rules_validation, rules_validation_with_message, validate_data_using_rules,
    validate_object, validate_value,
};
