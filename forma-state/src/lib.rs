// forma-state: 表单状态机
//
// 提供：
// - 工作数据与初始快照、错误表、提交状态
// - 防重入提交与失败后的错误对账
// - 按路径的字段句柄与字段视图
// - 表单事件监听

pub mod error;
pub mod event;
pub mod field;
pub mod form;
pub mod reconcile;
pub mod submit;

pub use error::SubmitError;
pub use event::{FormEvent, FormListener};
pub use field::FormField;
pub use form::{Form, FormFields, Validated};
pub use reconcile::{error_parser, parse_errors_from_failure, ErrorParser};
pub use submit::{SubmitOptions, SubmitOutcome};

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::{
        Form, FormEvent, FormField, FormFields, FormListener, SubmitError, SubmitOptions,
        SubmitOutcome, Validated,
    };
    pub use forma_core::prelude::*;
    pub use forma_validator::{builtin, rules, FieldRules, Rule, RulesSet};
}
