// forma-core: 表单错误模型与基础工具
//
// 提供：
// - 以点分路径为键的错误表（前缀查询、合并、截取）
// - 嵌套数据的路径读写
// - 字段可读名称与消息模板
// - 校验失败类型与校验函数契约
// - 配置与日志初始化

pub mod config;
pub mod constants;
pub mod error;
pub mod errors;
pub mod logging;
pub mod message;
pub mod path;
pub mod utils;
pub mod validation;

// 重新导出常用类型
pub use config::{ConfigError, FormConfig, ReconcileConfig, SubmitDefaults, ValidationConfig};
pub use constants::*;
pub use error::{format_errors, FormError, FormResult, ValidationError};
pub use errors::{ErrorNode, Errors, ErrorsObject, RawErrors};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use message::{apply_field_template, normalize_message, MessageList, ValidationMessage};
pub use validation::{validation_fn, AsyncValidator, SyncValidatorAdapter, ValidationFn};

// 导出 async_trait，供实现 AsyncValidator 使用
pub use async_trait;

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::config::FormConfig;
    pub use crate::error::{FormError, FormResult, ValidationError};
    pub use crate::errors::{Errors, ErrorsObject, RawErrors};
    pub use crate::logging::{LogFormat, LogLevel, LoggingConfig};
    pub use crate::message::ValidationMessage;
    pub use crate::path;
    pub use crate::validation::{validation_fn, AsyncValidator, ValidationFn};
}
