//! 校验函数契约
//!
//! 校验函数接收完整的表单数据，成功时返回校验后的数据，失败时返回
//! `FormError::Validation`。其他错误变体表示编程错误，会原样向上传播。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FormResult;

/// 同步校验函数
pub type ValidationFn = Arc<dyn Fn(&Value) -> FormResult<Value> + Send + Sync>;

/// 把闭包包装为 [`ValidationFn`]
pub fn validation_fn<F>(f: F) -> ValidationFn
where
    F: Fn(&Value) -> FormResult<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 异步校验器
///
/// 与同步校验函数的结果形状相同，调用方必须等待完成后再读取错误表
#[async_trait]
pub trait AsyncValidator: Send + Sync {
    async fn validate(&self, data: &Value) -> FormResult<Value>;

    /// 校验器名称（用于日志）
    fn validator_name(&self) -> &str {
        "AnonymousValidator"
    }
}

/// 以异步接口暴露同步校验函数
pub struct SyncValidatorAdapter {
    validation: ValidationFn,
}

impl SyncValidatorAdapter {
    pub fn new(validation: ValidationFn) -> Self {
        Self { validation }
    }
}

#[async_trait]
impl AsyncValidator for SyncValidatorAdapter {
    async fn validate(&self, data: &Value) -> FormResult<Value> {
        (self.validation)(data)
    }

    fn validator_name(&self) -> &str {
        "SyncValidatorAdapter"
    }
}
