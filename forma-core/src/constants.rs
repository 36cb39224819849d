/// 表单相关常量定义
///
/// 校验消息、占位符与提交失败时错误对账使用的候选路径集中在这里，
/// 配置缺省值与运行时代码共用同一份定义

/// 校验失败时的默认消息
pub const DEFAULT_VALIDATION_MESSAGE: &str = "Validation failed";

/// 消息模板中的字段占位符名称（`{field}`）
pub const FIELD_PLACEHOLDER: &str = "field";

/// 单值校验时使用的虚拟字段名
pub const VALUE_FIELD_NAME: &str = "field";

/// 提交失败时依次探测的错误树路径
///
/// 覆盖常见 HTTP 客户端的错误结构（`data`、`response.data`、`response._data`、`_data`）
pub const DEFAULT_ERROR_CANDIDATE_PATHS: &[&str] = &[
    "data.errors",
    "data.validationErrors",
    "data.data.errors",
    "data.data.validationErrors",
    "response.data.errors",
    "response.data.validationErrors",
    "response._data.errors",
    "response._data.validationErrors",
    "_data.errors",
    "_data.validationErrors",
];

/// 环境变量配置前缀
pub const DEFAULT_ENV_PREFIX: &str = "FORMA_";

/// 返回默认候选路径的拥有副本
pub fn default_candidate_paths() -> Vec<String> {
    DEFAULT_ERROR_CANDIDATE_PATHS
        .iter()
        .map(|path| path.to_string())
        .collect()
}
