//! 翻译模块统一错误处理
//!
//! 错误分类决定两件事：结果是否可以写入缓存，以及以什么级别记录日志。
//! 所有提供商/网络错误都会在 `TranslationClient` 边界被吸收并降级为原文，
//! 永远不会向页面渲染层抛出。

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 凭证未配置，进程生命周期内恒定，跳过一切网络请求
    #[error("翻译凭证未配置")]
    NotConfigured,

    /// 签名或凭证被提供商拒绝；在配置变更前每次调用都会同样失败
    #[error("签名或凭证被拒绝: {0}")]
    Authentication(String),

    /// 账号未开通机器翻译服务（半永久，直接透传原文）
    #[error("翻译服务不可用: {0}")]
    ServiceUnavailable(String),

    /// 超时、网络故障或响应格式异常，稍后重试可能成功
    #[error("临时性错误: {0}")]
    Transient(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 缓存持久化错误
    #[error("缓存存储错误: {0}")]
    CacheStorage(String),
}

impl TranslationError {
    /// 错误在进程生命周期内是否恒定（重试不会改变结果）
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            TranslationError::NotConfigured
                | TranslationError::Authentication(_)
                | TranslationError::Config(_)
        )
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 对运维可操作：修凭证之前每次调用都会失败，必须显眼
            TranslationError::Authentication(_) => ErrorSeverity::Error,
            TranslationError::ServiceUnavailable(_) => ErrorSeverity::Warning,
            TranslationError::Transient(_) => ErrorSeverity::Warning,
            TranslationError::NotConfigured => ErrorSeverity::Info,
            TranslationError::Config(_) => ErrorSeverity::Critical,
            TranslationError::CacheStorage(_) => ErrorSeverity::Warning,
        }
    }

    /// 按严重程度输出日志
    pub fn log(&self, context: &str) {
        match self.severity() {
            ErrorSeverity::Info => tracing::debug!("{}: {}", context, self),
            ErrorSeverity::Warning => tracing::warn!("{}: {}", context, self),
            ErrorSeverity::Error | ErrorSeverity::Critical => {
                tracing::error!("{}: {}", context, self)
            }
        }
    }

    /// 根据提供商返回的错误码分类
    ///
    /// 腾讯云错误码为 `模块.具体原因` 形式，签名类失败以 `AuthFailure`
    /// 开头，服务未开通为 `FailedOperation.UserNotRegistered`。
    pub fn from_provider_code(code: &str, message: &str) -> Self {
        let detail = format!("{code} - {message}");
        if code.starts_with("AuthFailure") || code.starts_with("Signature") {
            TranslationError::Authentication(detail)
        } else if code == "FailedOperation.UserNotRegistered"
            || code.starts_with("ResourceUnavailable")
            || code.starts_with("UnsupportedOperation")
        {
            TranslationError::ServiceUnavailable(detail)
        } else {
            TranslationError::Transient(detail)
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TranslationError::Transient(format!("请求超时: {error}"))
        } else {
            TranslationError::Transient(format!("网络错误: {error}"))
        }
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::Transient(format!("响应解析失败: {error}"))
    }
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::CacheStorage(format!("IO错误: {error}"))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::Config(format!("TOML解析错误: {error}"))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;
