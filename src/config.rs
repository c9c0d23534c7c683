//! 翻译配置管理
//!
//! 提供统一的配置接口，支持 TOML 配置文件、环境变量和默认值。
//! 凭证缺失不是错误：管道会以"未配置"模式运行，所有请求直接返回原文。

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TranslationResult, TranslationError};

/// 配置常量
pub mod constants {
    /// 提供商单次请求的硬性字符上限
    pub const PROVIDER_MAX_CHARS: usize = 2000;

    /// 低于该长度的文本不分段，直接整体翻译
    pub const DIRECT_TRANSLATE_THRESHOLD: usize = 2000;

    /// 分段目标上限，留出安全余量避免贴着提供商上限
    pub const MAX_CHUNK_CHARS: usize = 1800;

    /// 每批并发翻译的分段数
    pub const BATCH_SIZE: usize = 2;

    /// 批次之间的静态延迟（毫秒），作为对提供商限流的简单背压
    pub const BATCH_DELAY_MS: u64 = 200;

    /// 单次网络调用超时（秒）
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;

    /// 缓存条目软上限，达到后 put 变为 no-op
    pub const CACHE_CAPACITY: usize = 5000;

    /// 每插入多少条触发一次落盘
    pub const CACHE_FLUSH_EVERY: u64 = 100;

    /// 缓存键中内容哈希的十六进制长度
    pub const CACHE_KEY_HASH_LEN: usize = 32;

    /// 默认缓存快照文件
    pub const DEFAULT_CACHE_FILE: &str = "cache/translations.json";

    // 腾讯云机器翻译接口
    pub const TMT_HOST: &str = "tmt.tencentcloudapi.com";
    pub const TMT_SERVICE: &str = "tmt";
    pub const TMT_VERSION: &str = "2018-03-21";
    pub const TMT_ACTION: &str = "TextTranslate";
    pub const DEFAULT_REGION: &str = "ap-beijing";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "translation-config.toml",
        ".translation-config.toml",
        "/etc/icebreak/translation.toml",
    ];
}

/// 提供商 API 凭证
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub secret_id: String,
    pub secret_key: String,
}

/// 翻译配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// 翻译功能总开关（环境变量 ENABLE_TRANSLATION=false 可关闭）
    pub enabled: bool,

    // 凭证（通常来自环境变量，不建议写进配置文件）
    pub secret_id: Option<String>,
    pub secret_key: Option<String>,
    pub region: String,

    // 分段与批次
    pub max_chunk_chars: usize,
    pub direct_threshold: usize,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub request_timeout_secs: u64,

    // 缓存
    pub cache_file: PathBuf,
    pub cache_capacity: usize,
    pub cache_flush_every: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret_id: None,
            secret_key: None,
            region: constants::DEFAULT_REGION.to_string(),
            max_chunk_chars: constants::MAX_CHUNK_CHARS,
            direct_threshold: constants::DIRECT_TRANSLATE_THRESHOLD,
            batch_size: constants::BATCH_SIZE,
            batch_delay_ms: constants::BATCH_DELAY_MS,
            request_timeout_secs: constants::REQUEST_TIMEOUT_SECS,
            cache_file: PathBuf::from(constants::DEFAULT_CACHE_FILE),
            cache_capacity: constants::CACHE_CAPACITY,
            cache_flush_every: constants::CACHE_FLUSH_EVERY,
        }
    }
}

impl TranslationConfig {
    /// 加载完整配置：.env 文件 → 配置文件 → 环境变量覆盖
    ///
    /// 原站点优先加载 `.env.local`，不存在时回退 `.env`，这里保持一致。
    pub fn load() -> Self {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();

        let mut config = constants::CONFIG_PATHS
            .iter()
            .find(|path| Path::new(path).exists())
            .and_then(|path| match Self::from_file(path) {
                Ok(config) => {
                    tracing::debug!("已加载配置文件: {}", path);
                    Some(config)
                }
                Err(e) => {
                    tracing::warn!("配置文件 {} 解析失败，使用默认配置: {}", path, e);
                    None
                }
            })
            .unwrap_or_default();

        config.apply_env_overrides();
        config
    }

    /// 从 TOML 文件读取配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> TranslationResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| TranslationError::Config(format!("读取配置文件失败: {e}")))?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("ENABLE_TRANSLATION") {
            self.enabled = env_flag_enabled(&value);
        }
        if let Ok(id) = std::env::var("TENCENT_SECRET_ID") {
            if !id.is_empty() {
                self.secret_id = Some(id);
            }
        }
        if let Ok(key) = std::env::var("TENCENT_SECRET_KEY") {
            if !key.is_empty() {
                self.secret_key = Some(key);
            }
        }
        if let Ok(region) = std::env::var("TENCENT_REGION") {
            if !region.is_empty() {
                self.region = region;
            }
        }
        if let Ok(path) = std::env::var("TRANSLATION_CACHE_FILE") {
            if !path.is_empty() {
                self.cache_file = PathBuf::from(path);
            }
        }
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.max_chunk_chars == 0 {
            return Err(TranslationError::Config("分段上限不能为0".to_string()));
        }
        if self.max_chunk_chars > constants::PROVIDER_MAX_CHARS {
            return Err(TranslationError::Config(format!(
                "分段上限 {} 超过提供商单次请求限制 {}",
                self.max_chunk_chars,
                constants::PROVIDER_MAX_CHARS
            )));
        }
        if self.batch_size == 0 {
            return Err(TranslationError::Config("批次大小不能为0".to_string()));
        }
        if self.cache_capacity == 0 {
            return Err(TranslationError::Config("缓存容量不能为0".to_string()));
        }
        Ok(())
    }

    /// 取出完整凭证；任一字段缺失即视为未配置
    pub fn credential(&self) -> Option<Credential> {
        match (&self.secret_id, &self.secret_key) {
            (Some(id), Some(key)) if !id.is_empty() && !key.is_empty() => Some(Credential {
                secret_id: id.clone(),
                secret_key: key.clone(),
            }),
            _ => None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

/// 解析开关类环境变量；常见的"假"写法都关闭，其余一律视为开启
fn env_flag_enabled(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_flag_falsy_spellings() {
        for falsy in ["false", "FALSE", "False", "0", "no", "off", " off "] {
            assert!(!env_flag_enabled(falsy), "{falsy:?} 应当关闭翻译");
        }
        for truthy in ["true", "1", "yes", "on", ""] {
            assert!(env_flag_enabled(truthy), "{truthy:?} 应当保持开启");
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = TranslationConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.credential().is_none());
        assert!(config.enabled);
    }

    #[test]
    fn test_credential_requires_both_fields() {
        let mut config = TranslationConfig::default();
        config.secret_id = Some("AKIDxxxx".to_string());
        assert!(config.credential().is_none());

        config.secret_key = Some("secret".to_string());
        let cred = config.credential().unwrap();
        assert_eq!(cred.secret_id, "AKIDxxxx");

        config.secret_key = Some(String::new());
        assert!(config.credential().is_none());
    }

    #[test]
    fn test_validate_rejects_oversized_chunks() {
        let mut config = TranslationConfig::default();
        config.max_chunk_chars = constants::PROVIDER_MAX_CHARS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let toml_str = r#"
            enabled = true
            region = "ap-guangzhou"
            max_chunk_chars = 1500
            batch_size = 3
        "#;
        let config: TranslationConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.region, "ap-guangzhou");
        assert_eq!(config.max_chunk_chars, 1500);
        assert_eq!(config.batch_size, 3);
        // 未出现的字段回落默认值
        assert_eq!(config.cache_capacity, constants::CACHE_CAPACITY);
    }
}
