//! 翻译客户端
//!
//! 对上层的契约只有一条：`translate` 永远返回一个字符串，永远不抛错。
//! 提供商和网络的一切失败都在这一层被吸收并降级为原文，页面渲染
//! 绝不因第三方依赖而阻塞或报错。
//!
//! 本层不做重试。认证失败在配置修复前每次都会同样失败；临时错误
//! 留给调用方或后台任务决定是否再来一次，保持这层的副作用可预测。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{cache_key, TranslationCache};
use crate::config::constants;
use crate::lang::TargetLang;
use crate::provider::Provider;

/// 客户端调用统计
#[derive(Debug, Default)]
pub struct ClientStats {
    pub requests_sent: AtomicU64,
    pub failures: AtomicU64,
}

/// 翻译客户端
///
/// 凭证未配置时 `provider` 为 `None`，所有调用直接短路返回原文，
/// 不产生任何网络流量。
pub struct TranslationClient {
    provider: Option<Arc<dyn Provider>>,
    cache: Arc<TranslationCache>,
    max_request_chars: usize,
    stats: ClientStats,
}

impl TranslationClient {
    pub fn new(provider: Option<Arc<dyn Provider>>, cache: Arc<TranslationCache>) -> Self {
        Self {
            provider,
            cache,
            max_request_chars: constants::PROVIDER_MAX_CHARS,
            stats: ClientStats::default(),
        }
    }

    /// 是否配置了可用的提供商
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }

    /// 翻译一段文本；任何失败都降级为返回原文
    pub async fn translate(&self, text: &str, lang: TargetLang) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        let provider = match &self.provider {
            Some(provider) => provider,
            None => {
                tracing::debug!("翻译未配置，返回原文");
                return text.to_string();
            }
        };

        let key = cache_key(text, lang);
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!("命中翻译缓存: {}", key);
            return cached;
        }

        // 上层应当已经分段；走到这里说明编排有缺陷，截断保底并留下线索
        let char_count = text.chars().count();
        let request_text = if char_count > self.max_request_chars {
            tracing::warn!(
                "文本长度 {} 超过提供商单次上限 {}，已截断（上游分段缺失？）",
                char_count,
                self.max_request_chars
            );
            text.chars().take(self.max_request_chars).collect()
        } else {
            text.to_string()
        };

        let started = Instant::now();
        self.stats.requests_sent.fetch_add(1, Ordering::Relaxed);

        match provider.translate(&request_text, lang).await {
            Ok(translated) => {
                if translated.trim().is_empty() {
                    // 非空输入绝不返回空串
                    tracing::warn!("提供商返回空译文，降级为原文");
                    self.stats.failures.fetch_add(1, Ordering::Relaxed);
                    return text.to_string();
                }
                if translated == request_text {
                    // 可能是服务未开通时的静默透传，仅记录用于观测
                    tracing::info!("译文与原文相同（{} 字符）", char_count);
                }
                tracing::debug!(
                    "翻译成功，{} 字符，耗时 {:?}",
                    char_count,
                    started.elapsed()
                );
                self.cache.put(&key, &translated);
                translated
            }
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                e.log(&format!(
                    "翻译调用失败（{} 字符，耗时 {:?}），返回原文",
                    char_count,
                    started.elapsed()
                ));
                text.to_string()
            }
        }
    }
}
