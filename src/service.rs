//! 翻译服务门面
//!
//! 把缓存、客户端和批次编排器装配成一个带生命周期的服务对象：
//! 进程启动时构造（缓存从快照加载），注入到需要翻译的调用方，
//! 关闭时显式 `shutdown` 落盘；`Drop` 作为异常退出路径的兜底。
//!
//! 凭证缺失或翻译被禁用时服务照常构造，只是所有调用都返回原文。

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::batch::BatchOrchestrator;
use crate::cache::TranslationCache;
use crate::client::TranslationClient;
use crate::config::TranslationConfig;
use crate::error::TranslationResult;
use crate::lang::TargetLang;
use crate::provider::{Provider, TencentProvider};

/// 按需翻译接口的响应
///
/// 与站点的异步取回端点约定一致：`translated` 为真时 `detail` 是译文，
/// 否则 `detail` 是原文（翻译未完成、被禁用或失败）。
#[derive(Debug, Clone, Serialize)]
pub struct OnDemandOutcome {
    pub translated: bool,
    pub detail: String,
}

/// 翻译服务
pub struct TranslationService {
    config: TranslationConfig,
    cache: Arc<TranslationCache>,
    client: Arc<TranslationClient>,
    orchestrator: Arc<BatchOrchestrator>,
}

impl TranslationService {
    /// 根据配置装配服务
    ///
    /// 凭证齐全且翻译启用时创建腾讯云提供商，否则以未配置模式运行。
    pub fn new(config: TranslationConfig) -> TranslationResult<Self> {
        config.validate()?;

        let provider: Option<Arc<dyn Provider>> = if !config.enabled {
            tracing::info!("翻译功能已禁用（ENABLE_TRANSLATION=false）");
            None
        } else {
            match config.credential() {
                Some(credential) => {
                    tracing::info!(
                        "腾讯云翻译已配置（SecretId: {}...，地域: {}）",
                        &credential.secret_id.chars().take(8).collect::<String>(),
                        config.region
                    );
                    Some(Arc::new(TencentProvider::new(
                        credential,
                        &config.region,
                        config.request_timeout(),
                    )?))
                }
                None => {
                    tracing::warn!(
                        "腾讯云凭证未配置，翻译降级为原文透传。\
                         请设置 TENCENT_SECRET_ID 和 TENCENT_SECRET_KEY"
                    );
                    None
                }
            }
        };

        Ok(Self::with_provider(config, provider))
    }

    /// 使用外部注入的提供商装配服务（测试与扩展入口）
    pub fn with_provider(config: TranslationConfig, provider: Option<Arc<dyn Provider>>) -> Self {
        let cache = Arc::new(TranslationCache::open(
            &config.cache_file,
            config.cache_capacity,
            config.cache_flush_every,
        ));
        let client = Arc::new(TranslationClient::new(provider, Arc::clone(&cache)));
        let orchestrator = Arc::new(BatchOrchestrator::new(
            Arc::clone(&client),
            Arc::clone(&cache),
            &config,
        ));

        Self {
            config,
            cache,
            client,
            orchestrator,
        }
    }

    /// 是否具备发起真实翻译的条件
    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    /// 翻译单段文本（直接走客户端，不分段）
    pub async fn translate(&self, text: &str, lang: TargetLang) -> String {
        self.client.translate(text, lang).await
    }

    /// 翻译整篇文本（分段、批次并发、顺序重组）
    pub async fn translate_long(&self, text: &str, lang: TargetLang) -> String {
        self.orchestrator.translate_long(text, lang).await
    }

    /// 按需翻译：供异步取回端点使用
    ///
    /// 未配置、全部失败或翻译是无操作时返回 `translated: false` 与原文。
    /// 判定依据编排器的结构化成功标记，而非整文与输入的字符串比较。
    pub async fn on_demand(&self, text: &str, lang: TargetLang) -> OnDemandOutcome {
        if !self.is_configured() {
            return OnDemandOutcome {
                translated: false,
                detail: text.to_string(),
            };
        }

        let outcome = self.orchestrator.translate_long_with_status(text, lang).await;
        if outcome.translated {
            OnDemandOutcome {
                translated: true,
                detail: outcome.text,
            }
        } else {
            OnDemandOutcome {
                translated: false,
                detail: text.to_string(),
            }
        }
    }

    /// 后台翻译：立即返回，页面先用原文渲染
    pub fn spawn_background(&self, text: String, lang: TargetLang) -> JoinHandle<String> {
        self.orchestrator.spawn_background(text, lang)
    }

    /// 只查缓存的轮询接口
    pub fn peek(&self, text: &str, lang: TargetLang) -> Option<String> {
        self.orchestrator.peek(text, lang)
    }

    pub fn cache(&self) -> &Arc<TranslationCache> {
        &self.cache
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 优雅关闭：落盘缓存
    ///
    /// 信号驱动的退出路径也应调用；即使漏掉，缓存自身的 `Drop` 兜底。
    pub fn shutdown(&self) {
        if let Err(e) = self.cache.flush_to_storage() {
            e.log("关闭时缓存落盘失败");
        } else {
            tracing::info!("翻译缓存已落盘（{} 条）", self.cache.size());
        }
    }
}
