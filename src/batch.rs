//! 批次编排
//!
//! 驱动整篇（可能多分段）文档的翻译：整文缓存查询 → 分段 → 有界并发
//! 分批下发 → 按原始顺序重组 → 整文缓存写回。
//!
//! 限流策略刻意保持简单：固定批次大小加固定批间延迟，作为静态背压，
//! 没有自适应反馈也没有指数退避。单个分段失败只影响该分段（降级为
//! 该分段的原文），不会让整篇文档失败，也不会取消同批在途的兄弟分段。

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::cache::{cache_key, TranslationCache};
use crate::client::TranslationClient;
use crate::config::TranslationConfig;
use crate::lang::TargetLang;
use crate::segment::{reassemble, segment};

/// 整篇翻译的结果
#[derive(Debug, Clone)]
pub struct LongTextOutcome {
    pub text: String,
    /// 是否至少有一个分段（或整文直译）拿到了真实译文
    pub translated: bool,
}

/// 批次编排器
pub struct BatchOrchestrator {
    client: Arc<TranslationClient>,
    cache: Arc<TranslationCache>,
    direct_threshold: usize,
    max_chunk_chars: usize,
    batch_size: usize,
    batch_delay: Duration,
}

impl BatchOrchestrator {
    pub fn new(
        client: Arc<TranslationClient>,
        cache: Arc<TranslationCache>,
        config: &TranslationConfig,
    ) -> Self {
        Self {
            client,
            cache,
            direct_threshold: config.direct_threshold,
            max_chunk_chars: config.max_chunk_chars,
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay(),
        }
    }

    /// 翻译整篇文本；与 `TranslationClient::translate` 同样永不报错
    ///
    /// 字节相同的重复输入在整文缓存处短路，不再分段也不再发起网络请求。
    pub async fn translate_long(&self, text: &str, lang: TargetLang) -> String {
        self.translate_long_with_status(text, lang).await.text
    }

    /// 同 `translate_long`，额外报告是否产生了真实译文
    ///
    /// 成功与否按分段逐一判定：某个分段的结果与该分段的原文不同才算
    /// 译文。不能拿整文结果和原始输入比较，分段会修剪段落空白，
    /// 全部分段失败时重组结果照样和原始输入不相等。
    pub async fn translate_long_with_status(&self, text: &str, lang: TargetLang) -> LongTextOutcome {
        if text.trim().is_empty() {
            return LongTextOutcome {
                text: text.to_string(),
                translated: false,
            };
        }

        let whole_key = cache_key(text, lang);
        if let Some(cached) = self.cache.get(&whole_key) {
            tracing::debug!("整文缓存命中，跳过分段与下发");
            let translated = cached != text;
            return LongTextOutcome {
                text: cached,
                translated,
            };
        }

        let char_count = text.chars().count();
        if char_count < self.direct_threshold {
            // 短文本直接整体翻译；client 内部用同一个键写缓存，
            // 失败或原样透传时返回值与输入逐字节相同
            let result = self.client.translate(text, lang).await;
            let translated = result != text;
            return LongTextOutcome {
                text: result,
                translated,
            };
        }

        tracing::debug!("长文本（{} 字符）进入分段翻译", char_count);
        let chunks = segment(text, self.max_chunk_chars);
        let total_batches = chunks.len().div_ceil(self.batch_size);

        let mut pieces = Vec::with_capacity(chunks.len());
        for (batch_index, batch) in chunks.chunks(self.batch_size).enumerate() {
            // 批内并发、批间延迟；失败的分段由 client 降级为原文
            let futures = batch.iter().map(|chunk| async {
                if chunk.text.is_empty() {
                    String::new()
                } else {
                    self.client.translate(&chunk.text, lang).await
                }
            });
            let results = join_all(futures).await;
            pieces.extend(batch.iter().cloned().zip(results));

            if batch_index + 1 < total_batches {
                sleep(self.batch_delay).await;
            }
        }

        let translated = pieces
            .iter()
            .any(|(chunk, piece)| !chunk.text.is_empty() && !piece.is_empty() && piece != &chunk.text);
        let result = reassemble(pieces);
        // 没有任何分段产生译文时不写整文缓存，给后续调用留下重试机会
        if translated {
            self.cache.put(&whole_key, &result);
        }
        tracing::debug!(
            "分段翻译完成：{} 个分段，{} 个批次，结果 {} 字符",
            chunks.len(),
            total_batches,
            result.chars().count()
        );
        LongTextOutcome {
            text: result,
            translated,
        }
    }

    /// 后台翻译：立即返回句柄，调用方先用原文渲染页面
    ///
    /// 结果写入缓存后，客户端可通过按需接口或 `peek` 异步取回。
    pub fn spawn_background(
        self: &Arc<Self>,
        text: String,
        lang: TargetLang,
    ) -> JoinHandle<String> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let started = Instant::now();
            tracing::info!("后台翻译启动：{} 字符，目标 {}", text.chars().count(), lang);
            let result = this.translate_long(&text, lang).await;
            tracing::info!("后台翻译完成，耗时 {:?}", started.elapsed());
            result
        })
    }

    /// 只查缓存，不触发任何翻译；供"先渲染后取译文"的轮询路径使用
    pub fn peek(&self, text: &str, lang: TargetLang) -> Option<String> {
        self.cache.get(&cache_key(text, lang))
    }
}
