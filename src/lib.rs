//! 游戏站点详情文本的机器翻译管道
//!
//! 页面渲染层把未翻译的详情文本交给本库，本库负责：
//! - **signer**: 提供商请求的 TC3-HMAC-SHA256 多级签名
//! - **segment**: 长文本按段落/句子切成提供商可接受的分段
//! - **cache**: 内容哈希寻址的翻译缓存，周期性快照落盘
//! - **provider**: 提供商能力接口与腾讯云实现
//! - **client**: 单次翻译调用，吸收一切失败并降级为原文
//! - **batch**: 有界并发的批次编排与顺序重组
//! - **service**: 带生命周期的装配门面
//!
//! 核心不变式：翻译对页面是纯增量的。任何失败（凭证缺失、签名被拒、
//! 服务未开通、超时、响应异常）都降级为原文，绝不阻塞或破坏页面交付。
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use icebreak_translation::{TargetLang, TranslationConfig, TranslationService};
//!
//! # async fn example() {
//! let service = TranslationService::new(TranslationConfig::load()).expect("配置无效");
//!
//! // 阻塞路径：拿到译文（或降级的原文）再渲染
//! let detail = service.translate_long("Play this game...", TargetLang::ZhCn).await;
//!
//! // 非阻塞路径：先用原文渲染，后台翻译完成后客户端异步取回
//! service.spawn_background("Play this game...".to_string(), TargetLang::ZhCn);
//! service.shutdown();
//! # }
//! ```

pub mod batch;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod lang;
pub mod provider;
pub mod segment;
pub mod service;
pub mod signer;

pub use batch::{BatchOrchestrator, LongTextOutcome};
pub use cache::{cache_key, TranslationCache};
pub use client::TranslationClient;
pub use config::{Credential, TranslationConfig};
pub use error::{ErrorSeverity, TranslationError, TranslationResult};
pub use lang::TargetLang;
pub use provider::{Provider, TencentProvider};
pub use segment::{segment, Chunk};
pub use service::{OnDemandOutcome, TranslationService};
pub use signer::{RequestSigner, SignedRequestContext};
