//! 集成测试共用设施：可脚本化的假提供商与临时缓存服务装配

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

use icebreak_translation::provider::async_trait;
use icebreak_translation::{
    Provider, TargetLang, TranslationConfig, TranslationError, TranslationResult,
    TranslationService,
};

/// 假提供商的行为脚本
#[derive(Clone)]
pub enum MockBehavior {
    /// 给每段文本加可识别前缀，便于断言
    Prefix,
    /// 固定返回某个分类错误
    Fail(TranslationError),
    /// 文本包含标记时失败，其余正常翻译
    FailOnMarker(&'static str),
    /// 任何调用都 panic：用于断言某条路径完全不触网
    Unreachable,
}

pub struct MockProvider {
    calls: AtomicUsize,
    behavior: MockBehavior,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            behavior,
        })
    }

    /// 提供商被实际调用的次数（即网络请求数）
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn translate(&self, text: &str, _lang: TargetLang) -> TranslationResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockBehavior::Prefix => Ok(format!("译[{text}]")),
            MockBehavior::Fail(e) => Err(e.clone()),
            MockBehavior::FailOnMarker(marker) => {
                if text.contains(marker) {
                    Err(TranslationError::Transient("脚本化失败".to_string()))
                } else {
                    Ok(format!("译[{text}]"))
                }
            }
            MockBehavior::Unreachable => panic!("不应发起网络请求: {text:?}"),
        }
    }
}

/// 面向分段路径的测试配置：阈值调小，避免构造超长文本
pub fn test_config(dir: &TempDir) -> TranslationConfig {
    let mut config = TranslationConfig::default();
    config.cache_file = dir.path().join("translations.json");
    config.direct_threshold = 50;
    config.max_chunk_chars = 40;
    config.batch_size = 2;
    config.batch_delay_ms = 1;
    config
}

/// 用假提供商装配一个落在临时目录的服务
pub fn test_service(dir: &TempDir, provider: Option<Arc<MockProvider>>) -> TranslationService {
    let provider = provider.map(|p| p as Arc<dyn Provider>);
    TranslationService::with_provider(test_config(dir), provider)
}
