//! 翻译结果缓存
//!
//! 以内容哈希为键的进程级缓存，带软容量上限和全量快照持久化。
//!
//! 设计取舍：达到容量后 `put` 直接变为 no-op，不做淘汰。缓存条目重算
//! 成本低、工作负载以追加为主，省掉淘汰策略换取实现简单。并发写同一个
//! 键是安全的：键值映射是 (文本, 语言) 的确定函数，先写者生效，
//! 竞争方最多浪费一次重复计算。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use sha2::{Digest, Sha256};

use crate::config::constants;
use crate::error::{TranslationError, TranslationResult};
use crate::lang::TargetLang;

/// 生成缓存键：全文 SHA-256 截断 + 语言标签
///
/// 纯函数，无时间戳无随机数，相同 (文本, 语言) 永远得到相同的键。
/// 哈希覆盖全文而非前缀，避免共享前缀的长文档撞键。
pub fn cache_key(text: &str, lang: TargetLang) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest
        .iter()
        .take(constants::CACHE_KEY_HASH_LEN / 2)
        .map(|b| format!("{b:02x}"))
        .collect();
    format!("{}_{}", hex, lang.tag())
}

/// 缓存命中统计
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let total = hits + self.misses.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// 翻译缓存
///
/// 进程生命周期状态：启动时尽力从快照加载（缺失或损坏不致命），
/// 周期性落盘，退出时由 `Drop` 兜底最后一次 flush。
/// 不实现 `Clone`，共享时包在 `Arc` 中。
pub struct TranslationCache {
    entries: RwLock<HashMap<String, String>>,
    capacity: usize,
    flush_every: u64,
    path: PathBuf,
    inserts: AtomicU64,
    dirty: AtomicBool,
    stats: CacheStats,
}

impl TranslationCache {
    /// 创建缓存并尽力从快照加载
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize, flush_every: u64) -> Self {
        let cache = Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
            flush_every: flush_every.max(1),
            path: path.as_ref().to_path_buf(),
            inserts: AtomicU64::new(0),
            dirty: AtomicBool::new(false),
            stats: CacheStats::default(),
        };
        cache.load_from_storage();
        cache
    }

    /// 使用默认参数创建（快照路径来自配置常量）
    pub fn with_defaults() -> Self {
        Self::open(
            constants::DEFAULT_CACHE_FILE,
            constants::CACHE_CAPACITY,
            constants::CACHE_FLUSH_EVERY,
        )
    }

    /// 查询缓存
    pub fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().expect("缓存读锁");
        match entries.get(key) {
            Some(value) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(value.clone())
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// 写入缓存；达到容量上限后静默丢弃
    ///
    /// 已存在的键不会被覆盖：相同输入的翻译视为确定的，先写者生效。
    pub fn put(&self, key: &str, value: &str) {
        {
            let mut entries = self.entries.write().expect("缓存写锁");
            if entries.len() >= self.capacity && !entries.contains_key(key) {
                tracing::debug!("缓存已达容量上限 {}，丢弃新条目", self.capacity);
                return;
            }
            entries
                .entry(key.to_string())
                .or_insert_with(|| value.to_string());
        }

        self.dirty.store(true, Ordering::Release);
        let inserted = self.inserts.fetch_add(1, Ordering::Relaxed) + 1;
        if inserted % self.flush_every == 0 {
            self.flush_periodic();
        }
    }

    /// 周期性落盘
    ///
    /// 在异步运行时里把文件 IO 丢给阻塞线程池，不占用异步工作线程；
    /// 脏标记留给关闭路径处理，落盘失败时不会丢掉最终快照。
    fn flush_periodic(&self) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let serialized = match self.serialize_entries() {
                    Ok(serialized) => serialized,
                    Err(e) => {
                        e.log("周期性缓存落盘失败");
                        return;
                    }
                };
                let path = self.path.clone();
                handle.spawn_blocking(move || {
                    if let Err(e) = persist_snapshot(&path, serialized) {
                        e.log("周期性缓存落盘失败");
                    }
                });
            }
            Err(_) => {
                if let Err(e) = self.flush_to_storage() {
                    e.log("周期性缓存落盘失败");
                }
            }
        }
    }

    /// 当前条目数
    pub fn size(&self) -> usize {
        self.entries.read().expect("缓存读锁").len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// 从快照文件加载；缺失或损坏时记录日志并保持空缓存，绝不报错
    pub fn load_from_storage(&self) -> usize {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("缓存快照不存在: {}", self.path.display());
                return 0;
            }
            Err(e) => {
                tracing::warn!("读取缓存快照失败，使用空缓存: {}", e);
                return 0;
            }
        };

        let snapshot: HashMap<String, String> = match serde_json::from_str(&data) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("缓存快照损坏，使用空缓存: {}", e);
                return 0;
            }
        };

        let loaded = snapshot.len();
        let mut entries = self.entries.write().expect("缓存写锁");
        *entries = snapshot;
        tracing::info!("已从快照加载 {} 条翻译缓存", loaded);
        loaded
    }

    /// 全量快照落盘
    ///
    /// 同步执行，供关闭路径和无运行时环境使用。
    pub fn flush_to_storage(&self) -> TranslationResult<()> {
        let serialized = self.serialize_entries()?;
        persist_snapshot(&self.path, serialized)?;

        self.dirty.store(false, Ordering::Release);
        tracing::debug!("缓存快照已落盘: {}", self.path.display());
        Ok(())
    }

    fn serialize_entries(&self) -> TranslationResult<String> {
        let entries = self.entries.read().expect("缓存读锁");
        serde_json::to_string_pretty(&*entries)
            .map_err(|e| TranslationError::CacheStorage(format!("序列化缓存失败: {e}")))
    }

    /// 是否有未落盘的修改
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}

/// 先写临时文件再原子改名，写入中断时旧快照保持完整
fn persist_snapshot(path: &Path, serialized: String) -> TranslationResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, serialized)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

impl Drop for TranslationCache {
    fn drop(&mut self) {
        if self.is_dirty() {
            if let Err(e) = self.flush_to_storage() {
                e.log("退出时缓存落盘失败");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_cache(capacity: usize, flush_every: u64) -> (TempDir, TranslationCache) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("translations.json");
        let cache = TranslationCache::open(&path, capacity, flush_every);
        (dir, cache)
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        let a = cache_key("Hello world", TargetLang::ZhCn);
        let b = cache_key("Hello world", TargetLang::ZhCn);
        assert_eq!(a, b);
        assert!(a.ends_with("_zh-CN"));
    }

    #[test]
    fn test_cache_key_distinguishes_lang_and_text() {
        let zh = cache_key("Hello", TargetLang::ZhCn);
        let en = cache_key("Hello", TargetLang::En);
        assert_ne!(zh, en);
        assert_ne!(
            cache_key("Hello", TargetLang::ZhCn),
            cache_key("hello", TargetLang::ZhCn)
        );
    }

    #[test]
    fn test_cache_key_hashes_whole_content() {
        // 共享 500 字符前缀的两篇长文不能撞键
        let prefix = "p".repeat(600);
        let a = format!("{prefix} alpha ending");
        let b = format!("{prefix} beta ending");
        assert_ne!(
            cache_key(&a, TargetLang::ZhCn),
            cache_key(&b, TargetLang::ZhCn)
        );
    }

    #[test]
    fn test_basic_get_put() {
        let (_dir, cache) = temp_cache(100, 1000);
        assert_eq!(cache.get("k"), None);
        cache.put("k", "你好");
        assert_eq!(cache.get("k"), Some("你好".to_string()));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_first_writer_wins() {
        let (_dir, cache) = temp_cache(100, 1000);
        cache.put("k", "first");
        cache.put("k", "second");
        assert_eq!(cache.get("k"), Some("first".to_string()));
    }

    #[test]
    fn test_capacity_cap_is_noop_not_error() {
        let (_dir, cache) = temp_cache(3, 1000);
        for i in 0..10 {
            cache.put(&format!("key-{i}"), "v");
        }
        assert_eq!(cache.size(), 3);
        // 已有键在满容量下仍可命中
        assert_eq!(cache.get("key-0"), Some("v".to_string()));
        assert_eq!(cache.get("key-9"), None);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("translations.json");

        {
            let cache = TranslationCache::open(&path, 100, 1000);
            cache.put("a", "甲");
            cache.put("b", "乙");
            cache.flush_to_storage().unwrap();
        }

        let reloaded = TranslationCache::open(&path, 100, 1000);
        assert_eq!(reloaded.size(), 2);
        assert_eq!(reloaded.get("a"), Some("甲".to_string()));
        assert_eq!(reloaded.get("b"), Some("乙".to_string()));
    }

    #[test]
    fn test_corrupt_snapshot_yields_empty_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("translations.json");
        std::fs::write(&path, "{ not valid json !!").unwrap();

        let cache = TranslationCache::open(&path, 100, 1000);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_periodic_flush_every_nth_insert() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("translations.json");
        let cache = TranslationCache::open(&path, 100, 2);

        cache.put("a", "1");
        assert!(!path.exists());
        cache.put("b", "2");
        assert!(path.exists());

        let snapshot: HashMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn test_periodic_flush_lands_inside_async_runtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("translations.json");
        let cache = TranslationCache::open(&path, 100, 1);

        // 运行时内周期性落盘走阻塞线程池，写入是异步完成的
        cache.put("a", "甲");
        for _ in 0..100 {
            if path.exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let snapshot: HashMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(snapshot.get("a").map(String::as_str), Some("甲"));
    }

    #[test]
    fn test_drop_flushes_dirty_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("translations.json");

        {
            let cache = TranslationCache::open(&path, 100, 1000);
            cache.put("a", "甲");
            assert!(cache.is_dirty());
        }

        assert!(path.exists());
        let reloaded = TranslationCache::open(&path, 100, 1000);
        assert_eq!(reloaded.get("a"), Some("甲".to_string()));
    }

    #[test]
    fn test_hit_rate_stats() {
        let (_dir, cache) = temp_cache(100, 1000);
        cache.put("k", "v");
        cache.get("k");
        cache.get("missing");
        assert_eq!(cache.stats().hit_rate(), 0.5);
    }
}
