//! 文件生命周期管理 - 业务能力层
//!
//! 三个操作互相独立，任一失败都不影响其余两个：
//! - 输入文件移动到 processed 区（先复制，再删除）
//! - 清理过期日志
//! - 清理过期的 processed 文件
//!
//! 时间比较全部使用 `DateTime<Utc>`。

use crate::config::Config;
use crate::error::StorageError;
use crate::storage::{join_key, ObjectStore};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

/// 需要定期清理的文件类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactClass {
    Logs,
    Processed,
}

/// 保留策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub class: ArtifactClass,
    pub max_age_days: u32,
}

impl RetentionPolicy {
    pub fn new(class: ArtifactClass, max_age_days: u32) -> Self {
        Self {
            class,
            max_age_days,
        }
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.max_age_days))
    }

    /// 严格早于 `now - max_age` 才算过期，恰好在边界上的保留
    pub fn is_expired(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        created_at < self.cutoff(now)
    }
}

/// 文件生命周期管理
pub struct LifecycleManager<'a> {
    store: &'a dyn ObjectStore,
    input_object: String,
    processed_prefix: String,
    logs_prefix: String,
    now: Option<DateTime<Utc>>,
}

impl<'a> LifecycleManager<'a> {
    pub fn new(store: &'a dyn ObjectStore, config: &Config) -> Self {
        Self {
            store,
            input_object: config.input_object.clone(),
            processed_prefix: config.processed_prefix.clone(),
            logs_prefix: config.logs_prefix.clone(),
            now: None,
        }
    }

    /// 固定"当前时间"
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    /// 输入文件在 processed 区的名字：`<stem>_<YYYYMMDD_HHMMSS><ext>`
    pub fn processed_key(&self, now: DateTime<Utc>) -> String {
        let file_name = self
            .input_object
            .rsplit('/')
            .next()
            .unwrap_or(self.input_object.as_str());
        let (stem, ext) = match file_name.rfind('.') {
            Some(pos) if pos > 0 => file_name.split_at(pos),
            _ => (file_name, ""),
        };
        let name = format!("{}_{}{}", stem, now.format("%Y%m%d_%H%M%S"), ext);
        join_key(&self.processed_prefix, &name)
    }

    /// 把输入文件移动到 processed 区
    ///
    /// 先复制再删除；复制失败时原文件保持不动。
    pub async fn move_input_to_processed(&self) -> Result<String, StorageError> {
        let target = self.processed_key(self.now());

        self.store.copy(&self.input_object, &target).await?;
        self.store.delete(&self.input_object).await?;

        info!("📦 输入文件已移动: {} → {}", self.input_object, target);
        Ok(target)
    }

    pub async fn cleanup_old_logs(&self, max_age_days: u32) -> Result<usize, StorageError> {
        self.sweep(RetentionPolicy::new(ArtifactClass::Logs, max_age_days))
            .await
    }

    pub async fn cleanup_old_processed(&self, max_age_days: u32) -> Result<usize, StorageError> {
        self.sweep(RetentionPolicy::new(ArtifactClass::Processed, max_age_days))
            .await
    }

    fn prefix_for(&self, class: ArtifactClass) -> String {
        let prefix = match class {
            ArtifactClass::Logs => &self.logs_prefix,
            ArtifactClass::Processed => &self.processed_prefix,
        };
        format!("{}/", prefix.trim_matches('/'))
    }

    /// 按策略清理，返回删除数量
    ///
    /// 列表失败直接返回错误；单个文件读取时间或删除失败只记录警告并继续。
    async fn sweep(&self, policy: RetentionPolicy) -> Result<usize, StorageError> {
        let now = self.now();
        let prefix = self.prefix_for(policy.class);
        let keys = self.store.list(&prefix).await?;
        let mut deleted = 0;

        for key in keys {
            let created_at = match self.store.created_at(&key).await {
                Ok(t) => t,
                Err(e) => {
                    warn!("⚠️ 无法读取创建时间 {}: {}", key, e);
                    continue;
                }
            };

            if !policy.is_expired(created_at, now) {
                continue;
            }

            match self.store.delete(&key).await {
                Ok(()) => {
                    debug!("🗑️ 删除过期文件: {} (创建于 {})", key, created_at);
                    deleted += 1;
                }
                Err(e) => warn!("⚠️ 删除过期文件失败 {}: {}", key, e),
            }
        }

        info!(
            "🧹 {:?} 清理完成: 删除 {} 个超过 {} 天的文件",
            policy.class, deleted, policy.max_age_days
        );
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 10, 12, 0, 0).unwrap()
    }

    fn config() -> Config {
        Config {
            input_object: "avm_input/portfolio.json".to_string(),
            processed_prefix: "avm_processed".to_string(),
            logs_prefix: "avm_logs".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_boundary_is_retained() {
        let policy = RetentionPolicy::new(ArtifactClass::Logs, 7);
        let boundary = now() - Duration::days(7);

        assert!(!policy.is_expired(boundary, now()));
        assert!(policy.is_expired(boundary - Duration::seconds(1), now()));
        assert!(!policy.is_expired(boundary + Duration::seconds(1), now()));
    }

    #[test]
    fn test_processed_key_keeps_extension() {
        let store = MemoryObjectStore::new();
        let manager = LifecycleManager::new(&store, &config());
        assert_eq!(
            manager.processed_key(now()),
            "avm_processed/portfolio_20250910_120000.json"
        );

        let no_ext = Config {
            input_object: "addresses".to_string(),
            ..config()
        };
        let manager = LifecycleManager::new(&store, &no_ext);
        assert_eq!(
            manager.processed_key(now()),
            "avm_processed/addresses_20250910_120000"
        );
    }

    #[tokio::test]
    async fn test_cleanup_logs_deletes_only_strictly_older() {
        let store = MemoryObjectStore::new();
        let boundary = now() - Duration::days(7);
        store.insert_with_created_at("avm_logs/old.log", "", boundary - Duration::seconds(1));
        store.insert_with_created_at("avm_logs/edge.log", "", boundary);
        store.insert_with_created_at("avm_logs/new.log", "", now());
        store.insert_with_created_at("avm_processed/old.json", "", boundary - Duration::days(30));

        let manager = LifecycleManager::new(&store, &config()).with_now(now());
        let deleted = manager.cleanup_old_logs(7).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(!store.contains("avm_logs/old.log"));
        assert!(store.contains("avm_logs/edge.log"));
        assert!(store.contains("avm_logs/new.log"));
        assert!(store.contains("avm_processed/old.json"));
    }

    #[tokio::test]
    async fn test_cleanup_processed_uses_own_threshold() {
        let store = MemoryObjectStore::new();
        store.insert_with_created_at("avm_processed/a.json", "", now() - Duration::days(101));
        store.insert_with_created_at("avm_processed/b.json", "", now() - Duration::days(50));

        let manager = LifecycleManager::new(&store, &config()).with_now(now());
        assert_eq!(manager.cleanup_old_processed(100).await.unwrap(), 1);
        assert!(store.contains("avm_processed/b.json"));
    }

    #[tokio::test]
    async fn test_one_failed_delete_does_not_stop_sweep() {
        let store = MemoryObjectStore::new();
        let old = now() - Duration::days(30);
        store.insert_with_created_at("avm_logs/a.log", "", old);
        store.insert_with_created_at("avm_logs/b.log", "", old);
        store.fail_writes_matching("a.log");

        let manager = LifecycleManager::new(&store, &config()).with_now(now());
        assert_eq!(manager.cleanup_old_logs(7).await.unwrap(), 1);
        assert!(store.contains("avm_logs/a.log"));
        assert!(!store.contains("avm_logs/b.log"));
    }

    #[tokio::test]
    async fn test_move_is_copy_then_delete() {
        let store = MemoryObjectStore::new();
        store.insert_with_created_at("avm_input/portfolio.json", "[]", now());

        let manager = LifecycleManager::new(&store, &config()).with_now(now());
        let target = manager.move_input_to_processed().await.unwrap();

        assert_eq!(target, "avm_processed/portfolio_20250910_120000.json");
        assert!(!store.contains("avm_input/portfolio.json"));
        assert_eq!(store.download_text(&target).await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_failed_copy_keeps_original() {
        let store = MemoryObjectStore::new();
        store.insert_with_created_at("avm_input/portfolio.json", "[]", now());
        store.fail_writes_matching("avm_processed/");

        let manager = LifecycleManager::new(&store, &config()).with_now(now());
        assert!(manager.move_input_to_processed().await.is_err());
        assert!(store.contains("avm_input/portfolio.json"));
    }
}
