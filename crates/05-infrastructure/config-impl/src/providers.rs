//! 远程配置源实现
//!
//! - [`StaticConfigSource`] - 内存配置源，由调用方主动发布新文档
//! - [`FileConfigSource`] - 文件配置源，文件变化时推送文件内容

use crate::watcher::ConfigFileWatcher;
use async_trait::async_trait;
use config_abstractions::{
    ConfigPush, ConfigPushHandler, DocumentFormat, ReloadReport, RemoteConfigSource,
};
use infrastructure_common::{ConfigError, RefreshError};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

type Watchers = Arc<RwLock<Vec<Arc<dyn ConfigPushHandler>>>>;

/// 依次通知所有监听器
async fn dispatch(watchers: &Watchers, push: ConfigPush) -> Vec<Result<ReloadReport, RefreshError>> {
    let handlers: Vec<Arc<dyn ConfigPushHandler>> = watchers.read().clone();
    let mut results = Vec::with_capacity(handlers.len());
    for handler in handlers {
        results.push(handler.on_config_push(push.clone()).await);
    }
    results
}

/// 内存配置源
///
/// 监听器与配置源同生命周期，不支持注销
pub struct StaticConfigSource {
    current: RwLock<ConfigPush>,
    watchers: Watchers,
}

impl std::fmt::Debug for StaticConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticConfigSource")
            .field("data_id", &self.current.read().data_id)
            .field("watchers", &self.watchers.read().len())
            .finish()
    }
}

impl StaticConfigSource {
    /// 创建新的内存配置源
    pub fn new(initial: ConfigPush) -> Self {
        Self {
            current: RwLock::new(initial),
            watchers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// 创建 YAML 内存配置源
    pub fn yaml(data_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(ConfigPush::yaml(data_id, content))
    }

    /// 发布新文档并通知所有监听器
    pub async fn publish(&self, content: impl Into<String>) -> Vec<Result<ReloadReport, RefreshError>> {
        let push = {
            let mut current = self.current.write();
            current.content = content.into();
            current.clone()
        };
        info!("发布配置: {}", push.data_id);
        dispatch(&self.watchers, push).await
    }

    /// 已注册的监听器数量
    pub fn watcher_count(&self) -> usize {
        self.watchers.read().len()
    }
}

#[async_trait]
impl RemoteConfigSource for StaticConfigSource {
    async fn get_config(&self) -> Result<ConfigPush, ConfigError> {
        Ok(self.current.read().clone())
    }

    async fn add_watcher(&self, handler: Arc<dyn ConfigPushHandler>) -> Result<(), ConfigError> {
        self.watchers.write().push(handler);
        Ok(())
    }

    fn name(&self) -> &str {
        "StaticConfigSource"
    }
}

/// 文件配置源
///
/// 首个监听器注册时启动文件监控，之后每次文件变化都推送完整文件内容。
/// 监听器与配置源同生命周期，不支持注销
pub struct FileConfigSource {
    path: PathBuf,
    format: DocumentFormat,
    debounce_delay: Duration,
    watchers: Watchers,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for FileConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigSource")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("debounce_delay", &self.debounce_delay)
            .field("watching", &self.is_watching())
            .finish()
    }
}

impl FileConfigSource {
    /// 创建新的文件配置源，格式由扩展名决定
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let format = DocumentFormat::from_path(&path)?;
        Ok(Self {
            path,
            format,
            debounce_delay: Duration::from_millis(200),
            watchers: Arc::new(RwLock::new(Vec::new())),
            task: Mutex::new(None),
        })
    }

    /// 设置防抖延迟
    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    /// 是否正在监控
    pub fn is_watching(&self) -> bool {
        self.task.lock().is_some()
    }

    /// 停止监控
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            info!("停止监控配置文件: {}", self.path.display());
        }
    }

    fn data_id(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    async fn read(path: &Path, data_id: String, format: DocumentFormat) -> Result<ConfigPush, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(ConfigPush::new(data_id, content, format))
    }

    fn start_watching(&self) -> Result<(), ConfigError> {
        let mut task = self.task.lock();
        if task.is_some() {
            return Ok(());
        }

        let mut watcher = ConfigFileWatcher::start(&self.path, self.debounce_delay)?;
        let watchers = self.watchers.clone();
        let path = self.path.clone();
        let data_id = self.data_id();
        let format = self.format;

        *task = Some(tokio::spawn(async move {
            while watcher.next_change().await.is_some() {
                match Self::read(&path, data_id.clone(), format).await {
                    Ok(push) => {
                        for result in dispatch(&watchers, push).await {
                            if let Err(e) = result {
                                warn!("配置文件推送未生效: {}", e);
                            }
                        }
                    }
                    Err(e) => error!("读取配置文件失败: {} - {}", path.display(), e),
                }
            }
        }));
        Ok(())
    }
}

impl Drop for FileConfigSource {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

#[async_trait]
impl RemoteConfigSource for FileConfigSource {
    async fn get_config(&self) -> Result<ConfigPush, ConfigError> {
        if !self.path.exists() {
            return Err(ConfigError::FileNotFound {
                path: self.path.display().to_string(),
            });
        }
        Self::read(&self.path, self.data_id(), self.format).await
    }

    async fn add_watcher(&self, handler: Arc<dyn ConfigPushHandler>) -> Result<(), ConfigError> {
        self.watchers.write().push(handler);
        self.start_watching()
    }

    fn name(&self) -> &str {
        "FileConfigSource"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    #[derive(Default)]
    struct RecordingHandler {
        pushes: Mutex<Vec<ConfigPush>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ConfigPushHandler for RecordingHandler {
        async fn on_config_push(&self, push: ConfigPush) -> Result<ReloadReport, RefreshError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pushes.lock().push(push);
            Ok(ReloadReport {
                reload_id: uuid::Uuid::new_v4(),
                version: 1,
                changed_keys: Vec::new(),
                changed_beans: Vec::new(),
                reset_beans: Vec::new(),
                rebuilt_beans: Vec::new(),
                failures: Vec::new(),
                elapsed: Duration::ZERO,
            })
        }
    }

    #[tokio::test]
    async fn static_source_publishes_to_every_watcher() {
        let source = StaticConfigSource::yaml("blog-dev.yaml", "mail:\n  host: a\n");
        let first = Arc::new(RecordingHandler::default());
        let second = Arc::new(RecordingHandler::default());
        source.add_watcher(first.clone()).await.unwrap();
        source.add_watcher(second.clone()).await.unwrap();
        assert_eq!(source.watcher_count(), 2);

        let results = source.publish("mail:\n  host: b\n").await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_ok()));

        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.pushes.lock()[0].content, "mail:\n  host: b\n");
        assert_eq!(source.get_config().await.unwrap().content, "mail:\n  host: b\n");
    }

    #[tokio::test]
    async fn file_source_reads_current_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote.yaml");
        std::fs::write(&path, "mail:\n  host: a\n").unwrap();

        let source = FileConfigSource::new(&path).unwrap();
        let push = source.get_config().await.unwrap();
        assert_eq!(push.data_id, "remote.yaml");
        assert_eq!(push.format, DocumentFormat::Yaml);
        assert!(push.content.contains("host: a"));

        let missing = FileConfigSource::new(dir.path().join("absent.yaml")).unwrap();
        assert!(matches!(
            missing.get_config().await,
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn file_source_pushes_on_modification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote.yaml");
        std::fs::write(&path, "mail:\n  host: a\n").unwrap();

        let source = FileConfigSource::new(&path)
            .unwrap()
            .with_debounce_delay(Duration::from_millis(20));
        let handler = Arc::new(RecordingHandler::default());
        source.add_watcher(handler.clone()).await.unwrap();
        assert!(source.is_watching());

        // 给监控器留出注册时间
        tokio::time::sleep(Duration::from_millis(100)).await;
        std::fs::write(&path, "mail:\n  host: b\n").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while handler.calls.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let pushes = handler.pushes.lock();
        assert!(!pushes.is_empty(), "文件修改后应该推送配置");
        assert!(pushes.last().unwrap().content.contains("host: b"));
        drop(pushes);

        source.stop();
        assert!(!source.is_watching());
    }
}
