//! 配置文件监控器实现

use infrastructure_common::ConfigError;
use notify::{recommended_watcher, Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// 配置文件监控器
///
/// 监控单个配置文档所在目录，文档被修改、创建或替换时发出通知。
/// 编辑器常以“写临时文件再重命名”的方式保存，因此监控父目录并按文件名过滤。
pub struct ConfigFileWatcher {
    /// 文件系统监控器，释放即停止监控
    _watcher: notify::RecommendedWatcher,
    /// 被监控的文件
    path: PathBuf,
    /// 变更通知接收器
    changes: mpsc::UnboundedReceiver<()>,
    /// 防抖延迟
    debounce_delay: Duration,
}

impl std::fmt::Debug for ConfigFileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigFileWatcher")
            .field("path", &self.path)
            .field("debounce_delay", &self.debounce_delay)
            .finish()
    }
}

impl ConfigFileWatcher {
    /// 开始监控指定文件
    pub fn start(path: impl AsRef<Path>, debounce_delay: Duration) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let file_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| ConfigError::SourceError {
                message: format!("无效的配置文件路径: {}", path.display()),
            })?;
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (sender, changes) = mpsc::unbounded_channel();
        let mut watcher = recommended_watcher(move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                let relevant = matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_)
                ) && event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(file_name.as_os_str()));
                if relevant {
                    debug!("配置文件事件: {:?}", event.kind);
                    let _ = sender.send(());
                }
            }
            Err(e) => {
                error!("文件监控错误: {:?}", e);
            }
        })
        .map_err(|e| ConfigError::SourceError {
            message: format!("创建文件监控器失败: {}", e),
        })?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::SourceError {
                message: format!("添加监控路径失败: {} - {}", directory.display(), e),
            })?;

        info!("开始监控配置文件: {}", path.display());
        Ok(Self {
            _watcher: watcher,
            path,
            changes,
            debounce_delay,
        })
    }

    /// 被监控的文件
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 等待下一次变更，防抖窗口内的多个事件合并为一次
    ///
    /// 监控器已关闭时返回 `None`
    pub async fn next_change(&mut self) -> Option<()> {
        self.changes.recv().await?;
        tokio::time::sleep(self.debounce_delay).await;
        while self.changes.try_recv().is_ok() {}
        Some(())
    }
}
