//! 启动完成的应用

use config_abstractions::{ReloadReport, RemoteConfigSource};
use di_impl::Container;
use std::sync::Arc;

/// 启动完成的应用
///
/// 持有容器与远程配置源；远程配置源已把容器注册为监听器
pub struct Application {
    container: Arc<Container>,
    source: Arc<dyn RemoteConfigSource>,
    initial_report: ReloadReport,
    started_at: chrono::DateTime<chrono::Utc>,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("source", &self.source.name())
            .field("initial_version", &self.initial_report.version)
            .field("started_at", &self.started_at)
            .finish()
    }
}

impl Application {
    pub(crate) fn new(
        container: Arc<Container>,
        source: Arc<dyn RemoteConfigSource>,
        initial_report: ReloadReport,
    ) -> Self {
        Self {
            container,
            source,
            initial_report,
            started_at: chrono::Utc::now(),
        }
    }

    /// 容器
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// 远程配置源
    pub fn source(&self) -> &Arc<dyn RemoteConfigSource> {
        &self.source
    }

    /// 首次合并远程配置的结果
    pub fn initial_report(&self) -> &ReloadReport {
        &self.initial_report
    }

    /// 启动完成时间
    pub fn started_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.started_at
    }
}
