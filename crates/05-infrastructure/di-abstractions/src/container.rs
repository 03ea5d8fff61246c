//! 容器配置与统计

use std::time::Duration;

/// 容器配置
#[derive(Debug, Clone)]
pub struct ContainerOptions {
    /// 解析时等待刷新完成的最长时间，`None` 表示无限等待
    pub resolution_timeout: Option<Duration>,
    /// 刷新时等待进行中的解析完成的最长时间，`None` 表示无限等待
    pub reload_timeout: Option<Duration>,
    /// 最大解析深度
    pub max_resolution_depth: usize,
    /// 刷新后是否立即重建被重置的单例
    pub eager_rebuild: bool,
    /// 构建时发现组件引用环路是否输出警告
    pub warn_on_cycles: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            resolution_timeout: Some(Duration::from_millis(5000)),
            reload_timeout: Some(Duration::from_millis(5000)),
            max_resolution_depth: 64,
            eager_rebuild: false,
            warn_on_cycles: true,
        }
    }
}

impl ContainerOptions {
    pub fn with_resolution_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.resolution_timeout = timeout;
        self
    }

    pub fn with_reload_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.reload_timeout = timeout;
        self
    }

    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    pub fn with_eager_rebuild(mut self, eager: bool) -> Self {
        self.eager_rebuild = eager;
        self
    }

    pub fn with_warn_on_cycles(mut self, warn: bool) -> Self {
        self.warn_on_cycles = warn;
        self
    }
}


/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// 已注册组件数量
    pub registered_beans: usize,
    /// 已缓存的单例数量
    pub cached_singletons: usize,
    /// 带刷新作用域的组件数量
    pub refresh_scoped_beans: usize,
    /// 当前配置版本
    pub active_version: u64,
    /// 已完成的刷新次数
    pub completed_reloads: u64,
}
