//! 启动选项与日志配置

use config_impl::EnvOverrideTable;
use di_abstractions::ContainerOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 环境变量查找函数
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// 启动选项
#[derive(Clone)]
pub struct BootstrapOptions {
    /// 启动配置文件路径，格式由扩展名决定
    pub bootstrap_path: PathBuf,
    /// 环境变量覆盖表
    pub env_overrides: EnvOverrideTable,
    /// 容器配置
    pub container: ContainerOptions,
    /// 日志配置，`None` 表示不安装日志订阅器
    pub logging: Option<LoggingConfig>,
    /// 环境变量查找函数，默认读取进程环境变量
    env_lookup: Option<EnvLookup>,
}

impl std::fmt::Debug for BootstrapOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapOptions")
            .field("bootstrap_path", &self.bootstrap_path)
            .field("env_overrides", &self.env_overrides)
            .field("container", &self.container)
            .field("logging", &self.logging)
            .field("env_lookup", &self.env_lookup.as_ref().map(|_| "<function>"))
            .finish()
    }
}

impl BootstrapOptions {
    /// 以启动配置文件路径创建
    pub fn new(bootstrap_path: impl AsRef<Path>) -> Self {
        Self {
            bootstrap_path: bootstrap_path.as_ref().to_path_buf(),
            env_overrides: EnvOverrideTable::default(),
            container: ContainerOptions::default(),
            logging: None,
            env_lookup: None,
        }
    }

    /// 设置环境变量覆盖表
    pub fn with_env_overrides(mut self, table: EnvOverrideTable) -> Self {
        self.env_overrides = table;
        self
    }

    /// 使用自定义函数代替进程环境变量
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env_lookup = Some(Arc::new(lookup));
        self
    }

    /// 设置容器配置
    pub fn with_container_options(mut self, options: ContainerOptions) -> Self {
        self.container = options;
        self
    }

    /// 启用日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    pub(crate) fn env_lookup(&self) -> Option<&EnvLookup> {
        self.env_lookup.as_ref()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别，可被 `RUST_LOG` 覆盖
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.to_string().to_lowercase()))
    }

    /// 安装全局日志订阅器
    ///
    /// 已经安装过订阅器时返回 `false`，不视为错误
    pub fn init(&self) -> bool {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        let result = if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        };

        match result {
            Ok(()) => {
                info!("日志系统初始化完成");
                true
            }
            Err(e) => {
                debug!("日志订阅器已存在，跳过初始化: {}", e);
                false
            }
        }
    }
}
