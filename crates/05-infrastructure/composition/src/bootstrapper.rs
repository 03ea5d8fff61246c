//! 应用启动器
//!
//! 负责协调启动顺序：
//!
//! 1. 安装日志订阅器（可选）
//! 2. 加载启动配置并应用环境变量覆盖
//! 3. 构建容器
//! 4. 拉取远程配置，经由与推送相同的重载路径合并
//! 5. 将容器注册为远程配置源的监听器，并补齐注册期间错过的变更

use crate::application::Application;
use crate::builder::BootstrapOptions;
use config_abstractions::{ConfigPushHandler, RemoteConfigSource};
use config_impl::{ConfigSnapshot, ConfigStore};
use di_abstractions::{Bean, BeanDefinition};
use di_impl::{Container, ContainerBuilder};
use infrastructure_common::InfrastructureError;
use std::sync::Arc;
use tracing::{error, info};

/// 应用启动器
#[derive(Debug)]
pub struct ApplicationBootstrapper {
    options: BootstrapOptions,
    store: ConfigStore,
    builder: ContainerBuilder,
}

impl ApplicationBootstrapper {
    /// 创建新的应用启动器
    pub fn new(options: BootstrapOptions) -> Self {
        let store = ConfigStore::new();
        let builder = ContainerBuilder::new()
            .with_options(options.container.clone())
            .with_store(store.clone());
        Self {
            options,
            store,
            builder,
        }
    }

    /// 注册组件定义
    pub fn register(&mut self, definition: BeanDefinition) -> Result<&mut Self, InfrastructureError> {
        self.builder.register(definition)?;
        Ok(self)
    }

    /// 按类型注册组件
    pub fn register_type<T: Bean>(&mut self) -> Result<&mut Self, InfrastructureError> {
        self.builder.register_type::<T>()?;
        Ok(self)
    }

    /// 注册刷新作用域
    pub fn register_watch<I, S>(&mut self, bean_name: &str, keys: I) -> Result<&mut Self, InfrastructureError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builder.register_watch(bean_name, keys)?;
        Ok(self)
    }

    /// 直接访问容器构建器
    pub fn container_builder(&mut self) -> &mut ContainerBuilder {
        &mut self.builder
    }

    /// 加载启动配置并应用环境变量覆盖
    fn load_local_base(&self) -> Result<ConfigSnapshot, InfrastructureError> {
        let path = &self.options.bootstrap_path;
        let snapshot = self.store.load_file(path).map_err(|e| {
            error!("加载启动配置失败: {} - {}", path.display(), e);
            e
        })?;

        let table = &self.options.env_overrides;
        let snapshot = match self.options.env_lookup() {
            Some(lookup) => self
                .store
                .apply_overrides_with(&snapshot, table, |name| lookup(name)),
            None => self.store.apply_env_overrides(&snapshot, table),
        };
        Ok(snapshot.with_version(1))
    }

    fn build_container(self) -> Result<Arc<Container>, InfrastructureError> {
        if let Some(logging) = &self.options.logging {
            logging.init();
        }
        info!("开始启动应用: {}", self.options.bootstrap_path.display());

        let local_base = self.load_local_base()?;
        let container = self.builder.build(local_base)?;
        Ok(Arc::new(container))
    }

    /// 使用给定的远程配置源启动
    pub async fn bootstrap(
        self,
        source: Arc<dyn RemoteConfigSource>,
    ) -> Result<Application, InfrastructureError> {
        let container = self.build_container()?;
        connect(container, source).await
    }

    /// 使用容器中注册的组件作为远程配置源启动
    ///
    /// 配置源组件可以通过配置字段读取启动配置中的连接参数
    pub async fn bootstrap_with_source_bean<S>(
        self,
        name: &str,
    ) -> Result<Application, InfrastructureError>
    where
        S: RemoteConfigSource + 'static,
    {
        let container = self.build_container()?;
        let source: Arc<dyn RemoteConfigSource> = container.resolve::<S>(name).await?;
        info!("使用组件 {} 作为远程配置源", name);
        connect(container, source).await
    }
}

/// 首次拉取远程配置并注册监听
async fn connect(
    container: Arc<Container>,
    source: Arc<dyn RemoteConfigSource>,
) -> Result<Application, InfrastructureError> {
    info!("拉取远程配置: {}", source.name());
    let push = source.get_config().await?;
    let mut initial_report = container.on_config_push(push.clone()).await?;

    source.add_watcher(container.clone()).await?;
    // 首次拉取与注册监听之间的变更不会被推送，注册后再拉取一次
    let latest = source.get_config().await?;
    if latest.content != push.content || latest.format != push.format {
        info!("注册监听期间配置已变化，重新合并: {}", latest.data_id);
        initial_report = container.on_config_push(latest).await?;
    }
    info!(
        "应用启动完成: 配置版本 {}, 组件 {} 个",
        initial_report.version,
        container.bean_names().len()
    );
    Ok(Application::new(container, source, initial_report))
}
