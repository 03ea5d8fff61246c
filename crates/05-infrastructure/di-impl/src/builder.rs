//! 容器构建器
//!
//! 进程装配阶段注册所有组件定义与刷新作用域，`build` 之后注册信息不再变化。

use crate::container::Container;
use crate::refresh::RefreshCoordinator;
use crate::registry::BeanRegistryImpl;
use config_impl::{ConfigSnapshot, ConfigStore};
use di_abstractions::{
    Bean, BeanDefinition, CircularDependencyDetector, ContainerOptions,
    DefaultCircularDependencyDetector, RefreshRegistration,
};
use infrastructure_common::{is_valid_config_key, DependencyError, Lifecycle};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

/// 容器构建器
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    definitions: Vec<BeanDefinition>,
    names: HashSet<String>,
    watches: Vec<RefreshRegistration>,
    options: ContainerOptions,
    store: ConfigStore,
}

impl ContainerBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置容器配置
    pub fn with_options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    /// 设置配置存储
    pub fn with_store(mut self, store: ConfigStore) -> Self {
        self.store = store;
        self
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    /// 注册组件定义
    ///
    /// 名称重复时返回 [`DependencyError::DuplicateBeanName`]；
    /// 定义中带有刷新作用域时同时注册监听
    pub fn register(&mut self, definition: BeanDefinition) -> Result<&mut Self, DependencyError> {
        let name = definition.name().to_string();
        if self.names.contains(&name) {
            return Err(DependencyError::DuplicateBeanName { name });
        }
        // 校验通过之前不修改任何注册信息
        if definition.refresh_keys().is_some_and(|keys| keys.is_empty()) {
            return Err(DependencyError::EmptyWatchKeys { name });
        }
        info!("注册组件: {} ({})", name, definition.lifecycle());

        if let Some(keys) = definition.refresh_keys() {
            let keys = keys.to_vec();
            self.register_watch(&name, keys)?;
        }
        self.names.insert(name);
        self.definitions.push(definition);
        Ok(self)
    }

    /// 按类型注册组件，名称为类型名的小驼峰形式
    pub fn register_type<T: Bean>(&mut self) -> Result<&mut Self, DependencyError> {
        self.register(BeanDefinition::for_type::<T>())
    }

    /// 按指定名称注册组件类型
    pub fn register_named<T: Bean>(&mut self, name: impl Into<String>) -> Result<&mut Self, DependencyError> {
        self.register(BeanDefinition::of::<T>(name))
    }

    /// 注册已创建好的单例实例
    pub fn register_instance<T>(&mut self, name: impl Into<String>, instance: T) -> Result<&mut Self, DependencyError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.register(BeanDefinition::new(name, Lifecycle::Singleton, move |_| {
            Ok(instance.clone())
        }))
    }

    /// 注册刷新作用域
    ///
    /// 监听的配置键不能为空；同一组件多次注册时合并监听的配置键
    pub fn register_watch<I, S>(&mut self, bean_name: &str, keys: I) -> Result<&mut Self, DependencyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Err(DependencyError::EmptyWatchKeys {
                name: bean_name.to_string(),
            });
        }
        for key in keys.iter().filter(|key| !is_valid_config_key(key)) {
            warn!("组件 {} 监听的配置键格式异常: {:?}", bean_name, key);
        }
        debug!("注册刷新作用域: {} -> {:?}", bean_name, keys);

        match self.watches.iter_mut().find(|w| w.bean_name == bean_name) {
            Some(existing) => {
                for key in keys {
                    if !existing.watched_keys.contains(&key) {
                        existing.watched_keys.push(key);
                    }
                }
            }
            None => self.watches.push(RefreshRegistration {
                bean_name: bean_name.to_string(),
                watched_keys: keys,
            }),
        }
        Ok(self)
    }

    /// 已注册的组件数量
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    fn validate(&self) -> Result<(), DependencyError> {
        for definition in &self.definitions {
            if let Some(target) = definition
                .bean_dependencies()
                .find(|target| !self.names.contains(*target))
            {
                warn!("组件 {} 引用了未注册的组件 {}", definition.name(), target);
                return Err(DependencyError::bean_not_found(target));
            }
        }

        if let Some(watch) = self.watches.iter().find(|w| !self.names.contains(&w.bean_name)) {
            return Err(DependencyError::bean_not_found(&watch.bean_name));
        }

        if self.options.warn_on_cycles {
            let detector = DefaultCircularDependencyDetector;
            let singletons = self
                .definitions
                .iter()
                .filter(|definition| definition.lifecycle() == Lifecycle::Singleton);
            let graph = detector.build_dependency_graph(singletons);
            for cycle in detector.detect_circular_dependencies(&graph) {
                warn!("检测到组件循环引用，解析时将失败: {}", cycle);
            }
        }
        Ok(())
    }

    /// 以初始配置构建容器
    ///
    /// `local_base` 为启动配置与环境变量覆盖后的快照，远程推送的文档合并于其上
    pub fn build(self, local_base: ConfigSnapshot) -> Result<Container, DependencyError> {
        self.validate()?;

        let reverse_dependencies =
            RefreshCoordinator::derive_reverse_dependencies(self.definitions.iter());
        let refresh_scoped: BTreeSet<&str> =
            self.watches.iter().map(|w| w.bean_name.as_str()).collect();
        info!(
            "容器构建完成: {} 个组件, {} 个刷新作用域",
            self.definitions.len(),
            refresh_scoped.len()
        );

        let coordinator = RefreshCoordinator::new(
            self.watches,
            reverse_dependencies,
            local_base.clone(),
            &self.options,
        );
        let registry = BeanRegistryImpl::new(self.definitions, local_base, self.store, &self.options);
        Ok(Container::new(registry, coordinator))
    }
}
