//! 容器
//!
//! 由应用的组合根创建并显式传递，提供组件解析、配置取值与配置推送入口。

use crate::refresh::RefreshCoordinator;
use crate::registry::BeanRegistryImpl;
use async_trait::async_trait;
use config_abstractions::{ConfigChangeEvent, ConfigPush, ConfigPushHandler, ReloadReport};
use config_impl::ConfigSnapshot;
use di_abstractions::{downcast_instance, BeanRegistry, ContainerStats, Instance};
use infrastructure_common::{bean_name_of, BeanState, ConfigError, DependencyError, RefreshError};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::broadcast;

/// 依赖注入容器
#[derive(Debug)]
pub struct Container {
    registry: BeanRegistryImpl,
    coordinator: RefreshCoordinator,
}

impl Container {
    pub(crate) fn new(registry: BeanRegistryImpl, coordinator: RefreshCoordinator) -> Self {
        Self {
            registry,
            coordinator,
        }
    }

    /// 组件注册表
    pub fn registry(&self) -> &BeanRegistryImpl {
        &self.registry
    }

    /// 刷新协调器
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// 按名称解析组件并转换为具体类型
    pub async fn resolve<T>(&self, name: &str) -> Result<Arc<T>, DependencyError>
    where
        T: Send + Sync + 'static,
    {
        let instance = self.registry.resolve_by_name(name).await?;
        downcast_instance(name, instance)
    }

    /// 按类型默认名称解析组件
    pub async fn resolve_type<T>(&self) -> Result<Arc<T>, DependencyError>
    where
        T: Send + Sync + 'static,
    {
        self.resolve(&bean_name_of::<T>()).await
    }

    /// 按名称解析组件
    pub async fn resolve_by_name(&self, name: &str) -> Result<Instance, DependencyError> {
        self.registry.resolve_by_name(name).await
    }

    /// 丢弃单例缓存
    pub async fn reset(&self, name: &str) -> Result<bool, DependencyError> {
        self.registry.reset(name).await
    }

    /// 当前配置快照
    pub async fn snapshot(&self) -> Result<ConfigSnapshot, DependencyError> {
        let state = self.registry.gate().enter().await?;
        Ok(state.snapshot().clone())
    }

    /// 当前配置版本
    pub async fn active_version(&self) -> Result<u64, DependencyError> {
        Ok(self.snapshot().await?.version())
    }

    /// 读取可选配置值
    pub async fn config_value<T>(&self, key: &str) -> Result<Option<T>, DependencyError>
    where
        T: DeserializeOwned,
    {
        let state = self.registry.gate().enter().await?;
        Ok(self.registry.store().get_as(state.snapshot(), key, false)?)
    }

    /// 读取必需配置值，缺失时返回 [`ConfigError::KeyNotFound`]
    pub async fn required_config_value<T>(&self, key: &str) -> Result<T, DependencyError>
    where
        T: DeserializeOwned,
    {
        let state = self.registry.gate().enter().await?;
        self.registry
            .store()
            .get_as(state.snapshot(), key, true)?
            .ok_or_else(|| ConfigError::key_not_found(key).into())
    }

    /// 创建组件访问器，每次调用时按名称解析
    pub fn bean_accessor<T>(self: &Arc<Self>, name: impl Into<String>) -> BeanAccessor<T>
    where
        T: Send + Sync + 'static,
    {
        BeanAccessor {
            container: Arc::clone(self),
            name: name.into(),
            _marker: PhantomData,
        }
    }

    /// 订阅配置变更事件
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChangeEvent> {
        self.coordinator.subscribe()
    }

    /// 单例实例状态
    pub async fn bean_state(&self, name: &str) -> Result<BeanState, DependencyError> {
        let state = self.registry.gate().enter().await?;
        self.registry.bean_state_in(&state, name)
    }

    /// 所有已注册的组件名称（按注册顺序）
    pub fn bean_names(&self) -> Vec<String> {
        self.registry.bean_names()
    }

    /// 直接引用指定组件的组件
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.coordinator.dependents_of(name)
    }

    /// 容器统计信息
    pub async fn stats(&self) -> Result<ContainerStats, DependencyError> {
        let state = self.registry.gate().enter().await?;
        Ok(ContainerStats {
            registered_beans: self.registry.bean_names().len(),
            cached_singletons: state.cached_singletons(),
            refresh_scoped_beans: self.coordinator.registrations().len(),
            active_version: state.snapshot().version(),
            completed_reloads: self.coordinator.completed_reloads(),
        })
    }
}

#[async_trait]
impl ConfigPushHandler for Container {
    async fn on_config_push(&self, push: ConfigPush) -> Result<ReloadReport, RefreshError> {
        self.coordinator.on_config_push(&self.registry, push).await
    }
}

/// 组件访问器
///
/// 请求处理代码持有访问器而不是实例，每次使用时都拿到当前生效的组件
pub struct BeanAccessor<T> {
    container: Arc<Container>,
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for BeanAccessor<T> {
    fn clone(&self) -> Self {
        Self {
            container: Arc::clone(&self.container),
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for BeanAccessor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanAccessor").field("name", &self.name).finish()
    }
}

impl<T> BeanAccessor<T>
where
    T: Send + Sync + 'static,
{
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 解析当前组件
    pub async fn get(&self) -> Result<Arc<T>, DependencyError> {
        self.container.resolve(&self.name).await
    }
}
