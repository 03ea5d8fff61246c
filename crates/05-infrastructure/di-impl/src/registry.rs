//! 组件注册表实现
//!
//! 组件定义在启动后只读；单例缓存与当前配置快照放在闸门内，
//! 一次解析只进入闸门一次，之后沿字段绑定同步递归构建。

use crate::gate::ConcurrencyGate;
use async_trait::async_trait;
use config_impl::{ConfigSnapshot, ConfigStore};
use dashmap::DashMap;
use di_abstractions::{
    BeanDefinition, BeanRegistry, ContainerOptions, FieldValue, InjectedFields, Instance,
    ResolveContext,
};
use infrastructure_common::{BeanState, BindingKind, ConfigError, DependencyError};
use std::collections::HashMap;
use tracing::{debug, info};

/// 闸门保护的当前状态
#[derive(Debug)]
pub struct ActiveState {
    snapshot: ConfigSnapshot,
    singletons: DashMap<String, Instance>,
}

impl ActiveState {
    /// 以初始快照创建
    pub fn new(snapshot: ConfigSnapshot) -> Self {
        Self {
            snapshot,
            singletons: DashMap::new(),
        }
    }

    /// 当前配置快照
    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    /// 整体替换配置快照
    pub(crate) fn swap_snapshot(&mut self, snapshot: ConfigSnapshot) -> ConfigSnapshot {
        std::mem::replace(&mut self.snapshot, snapshot)
    }

    /// 已缓存的单例数量
    pub fn cached_singletons(&self) -> usize {
        self.singletons.len()
    }
}

/// 组件注册表实现
pub struct BeanRegistryImpl {
    definitions: HashMap<String, BeanDefinition>,
    /// 注册顺序
    order: Vec<String>,
    gate: ConcurrencyGate<ActiveState>,
    store: ConfigStore,
    max_resolution_depth: usize,
}

impl std::fmt::Debug for BeanRegistryImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanRegistryImpl")
            .field("beans", &self.order)
            .field("max_resolution_depth", &self.max_resolution_depth)
            .finish()
    }
}

impl BeanRegistryImpl {
    /// 创建注册表，组件定义此后不再变化
    pub fn new(
        definitions: Vec<BeanDefinition>,
        snapshot: ConfigSnapshot,
        store: ConfigStore,
        options: &ContainerOptions,
    ) -> Self {
        let order = definitions.iter().map(|d| d.name().to_string()).collect();
        let definitions = definitions
            .into_iter()
            .map(|d| (d.name().to_string(), d))
            .collect();
        Self {
            definitions,
            order,
            gate: ConcurrencyGate::new(ActiveState::new(snapshot), options),
            store,
            max_resolution_depth: options.max_resolution_depth,
        }
    }

    pub fn gate(&self) -> &ConcurrencyGate<ActiveState> {
        &self.gate
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    fn definition_or_err(&self, name: &str) -> Result<&BeanDefinition, DependencyError> {
        self.definitions
            .get(name)
            .ok_or_else(|| DependencyError::bean_not_found(name))
    }

    /// 在已进入闸门的状态下解析组件
    pub fn resolve_in(&self, state: &ActiveState, name: &str) -> Result<Instance, DependencyError> {
        let mut context = ResolveContext::new(self.max_resolution_depth);
        self.resolve_with(state, name, &mut context)
    }

    fn resolve_with(
        &self,
        state: &ActiveState,
        name: &str,
        context: &mut ResolveContext,
    ) -> Result<Instance, DependencyError> {
        let definition = self.definition_or_err(name)?;
        let cached = definition.lifecycle().is_cached();

        if cached {
            if let Some(instance) = state.singletons.get(name) {
                return Ok(instance.value().clone());
            }
        }

        context.push(name)?;
        let built = self.construct(state, definition, context);
        context.pop();
        let instance = built?;

        if cached {
            // 并发构建时只保留第一个写入的实例
            let entry = state
                .singletons
                .entry(name.to_string())
                .or_insert(instance);
            return Ok(entry.value().clone());
        }
        Ok(instance)
    }

    fn construct(
        &self,
        state: &ActiveState,
        definition: &BeanDefinition,
        context: &mut ResolveContext,
    ) -> Result<Instance, DependencyError> {
        debug!("构建组件: {} ({})", definition.name(), definition.lifecycle());
        let mut fields = InjectedFields::new(definition.name());

        for binding in definition.field_bindings() {
            let value = match &binding.kind {
                BindingKind::BeanRef(target) => FieldValue::Bean {
                    target: target.clone(),
                    instance: self.resolve_with(state, target, context)?,
                },
                BindingKind::ConfigRef(key) => FieldValue::Config {
                    key: key.clone(),
                    value: self
                        .store
                        .get(&state.snapshot, key, true)?
                        .ok_or_else(|| ConfigError::key_not_found(key))?,
                },
            };
            fields.insert(binding.field_name.clone(), value);
        }

        definition
            .construct(&fields)
            .map_err(|e| creation_error(definition, e))
    }

    /// 在已进入闸门的状态下丢弃单例缓存
    pub fn reset_in(&self, state: &ActiveState, name: &str) -> bool {
        let removed = state.singletons.remove(name).is_some();
        if removed {
            info!("重置单例组件: {}", name);
        }
        removed
    }

    /// 单例实例状态
    pub fn bean_state_in(&self, state: &ActiveState, name: &str) -> Result<BeanState, DependencyError> {
        self.definition_or_err(name)?;
        Ok(if state.singletons.contains_key(name) {
            BeanState::Constructed
        } else {
            BeanState::Uninitialized
        })
    }
}

/// 构造函数错误转换：依赖注入和配置错误原样传递，其余包装为创建失败
fn creation_error(definition: &BeanDefinition, error: anyhow::Error) -> DependencyError {
    let error = match error.downcast::<DependencyError>() {
        Ok(dependency) => return dependency,
        Err(other) => other,
    };
    match error.downcast::<ConfigError>() {
        Ok(config) => DependencyError::from(config),
        Err(other) => DependencyError::ComponentCreationFailed {
            type_name: definition
                .type_info()
                .map_or_else(|| definition.name().to_string(), |info| info.name.clone()),
            source: other.into(),
        },
    }
}

#[async_trait]
impl BeanRegistry for BeanRegistryImpl {
    async fn resolve_by_name(&self, name: &str) -> Result<Instance, DependencyError> {
        let state = self.gate.enter().await?;
        self.resolve_in(&state, name)
    }

    async fn reset(&self, name: &str) -> Result<bool, DependencyError> {
        let definition = self.definition_or_err(name)?;
        if !definition.lifecycle().is_cached() {
            return Ok(false);
        }
        let state = self.gate.enter().await?;
        Ok(self.reset_in(&state, name))
    }

    fn definition(&self, name: &str) -> Option<&BeanDefinition> {
        self.definitions.get(name)
    }

    fn bean_names(&self) -> Vec<String> {
        self.order.clone()
    }
}
