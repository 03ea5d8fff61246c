//! 字段注入
//!
//! 构建组件前，容器按字段绑定依次解析组件引用和配置值，
//! 结果以 [`InjectedFields`] 交给组件的构造函数。

use infrastructure_common::{ConfigError, DependencyError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// 容器中的组件实例
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 将组件实例转换为具体类型
pub fn downcast_instance<T>(name: &str, instance: Instance) -> Result<Arc<T>, DependencyError>
where
    T: Send + Sync + 'static,
{
    instance
        .downcast::<T>()
        .map_err(|_| DependencyError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>().to_string(),
        })
}

/// 已解析的字段值
#[derive(Clone)]
pub enum FieldValue {
    /// 组件引用
    Bean { target: String, instance: Instance },
    /// 配置值
    Config { key: String, value: Value },
}

impl std::fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bean { target, .. } => f.debug_struct("Bean").field("target", target).finish(),
            Self::Config { key, value } => f
                .debug_struct("Config")
                .field("key", key)
                .field("value", value)
                .finish(),
        }
    }
}

/// 注入给构造函数的字段集合
#[derive(Debug, Clone)]
pub struct InjectedFields {
    bean_name: String,
    values: HashMap<String, FieldValue>,
}

impl InjectedFields {
    /// 创建空的字段集合
    pub fn new(bean_name: impl Into<String>) -> Self {
        Self {
            bean_name: bean_name.into(),
            values: HashMap::new(),
        }
    }

    /// 正在构建的组件名称
    pub fn bean_name(&self) -> &str {
        &self.bean_name
    }

    /// 写入字段值
    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) {
        self.values.insert(field.into(), value);
    }

    /// 字段数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有任何字段
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn field(&self, field: &str) -> Result<&FieldValue, DependencyError> {
        self.values
            .get(field)
            .ok_or_else(|| DependencyError::FieldNotBound {
                bean: self.bean_name.clone(),
                field: field.to_string(),
            })
    }

    /// 获取组件引用字段
    pub fn bean<T>(&self, field: &str) -> Result<Arc<T>, DependencyError>
    where
        T: Send + Sync + 'static,
    {
        match self.field(field)? {
            FieldValue::Bean { target, instance } => downcast_instance(target, instance.clone()),
            FieldValue::Config { .. } => Err(DependencyError::TypeMismatch {
                name: format!("{}.{}", self.bean_name, field),
                expected: std::any::type_name::<T>().to_string(),
            }),
        }
    }

    /// 获取配置值字段并反序列化
    pub fn value<T>(&self, field: &str) -> Result<T, DependencyError>
    where
        T: DeserializeOwned,
    {
        match self.field(field)? {
            FieldValue::Config { key, value } => serde_json::from_value(value.clone()).map_err(|e| {
                DependencyError::from(ConfigError::TypeConversionError {
                    key: key.clone(),
                    message: e.to_string(),
                })
            }),
            FieldValue::Bean { .. } => Err(DependencyError::TypeMismatch {
                name: format!("{}.{}", self.bean_name, field),
                expected: std::any::type_name::<T>().to_string(),
            }),
        }
    }

    /// 获取原始配置值
    pub fn raw_value(&self, field: &str) -> Option<&Value> {
        match self.values.get(field)? {
            FieldValue::Config { value, .. } => Some(value),
            FieldValue::Bean { .. } => None,
        }
    }
}

/// 解析上下文
///
/// 记录当前解析链，用于检测构建期循环依赖和限制递归深度
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// 当前解析链
    resolution_chain: Vec<String>,
    /// 最大递归深度
    max_depth: usize,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new(max_depth: usize) -> Self {
        Self {
            resolution_chain: Vec::new(),
            max_depth,
        }
    }

    /// 添加组件到解析链
    pub fn push(&mut self, name: &str) -> Result<(), DependencyError> {
        if self.resolution_chain.iter().any(|entry| entry == name) {
            let mut chain = self.resolution_chain.clone();
            chain.push(name.to_string());
            return Err(DependencyError::CircularDependency {
                dependency_chain: chain.join(" -> "),
            });
        }
        if self.resolution_chain.len() >= self.max_depth {
            return Err(DependencyError::ResolutionDepthExceeded {
                name: name.to_string(),
                max_depth: self.max_depth,
            });
        }
        self.resolution_chain.push(name.to_string());
        Ok(())
    }

    /// 从解析链中移除最后一个组件
    pub fn pop(&mut self) {
        self.resolution_chain.pop();
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }
}
