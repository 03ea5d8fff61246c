//! 组件定义
//!
//! 组件通过显式的字段描述列表声明依赖（组件引用或配置值），
//! 在进程启动时创建一次，之后不可变。

use crate::resolver::{InjectedFields, Instance};
use infrastructure_common::{bean_name_of, FieldBinding, Lifecycle, TypeInfo};
use std::sync::Arc;

/// 组件构造函数类型
pub type ConstructorFn = Arc<dyn Fn(&InjectedFields) -> anyhow::Result<Instance> + Send + Sync>;

/// 可注册组件 trait
///
/// 类型自身声明字段绑定与构造方式，配合 [`BeanDefinition::of`] 使用
pub trait Bean: Send + Sync + Sized + 'static {
    /// 字段绑定列表
    fn bindings() -> Vec<FieldBinding> {
        Vec::new()
    }

    /// 使用已注入的字段创建实例
    fn construct(fields: &InjectedFields) -> anyhow::Result<Self>;

    /// 字段注入完成后的初始化逻辑
    fn post_construct(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// 默认生命周期
    fn lifecycle() -> Lifecycle {
        Lifecycle::Singleton
    }

    /// 刷新作用域：这些配置键变化时重置单例
    fn refresh_scope() -> Option<Vec<String>> {
        None
    }
}

/// 组件定义
#[derive(Clone)]
pub struct BeanDefinition {
    name: String,
    lifecycle: Lifecycle,
    field_bindings: Vec<FieldBinding>,
    refresh_keys: Option<Vec<String>>,
    type_info: Option<TypeInfo>,
    constructor: ConstructorFn,
}

impl std::fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("name", &self.name)
            .field("lifecycle", &self.lifecycle)
            .field("field_bindings", &self.field_bindings)
            .field("refresh_keys", &self.refresh_keys)
            .field("type_info", &self.type_info)
            .field("constructor", &"<function>")
            .finish()
    }
}

impl BeanDefinition {
    /// 使用构造闭包创建组件定义
    pub fn new<T, F>(name: impl Into<String>, lifecycle: Lifecycle, constructor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&InjectedFields) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            lifecycle,
            field_bindings: Vec::new(),
            refresh_keys: None,
            type_info: Some(TypeInfo::of::<T>()),
            constructor: Arc::new(move |fields| {
                let instance: Instance = Arc::new(constructor(fields)?);
                Ok(instance)
            }),
        }
    }

    /// 由实现了 [`Bean`] 的类型创建组件定义
    pub fn of<T: Bean>(name: impl Into<String>) -> Self {
        let mut definition = Self::new(name, T::lifecycle(), |fields| {
            let mut bean = T::construct(fields)?;
            bean.post_construct()?;
            Ok(bean)
        });
        definition.field_bindings = T::bindings();
        definition.refresh_keys = T::refresh_scope();
        definition
    }

    /// 使用类型默认名称（小驼峰）创建组件定义
    pub fn for_type<T: Bean>() -> Self {
        Self::of::<T>(bean_name_of::<T>())
    }

    /// 添加组件引用字段
    pub fn with_bean_ref(mut self, field: impl Into<String>, target: impl Into<String>) -> Self {
        self.field_bindings.push(FieldBinding::bean_ref(field, target));
        self
    }

    /// 添加配置值字段
    pub fn with_config_ref(mut self, field: impl Into<String>, key: impl Into<String>) -> Self {
        self.field_bindings.push(FieldBinding::config_ref(field, key));
        self
    }

    /// 设置刷新作用域
    pub fn with_refresh_scope<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.refresh_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// 设置生命周期
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn field_bindings(&self) -> &[FieldBinding] {
        &self.field_bindings
    }

    pub fn refresh_keys(&self) -> Option<&[String]> {
        self.refresh_keys.as_deref()
    }

    pub fn type_info(&self) -> Option<&TypeInfo> {
        self.type_info.as_ref()
    }

    /// 引用的其他组件名称
    pub fn bean_dependencies(&self) -> impl Iterator<Item = &str> {
        self.field_bindings.iter().filter_map(FieldBinding::bean_target)
    }

    /// 调用构造函数
    pub fn construct(&self, fields: &InjectedFields) -> anyhow::Result<Instance> {
        (self.constructor)(fields)
    }
}

/// 刷新注册信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRegistration {
    /// 组件名称
    pub bean_name: String,
    /// 被监听的配置键
    pub watched_keys: Vec<String>,
}
