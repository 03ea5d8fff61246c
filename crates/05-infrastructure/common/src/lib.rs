//! # Infrastructure Common
//!
//! 这个 crate 提供了依赖注入运行时与动态配置共用的基础类型。
//!
//! ## 核心内容
//!
//! - [`errors`] - 配置、依赖注入与重载的错误分类
//! - [`Lifecycle`] - 组件生命周期（单例 / 工厂）
//! - [`BeanState`] - 单例实例状态机
//! - [`FieldBinding`] - 字段注入元数据
//! - [`bean_name_of`] - 组件命名约定

pub mod conventions;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use conventions::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
