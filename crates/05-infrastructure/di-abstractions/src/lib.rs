//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义组件声明和按名称解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`BeanDefinition`] - 组件定义（名称、生命周期、字段绑定、构造函数）
//! - [`Bean`] - 由类型自身声明绑定的组件
//! - [`BeanRegistry`] - 组件注册表接口
//! - [`InjectedFields`] - 注入给构造函数的字段集合

pub mod container;
pub mod definition;
pub mod registry;
pub mod resolver;

pub use container::*;
pub use definition::*;
pub use registry::*;
pub use resolver::*;
