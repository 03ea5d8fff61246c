//! # 依赖注入具体实现
//!
//! 按名称注册的组件容器，支持配置热更新：
//!
//! - [`ConcurrencyGate`] - 解析与配置重载之间的并发闸门
//! - [`BeanRegistryImpl`] - 组件注册表，负责懒构建与字段注入
//! - [`RefreshCoordinator`] - 比较配置变化并级联重置单例
//! - [`ContainerBuilder`] - 启动阶段的注册入口
//! - [`Container`] - 组合根持有的容器

pub mod builder;
pub mod container;
pub mod gate;
pub mod refresh;
pub mod registry;

pub use builder::*;
pub use container::*;
pub use gate::*;
pub use refresh::*;
pub use registry::*;
