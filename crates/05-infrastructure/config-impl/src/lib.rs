//! # Configuration Implementation
//!
//! 动态配置的具体实现：不可变快照、配置存储与内置配置源。
//!
//! ## 主要组件
//!
//! - [`ConfigSnapshot`] - 某一代配置的不可变视图
//! - [`ConfigStore`] - 加载、环境变量覆盖、合并、查询与比较
//! - [`EnvOverrideTable`] - 环境变量到配置键的映射
//! - [`StaticConfigSource`] - 内存配置源
//! - [`FileConfigSource`] - 基于文件监控的配置源

pub mod env;
pub mod providers;
pub mod snapshot;
pub mod store;
pub mod watcher;

pub use env::*;
pub use providers::*;
pub use snapshot::*;
pub use store::*;
pub use watcher::*;
