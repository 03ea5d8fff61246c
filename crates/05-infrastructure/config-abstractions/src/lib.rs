//! # Configuration Abstractions
//!
//! 动态配置抽象层，定义远程配置源与配置推送的核心接口。
//!
//! ## 核心接口
//!
//! - [`RemoteConfigSource`] - 远程配置源接口（拉取 + 监听）
//! - [`ConfigPushHandler`] - 配置推送处理接口
//! - [`ConfigPush`] - 推送的原始文档
//! - [`ConfigChangeEvent`] / [`ReloadReport`] - 重载产生的事件与结果

pub mod events;
pub mod source;

pub use events::*;
pub use source::*;
