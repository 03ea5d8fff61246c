//! 配置变更事件定义

use infrastructure_common::CascadeConstructionError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// 配置变更事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigChangeEvent {
    /// 事件类型
    pub event_type: ConfigChangeEventType,
    /// 变更路径
    pub path: String,
    /// 旧值
    pub old_value: Option<serde_json::Value>,
    /// 新值
    pub new_value: Option<serde_json::Value>,
    /// 事件时间
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// 事件来源
    pub source: String,
    /// 额外元数据
    pub metadata: HashMap<String, String>,
}

impl ConfigChangeEvent {
    /// 创建配置更新事件
    pub fn updated(
        path: impl Into<String>,
        old_value: Option<serde_json::Value>,
        new_value: Option<serde_json::Value>,
        source: impl Into<String>,
    ) -> Self {
        Self::new(ConfigChangeEventType::Updated, path, old_value, new_value, source)
    }

    /// 创建配置重载事件
    pub fn reloaded(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(ConfigChangeEventType::Reloaded, path, None, None, source)
    }

    /// 创建推送被拒绝事件
    pub fn validation_failed(
        path: impl Into<String>,
        source: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(ConfigChangeEventType::ValidationFailed, path, None, None, source)
            .with_metadata("reason", reason)
    }

    fn new(
        event_type: ConfigChangeEventType,
        path: impl Into<String>,
        old_value: Option<serde_json::Value>,
        new_value: Option<serde_json::Value>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            path: path.into(),
            old_value,
            new_value,
            timestamp: chrono::Utc::now(),
            source: source.into(),
            metadata: HashMap::new(),
        }
    }

    /// 添加元数据
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// 配置变更事件类型
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConfigChangeEventType {
    /// 被监听的配置项更新
    Updated,
    /// 配置重载完成
    Reloaded,
    /// 配置推送被拒绝
    ValidationFailed,
}

/// 一次配置重载的结果
#[derive(Debug)]
pub struct ReloadReport {
    /// 重载标识
    pub reload_id: uuid::Uuid,
    /// 新快照版本
    pub version: u64,
    /// 发生变化的被监听配置键
    pub changed_keys: Vec<String>,
    /// 监听键发生变化的组件
    pub changed_beans: Vec<String>,
    /// 本次重载中被重置的单例（含级联）
    pub reset_beans: Vec<String>,
    /// 预热重建成功的单例
    pub rebuilt_beans: Vec<String>,
    /// 预热重建失败的单例
    pub failures: Vec<CascadeConstructionError>,
    /// 持有闸门的时长
    pub elapsed: Duration,
}

impl ReloadReport {
    /// 本次重载是否重置了指定组件
    pub fn was_reset(&self, bean_name: &str) -> bool {
        self.reset_beans.iter().any(|name| name == bean_name)
    }

    /// 是否所有预热重建均成功
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
