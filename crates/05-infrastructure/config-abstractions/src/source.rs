//! 远程配置源抽象接口

use crate::events::ReloadReport;
use async_trait::async_trait;
use infrastructure_common::{ConfigError, RefreshError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// 配置文档格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    Yaml,
    Json,
    Toml,
}

impl Default for DocumentFormat {
    fn default() -> Self {
        Self::Yaml
    }
}

impl DocumentFormat {
    /// 根据扩展名识别格式
    pub fn from_extension(extension: &str) -> Result<Self, ConfigError> {
        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }

    /// 根据文件路径识别格式
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension)
    }
}

/// 配置推送
///
/// 远程配置源每次变更时推送的原始文档
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPush {
    /// 配置标识（例如 `app-prod.yaml`）
    pub data_id: String,
    /// 原始文档内容
    pub content: String,
    /// 文档格式
    pub format: DocumentFormat,
}

impl ConfigPush {
    /// 创建 YAML 推送
    pub fn yaml(data_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(data_id, content, DocumentFormat::Yaml)
    }

    /// 创建指定格式的推送
    pub fn new(
        data_id: impl Into<String>,
        content: impl Into<String>,
        format: DocumentFormat,
    ) -> Self {
        Self {
            data_id: data_id.into(),
            content: content.into(),
            format,
        }
    }
}

/// 配置推送处理器 trait
///
/// 远程配置源在配置变更时回调
#[async_trait]
pub trait ConfigPushHandler: Send + Sync {
    /// 处理一次配置推送
    async fn on_config_push(&self, push: ConfigPush) -> Result<ReloadReport, RefreshError>;
}

/// 远程配置源 trait
///
/// 启动时拉取一次配置，之后通过监听器推送变更
#[async_trait]
pub trait RemoteConfigSource: Send + Sync {
    /// 拉取当前配置
    async fn get_config(&self) -> Result<ConfigPush, ConfigError>;

    /// 注册配置变更监听器
    async fn add_watcher(&self, handler: Arc<dyn ConfigPushHandler>) -> Result<(), ConfigError>;

    /// 配置源名称
    fn name(&self) -> &str;
}
