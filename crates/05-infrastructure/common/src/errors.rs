//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {message}")]
    ParseError { message: String },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置类型转换失败: {key}, 原因: {message}")]
    TypeConversionError { key: String, message: String },

    #[error("不支持的配置格式: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("配置源失败: {message}")]
    SourceError { message: String },
}

impl ConfigError {
    /// 创建解析错误
    pub fn parse_error(message: impl std::fmt::Display) -> Self {
        Self::ParseError {
            message: message.to_string(),
        }
    }

    /// 创建键不存在错误
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件名称重复: {name}")]
    DuplicateBeanName { name: String },

    #[error("组件刷新需要检查的key不能为空: {name}")]
    EmptyWatchKeys { name: String },

    #[error("组件未注册: {name}")]
    BeanNotFound { name: String },

    #[error("循环依赖检测到: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("依赖解析深度超出限制: {name}, 最大深度: {max_depth}")]
    ResolutionDepthExceeded { name: String, max_depth: usize },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed {
        type_name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("组件类型不匹配: {name}, 期望类型: {expected}")]
    TypeMismatch { name: String, expected: String },

    #[error("组件字段未绑定: {bean}.{field}")]
    FieldNotBound { bean: String, field: String },

    #[error("等待配置重载超时: 已等待 {waited_ms} 毫秒")]
    GateTimeout { waited_ms: u64 },

    #[error("配置错误: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}

impl DependencyError {
    /// 创建组件未注册错误
    pub fn bean_not_found(name: impl Into<String>) -> Self {
        Self::BeanNotFound { name: name.into() }
    }

    /// 是否为缺失配置键导致的错误
    pub fn is_missing_config_key(&self) -> bool {
        matches!(
            self,
            Self::Config {
                source: ConfigError::KeyNotFound { .. }
            }
        )
    }
}

/// 配置重载错误类型
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("配置推送被拒绝: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("等待重载闸门超时: 已等待 {waited_ms} 毫秒")]
    GateTimeout { waited_ms: u64 },
}

/// 级联重建失败
///
/// 单个组件在级联重置后重建失败，只影响该组件，不中断本次重载
#[derive(Error, Debug)]
#[error("级联重建组件失败: {bean_name}, 原因: {source}")]
pub struct CascadeConstructionError {
    /// 组件名称
    pub bean_name: String,
    /// 失败原因
    #[source]
    pub source: DependencyError,
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("配置重载错误: {source}")]
    RefreshError {
        #[from]
        source: RefreshError,
    },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type RefreshResult<T> = Result<T, RefreshError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_key_is_detected_through_dependency_error() {
        let error: DependencyError = ConfigError::key_not_found("mail.host").into();
        assert!(error.is_missing_config_key());
        assert!(error.to_string().contains("mail.host"));

        let other = DependencyError::bean_not_found("emailSender");
        assert!(!other.is_missing_config_key());
    }

    #[test]
    fn infrastructure_error_wraps_layer_errors() {
        let error: InfrastructureError = RefreshError::GateTimeout { waited_ms: 50 }.into();
        assert!(matches!(
            error,
            InfrastructureError::RefreshError {
                source: RefreshError::GateTimeout { waited_ms: 50 }
            }
        ));
    }
}
