//! 组件生命周期管理

use serde::{Deserialize, Serialize};

/// 组件生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    /// 单例模式 - 两次重置之间最多创建一个实例
    Singleton,
    /// 工厂模式 - 每次解析都创建新实例
    Factory,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::Singleton
    }
}

impl Lifecycle {
    /// 是否缓存实例
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Singleton)
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Singleton => write!(f, "singleton"),
            Self::Factory => write!(f, "factory"),
        }
    }
}

/// 单例实例状态
///
/// `Uninitialized -> Constructed`（首次解析）`-> Uninitialized`（重置或级联重置），
/// 在进程生命周期内循环往复，没有终止状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeanState {
    /// 未初始化
    Uninitialized,
    /// 已构建
    Constructed,
}

impl Default for BeanState {
    fn default() -> Self {
        Self::Uninitialized
    }
}
