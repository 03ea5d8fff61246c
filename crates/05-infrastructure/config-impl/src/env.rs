//! 环境变量覆盖表

/// 环境变量到配置键的映射表
///
/// 启动时在加载 bootstrap 文档之后、首次拉取远程配置之前应用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOverrideTable {
    entries: Vec<(String, String)>,
}

impl EnvOverrideTable {
    /// 创建空映射表
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// 添加映射
    pub fn with(mut self, env_name: impl Into<String>, config_key: impl Into<String>) -> Self {
        self.entries.push((env_name.into(), config_key.into()));
        self
    }

    /// 遍历 (环境变量名, 配置键)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(env_name, key)| (env_name.as_str(), key.as_str()))
    }

    /// 映射数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EnvOverrideTable {
    fn default() -> Self {
        Self::empty()
            .with("APP_ACTIVE", "app.active")
            .with("APP_CONTEXT_PATH", "app.context-path")
    }
}
