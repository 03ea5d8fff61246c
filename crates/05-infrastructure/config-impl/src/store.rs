//! 配置存储
//!
//! 负责解析配置文档、应用环境变量覆盖、合并远程配置以及按键查询与比较。
//! 所有操作都返回新的快照，原快照保持不变。

use crate::env::EnvOverrideTable;
use crate::snapshot::{value_kind, ConfigSnapshot};
use config_abstractions::DocumentFormat;
use infrastructure_common::ConfigError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

/// 配置存储
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    default_format: DocumentFormat,
}

impl ConfigStore {
    /// 创建新的配置存储（默认 YAML）
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置默认文档格式
    pub fn with_default_format(mut self, format: DocumentFormat) -> Self {
        self.default_format = format;
        self
    }

    /// 默认文档格式
    pub fn default_format(&self) -> DocumentFormat {
        self.default_format
    }

    /// 解析配置文档，根节点必须是映射
    pub fn parse_document(&self, content: &str, format: DocumentFormat) -> Result<Value, ConfigError> {
        let value = match format {
            DocumentFormat::Yaml => {
                serde_yaml::from_str::<Value>(content).map_err(ConfigError::parse_error)?
            }
            DocumentFormat::Json => {
                serde_json::from_str::<Value>(content).map_err(ConfigError::parse_error)?
            }
            DocumentFormat::Toml => {
                let table = toml::from_str::<toml::Value>(content).map_err(ConfigError::parse_error)?;
                toml_to_json(&table)
            }
        };

        if !value.is_object() {
            return Err(ConfigError::parse_error(format!(
                "配置文档根节点必须是映射类型，实际为: {}",
                value_kind(&value)
            )));
        }
        Ok(value)
    }

    /// 解析配置文档为快照
    pub fn load(&self, content: &str, format: DocumentFormat) -> Result<ConfigSnapshot, ConfigError> {
        let value = self.parse_document(content, format)?;
        ConfigSnapshot::from_value(value)
    }

    /// 从本地文件加载快照，格式由扩展名决定
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ConfigSnapshot, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        debug!("加载配置文件: {}", path.display());
        let format = DocumentFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let snapshot = self.load(&content, format)?;
        info!("配置文件加载完成: {}", path.display());
        Ok(snapshot)
    }

    /// 应用进程环境变量覆盖
    pub fn apply_env_overrides(
        &self,
        snapshot: &ConfigSnapshot,
        table: &EnvOverrideTable,
    ) -> ConfigSnapshot {
        self.apply_overrides_with(snapshot, table, |name| std::env::var(name).ok())
    }

    /// 使用自定义查找函数应用覆盖，未设置的变量不产生任何影响
    pub fn apply_overrides_with<F>(
        &self,
        snapshot: &ConfigSnapshot,
        table: &EnvOverrideTable,
        lookup: F,
    ) -> ConfigSnapshot
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut root = snapshot.root().clone();
        for (env_name, key) in table.iter() {
            if let Some(value) = lookup(env_name) {
                debug!("环境变量 {} 覆盖配置 {}", env_name, key);
                set_path(&mut root, key, Value::String(value));
            }
        }
        snapshot.derive(root)
    }

    /// 深度合并远程文档，冲突时远程值优先
    pub fn merge(&self, snapshot: &ConfigSnapshot, remote: &Value) -> Result<ConfigSnapshot, ConfigError> {
        let Value::Object(remote_map) = remote else {
            return Err(ConfigError::parse_error(format!(
                "远程配置根节点必须是映射类型，实际为: {}",
                value_kind(remote)
            )));
        };

        let mut root = snapshot.root().clone();
        if let Value::Object(local_map) = &mut root {
            deep_merge(local_map, remote_map);
        }
        Ok(snapshot.derive(root))
    }

    /// 按点分路径取值
    ///
    /// 显式的 `null` 视为不存在。`required` 为真且不存在时返回 [`ConfigError::KeyNotFound`]。
    pub fn get(
        &self,
        snapshot: &ConfigSnapshot,
        key: &str,
        required: bool,
    ) -> Result<Option<Value>, ConfigError> {
        match snapshot.lookup(key) {
            Some(value) if !value.is_null() => Ok(Some(value.clone())),
            _ if required => Err(ConfigError::key_not_found(key)),
            _ => Ok(None),
        }
    }

    /// 按点分路径取值并反序列化
    pub fn get_as<T>(
        &self,
        snapshot: &ConfigSnapshot,
        key: &str,
        required: bool,
    ) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        self.get(snapshot, key, required)?
            .map(|value| convert(key, value))
            .transpose()
    }

    /// 比较两个快照中指定键的取值（深度比较），返回发生变化的键
    pub fn diff<'a, I>(&self, old: &ConfigSnapshot, new: &ConfigSnapshot, keys: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter()
            .filter(|key| old.lookup(key) != new.lookup(key))
            .map(str::to_string)
            .collect()
    }
}

/// 将 JSON 值反序列化为目标类型
pub fn convert<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, ConfigError> {
    serde_json::from_value(value).map_err(|e| ConfigError::TypeConversionError {
        key: key.to_string(),
        message: e.to_string(),
    })
}

/// 深度合并
fn deep_merge(local: &mut Map<String, Value>, remote: &Map<String, Value>) {
    for (key, remote_value) in remote {
        match (local.get_mut(key), remote_value) {
            (Some(Value::Object(local_nested)), Value::Object(remote_nested)) => {
                deep_merge(local_nested, remote_nested);
            }
            _ => {
                local.insert(key.clone(), remote_value.clone());
            }
        }
    }
}

/// 按点分路径写入，缺失或非映射的中间节点会被替换为映射
fn set_path(root: &mut Value, key: &str, value: Value) {
    let segments: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => return,
        };
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Value::Object(map) = current {
        map.insert(last.to_string(), value);
    }
}

/// 将 TOML 值转换为 JSON 值
fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Number(serde_json::Number::from(*i)),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Array(arr) => Value::Array(arr.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
    }
}
