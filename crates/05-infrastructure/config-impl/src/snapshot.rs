//! 配置快照
//!
//! 某一代配置的不可变视图。重载时整体替换，从不原地修改。

use infrastructure_common::ConfigError;
use serde_json::{Map, Value};
use std::sync::Arc;

/// 配置快照
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    root: Arc<Value>,
    version: u64,
}

impl ConfigSnapshot {
    /// 从 JSON 值创建快照，根节点必须是对象
    pub fn from_value(root: Value) -> Result<Self, ConfigError> {
        if !root.is_object() {
            return Err(ConfigError::parse_error(format!(
                "配置文档根节点必须是映射类型，实际为: {}",
                value_kind(&root)
            )));
        }
        Ok(Self {
            root: Arc::new(root),
            version: 1,
        })
    }

    /// 创建空快照
    pub fn empty() -> Self {
        Self {
            root: Arc::new(Value::Object(Map::new())),
            version: 0,
        }
    }

    /// 快照版本
    pub fn version(&self) -> u64 {
        self.version
    }

    /// 设置版本
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// 根节点
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// 按点分路径查找
    ///
    /// 数组节点支持数字下标，例如 `servers.0.host`
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        let mut current = self.root.as_ref();
        for segment in key.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// 检查配置键是否存在
    pub fn contains_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// 获取所有配置键（包含中间节点）
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        if let Value::Object(map) = self.root.as_ref() {
            collect_keys(map, String::new(), &mut keys);
        }
        keys
    }

    /// 派生一个新快照，版本号递增
    pub(crate) fn derive(&self, root: Value) -> Self {
        Self {
            root: Arc::new(root),
            version: self.version + 1,
        }
    }
}

impl PartialEq for ConfigSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

/// 递归收集所有键
fn collect_keys(map: &Map<String, Value>, prefix: String, keys: &mut Vec<String>) {
    for (key, value) in map {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        keys.push(full_key.clone());

        if let Value::Object(nested) = value {
            collect_keys(nested, full_key, keys);
        }
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_walks_dotted_paths() {
        let snapshot = ConfigSnapshot::from_value(json!({
            "mail": { "host": "a", "port": 25 },
            "servers": [{ "host": "s1" }]
        }))
        .unwrap();

        assert_eq!(snapshot.lookup("mail.host"), Some(&json!("a")));
        assert_eq!(snapshot.lookup("mail"), Some(&json!({ "host": "a", "port": 25 })));
        assert_eq!(snapshot.lookup("servers.0.host"), Some(&json!("s1")));
        assert_eq!(snapshot.lookup("mail.host.extra"), None);
        assert_eq!(snapshot.lookup("missing"), None);
    }

    #[test]
    fn non_mapping_roots_are_rejected() {
        assert!(matches!(
            ConfigSnapshot::from_value(json!("plain")),
            Err(ConfigError::ParseError { .. })
        ));
        assert!(ConfigSnapshot::from_value(Value::Null).is_err());
    }

    #[test]
    fn keys_include_intermediate_nodes() {
        let snapshot = ConfigSnapshot::from_value(json!({ "a": { "b": 1 }, "c": true })).unwrap();
        let mut keys = snapshot.keys();
        keys.sort();
        assert_eq!(keys, vec!["a", "a.b", "c"]);
    }
}
