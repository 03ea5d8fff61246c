//! 元数据定义
//!
//! 描述组件字段的注入方式：引用另一个组件，或读取一个配置值

use serde::{Deserialize, Serialize};

/// 字段绑定类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingKind {
    /// 引用另一个组件
    BeanRef(String),
    /// 读取配置值（点分路径）
    ConfigRef(String),
}

/// 字段绑定
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldBinding {
    /// 字段名称
    pub field_name: String,
    /// 绑定类型
    pub kind: BindingKind,
}

impl FieldBinding {
    /// 创建组件引用字段
    pub fn bean_ref(field_name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            kind: BindingKind::BeanRef(target.into()),
        }
    }

    /// 创建配置值字段
    pub fn config_ref(field_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            kind: BindingKind::ConfigRef(key.into()),
        }
    }

    /// 引用的组件名称（如果是组件引用）
    pub fn bean_target(&self) -> Option<&str> {
        match &self.kind {
            BindingKind::BeanRef(target) => Some(target),
            BindingKind::ConfigRef(_) => None,
        }
    }

    /// 配置键（如果是配置值）
    pub fn config_key(&self) -> Option<&str> {
        match &self.kind {
            BindingKind::ConfigRef(key) => Some(key),
            BindingKind::BeanRef(_) => None,
        }
    }
}

/// 类型信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 简短类型名称
    pub name: String,
    /// 完整类型路径
    pub module_path: String,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full = std::any::type_name::<T>();
        let without_generics = full.split('<').next().unwrap_or(full);
        Self {
            name: without_generics
                .rsplit("::")
                .next()
                .unwrap_or(without_generics)
                .to_string(),
            module_path: full.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmailSender;

    #[test]
    fn type_info_strips_module_path_and_generics() {
        let info = TypeInfo::of::<EmailSender>();
        assert_eq!(info.name, "EmailSender");
        assert!(info.module_path.ends_with("EmailSender"));

        let generic = TypeInfo::of::<Vec<EmailSender>>();
        assert_eq!(generic.name, "Vec");
    }

    #[test]
    fn field_binding_accessors() {
        let bean = FieldBinding::bean_ref("sender", "emailSender");
        assert_eq!(bean.bean_target(), Some("emailSender"));
        assert_eq!(bean.config_key(), None);

        let value = FieldBinding::config_ref("host", "mail.host");
        assert_eq!(value.config_key(), Some("mail.host"));
        assert_eq!(value.bean_target(), None);
    }
}
