//! 约定规范定义
//!
//! 组件名称约定：未显式命名时，使用类型名称的小驼峰形式

use crate::metadata::TypeInfo;

/// 由类型名称推导组件名称
///
/// `EmailSender` -> `emailSender`
pub fn bean_name_from_type_name(type_name: &str) -> String {
    let mut chars = type_name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// 获取类型的默认组件名称
pub fn bean_name_of<T: ?Sized + 'static>() -> String {
    bean_name_from_type_name(&TypeInfo::of::<T>().name)
}

/// 检查配置键是否为合法的点分路径
pub fn is_valid_config_key(key: &str) -> bool {
    !key.is_empty() && key.split('.').all(|segment| !segment.is_empty())
}
