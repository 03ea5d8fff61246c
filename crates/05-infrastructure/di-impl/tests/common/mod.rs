//! 集成测试共用的组件与配置

#![allow(dead_code)]

use config_abstractions::{ConfigPush, DocumentFormat};
use config_impl::{ConfigSnapshot, ConfigStore};
use di_abstractions::{Bean, InjectedFields};
use infrastructure_common::FieldBinding;

/// 从 YAML 文本创建快照
pub fn snapshot(yaml: &str) -> ConfigSnapshot {
    ConfigStore::new()
        .load(yaml, DocumentFormat::Yaml)
        .expect("测试配置应该可以解析")
}

/// 创建 YAML 推送
pub fn push(yaml: &str) -> ConfigPush {
    ConfigPush::yaml("blog-dev.yaml", yaml)
}

/// 邮件发送组件，监听 `mail` 配置
#[derive(Debug)]
pub struct EmailSender {
    pub host: String,
}

impl Bean for EmailSender {
    fn bindings() -> Vec<FieldBinding> {
        vec![FieldBinding::config_ref("host", "mail.host")]
    }

    fn construct(fields: &InjectedFields) -> anyhow::Result<Self> {
        Ok(Self {
            host: fields.value("host")?,
        })
    }

    fn refresh_scope() -> Option<Vec<String>> {
        Some(vec!["mail".to_string()])
    }
}

/// 通知服务，引用邮件发送组件
#[derive(Debug)]
pub struct NoticeService {
    pub sender: std::sync::Arc<EmailSender>,
}

impl Bean for NoticeService {
    fn bindings() -> Vec<FieldBinding> {
        vec![FieldBinding::bean_ref("sender", "emailSender")]
    }

    fn construct(fields: &InjectedFields) -> anyhow::Result<Self> {
        Ok(Self {
            sender: fields.bean("sender")?,
        })
    }
}
