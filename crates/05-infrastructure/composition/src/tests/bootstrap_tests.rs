//! 应用启动集成测试

use crate::{ApplicationBootstrapper, BootstrapOptions};
use async_trait::async_trait;
use config_abstractions::{ConfigPush, ConfigPushHandler, RemoteConfigSource};
use config_impl::{FileConfigSource, StaticConfigSource};
use di_abstractions::{Bean, BeanDefinition, InjectedFields};
use infrastructure_common::{
    ConfigError, DependencyError, FieldBinding, InfrastructureError, Lifecycle, RefreshError,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[derive(Debug)]
struct EmailSender {
    host: String,
    port: u16,
}

impl Bean for EmailSender {
    fn bindings() -> Vec<FieldBinding> {
        vec![
            FieldBinding::config_ref("host", "mail.host"),
            FieldBinding::config_ref("port", "mail.port"),
        ]
    }

    fn construct(fields: &InjectedFields) -> anyhow::Result<Self> {
        Ok(Self {
            host: fields.value("host")?,
            port: fields.value("port")?,
        })
    }

    fn refresh_scope() -> Option<Vec<String>> {
        Some(vec!["mail".to_string()])
    }
}

fn write_bootstrap(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("bootstrap.yaml");
    std::fs::write(&path, content).unwrap();
    path
}

fn options(path: &Path) -> BootstrapOptions {
    BootstrapOptions::new(path).with_env_lookup(|name| match name {
        "APP_ACTIVE" => Some("dev".to_string()),
        _ => None,
    })
}

const BOOTSTRAP: &str = "app:\n  name: blog\n  active: local\nmail:\n  host: a\n  port: 25\n";

#[tokio::test]
async fn bootstrap_merges_local_env_and_remote_layers() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bootstrap(&dir, BOOTSTRAP);

    let mut bootstrapper = ApplicationBootstrapper::new(options(&path));
    bootstrapper.register_type::<EmailSender>().unwrap();

    let source = Arc::new(StaticConfigSource::yaml("blog-dev.yaml", "mail:\n  host: remote\n"));
    let application = bootstrapper.bootstrap(source.clone()).await.unwrap();
    let container = application.container();

    assert_eq!(application.initial_report().version, 2);
    assert_eq!(application.source().name(), "StaticConfigSource");
    assert_eq!(source.watcher_count(), 1);

    let active: String = container.required_config_value("app.active").await.unwrap();
    assert_eq!(active, "dev");
    let sender = container.resolve_type::<EmailSender>().await.unwrap();
    assert_eq!((sender.host.as_str(), sender.port), ("remote", 25));

    let results = source.publish("mail:\n  host: b\n  port: 2525\n").await;
    assert_eq!(results.len(), 1);
    let report = results.into_iter().next().unwrap().unwrap();
    assert!(report.was_reset("emailSender"));

    let refreshed = container.resolve_type::<EmailSender>().await.unwrap();
    assert_eq!((refreshed.host.as_str(), refreshed.port), ("b", 2525));
    assert!(!Arc::ptr_eq(&sender, &refreshed));
    assert_eq!(container.active_version().await.unwrap(), 3);
}

#[tokio::test]
async fn singletons_built_before_the_first_fetch_are_refreshed() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bootstrap(&dir, BOOTSTRAP);

    let mut bootstrapper = ApplicationBootstrapper::new(options(&path));
    bootstrapper
        .register_type::<EmailSender>()
        .unwrap()
        .register(
            BeanDefinition::new("remoteSource", Lifecycle::Singleton, |fields| {
                // 配置源组件构建时会一并构建邮件组件
                let _sender = fields.bean::<EmailSender>("sender")?;
                Ok(StaticConfigSource::yaml("blog-dev.yaml", "mail:\n  host: remote\n"))
            })
            .with_bean_ref("sender", "emailSender"),
        )
        .unwrap();

    let application = bootstrapper
        .bootstrap_with_source_bean::<StaticConfigSource>("remoteSource")
        .await
        .unwrap();

    assert!(application.initial_report().was_reset("emailSender"));
    let sender = application
        .container()
        .resolve_type::<EmailSender>()
        .await
        .unwrap();
    assert_eq!(sender.host, "remote");
}

#[tokio::test]
async fn file_source_bean_is_configured_from_bootstrap_values() {
    let dir = tempfile::tempdir().unwrap();
    let remote = dir.path().join("remote.yaml");
    std::fs::write(&remote, "mail:\n  host: from-file\n").unwrap();
    let path = write_bootstrap(
        &dir,
        &format!(
            "{BOOTSTRAP}config:\n  remote:\n    path: {}\n",
            remote.display()
        ),
    );

    let mut bootstrapper = ApplicationBootstrapper::new(options(&path));
    bootstrapper
        .register_type::<EmailSender>()
        .unwrap()
        .register(
            BeanDefinition::new("remoteSource", Lifecycle::Singleton, |fields| {
                let path: String = fields.value("path")?;
                Ok(FileConfigSource::new(path)?.with_debounce_delay(Duration::from_millis(20)))
            })
            .with_config_ref("path", "config.remote.path"),
        )
        .unwrap();

    let application = bootstrapper
        .bootstrap_with_source_bean::<FileConfigSource>("remoteSource")
        .await
        .unwrap();
    let container = application.container().clone();
    assert_eq!(
        container.resolve_type::<EmailSender>().await.unwrap().host,
        "from-file"
    );

    // 给文件监控器留出注册时间
    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(&remote, "mail:\n  host: edited\n").unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut host = String::new();
    while Instant::now() < deadline {
        host = container.resolve_type::<EmailSender>().await.unwrap().host.clone();
        if host == "edited" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(host, "edited");
}

#[tokio::test]
async fn missing_bootstrap_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let bootstrapper = ApplicationBootstrapper::new(options(&dir.path().join("absent.yaml")));
    let source = Arc::new(StaticConfigSource::yaml("blog-dev.yaml", "{}\n"));

    assert!(matches!(
        bootstrapper.bootstrap(source).await,
        Err(InfrastructureError::ConfigError {
            source: ConfigError::FileNotFound { .. }
        })
    ));
}

#[tokio::test]
async fn registration_errors_surface_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bootstrap(&dir, BOOTSTRAP);
    let mut bootstrapper = ApplicationBootstrapper::new(options(&path));
    bootstrapper.register_type::<EmailSender>().unwrap();

    assert!(matches!(
        bootstrapper.register_type::<EmailSender>(),
        Err(InfrastructureError::DependencyError {
            source: DependencyError::DuplicateBeanName { .. }
        })
    ));
    assert!(matches!(
        bootstrapper.register_watch("emailSender", Vec::<String>::new()),
        Err(InfrastructureError::DependencyError {
            source: DependencyError::EmptyWatchKeys { .. }
        })
    ));
}

#[tokio::test]
async fn malformed_initial_remote_document_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bootstrap(&dir, BOOTSTRAP);
    let bootstrapper = ApplicationBootstrapper::new(options(&path));
    let source = Arc::new(StaticConfigSource::yaml("blog-dev.yaml", "mail: [broken\n"));

    assert!(matches!(
        bootstrapper.bootstrap(source).await,
        Err(InfrastructureError::RefreshError {
            source: RefreshError::Config { .. }
        })
    ));
}

/// 每次拉取返回下一个文档，注册监听时不回放历史变更
struct ShiftingSource {
    documents: Vec<&'static str>,
    fetches: AtomicUsize,
    watchers: AtomicUsize,
}

#[async_trait]
impl RemoteConfigSource for ShiftingSource {
    async fn get_config(&self) -> Result<ConfigPush, ConfigError> {
        let index = self.fetches.fetch_add(1, Ordering::SeqCst);
        let document = self.documents[index.min(self.documents.len() - 1)];
        Ok(ConfigPush::yaml("blog-dev.yaml", document))
    }

    async fn add_watcher(&self, _handler: Arc<dyn ConfigPushHandler>) -> Result<(), ConfigError> {
        self.watchers.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "ShiftingSource"
    }
}

#[tokio::test]
async fn change_made_while_registering_the_watcher_is_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bootstrap(&dir, BOOTSTRAP);
    let mut bootstrapper = ApplicationBootstrapper::new(options(&path));
    bootstrapper.register_type::<EmailSender>().unwrap();

    let source = Arc::new(ShiftingSource {
        documents: vec!["mail:\n  host: first\n", "mail:\n  host: second\n"],
        fetches: AtomicUsize::new(0),
        watchers: AtomicUsize::new(0),
    });
    let application = bootstrapper.bootstrap(source.clone()).await.unwrap();

    assert_eq!(source.watchers.load(Ordering::SeqCst), 1);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    assert_eq!(application.initial_report().version, 3);
    let sender = application
        .container()
        .resolve_type::<EmailSender>()
        .await
        .unwrap();
    assert_eq!(sender.host, "second");
}

#[tokio::test]
async fn unchanged_source_is_merged_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bootstrap(&dir, BOOTSTRAP);
    let bootstrapper = ApplicationBootstrapper::new(options(&path));

    let source = Arc::new(ShiftingSource {
        documents: vec!["mail:\n  host: only\n"],
        fetches: AtomicUsize::new(0),
        watchers: AtomicUsize::new(0),
    });
    let application = bootstrapper.bootstrap(source.clone()).await.unwrap();

    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    assert_eq!(application.initial_report().version, 2);
    assert_eq!(application.container().stats().await.unwrap().completed_reloads, 1);
}
