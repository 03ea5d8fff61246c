//! 配置刷新协调器
//!
//! 收到配置推送后：先在闸门外解析并合并新文档，失败则保持原配置；
//! 随后关闭闸门，比较被监听的配置键，重置变化的单例并沿反向依赖级联，
//! 最后替换快照并重新开启闸门。

use crate::registry::BeanRegistryImpl;
use config_abstractions::{ConfigChangeEvent, ConfigPush, ReloadReport};
use config_impl::ConfigSnapshot;
use di_abstractions::{BeanRegistry, ContainerOptions, RefreshRegistration};
use infrastructure_common::{CascadeConstructionError, RefreshError};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, info_span, warn, Instrument};

/// 事件通道容量
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// 配置刷新协调器
pub struct RefreshCoordinator {
    registrations: Vec<RefreshRegistration>,
    /// 组件名称 -> 引用它的组件
    reverse_dependencies: HashMap<String, BTreeSet<String>>,
    /// 本地配置（启动配置 + 环境变量覆盖），远程文档合并于其上
    local_base: ConfigSnapshot,
    eager_rebuild: bool,
    events: broadcast::Sender<ConfigChangeEvent>,
    /// 同一时间只允许一次重载
    reload_lock: Mutex<()>,
    completed_reloads: AtomicU64,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("registrations", &self.registrations)
            .field("reverse_dependencies", &self.reverse_dependencies)
            .field("eager_rebuild", &self.eager_rebuild)
            .field("completed_reloads", &self.completed_reloads)
            .finish()
    }
}

impl RefreshCoordinator {
    /// 创建协调器
    pub fn new(
        registrations: Vec<RefreshRegistration>,
        reverse_dependencies: HashMap<String, BTreeSet<String>>,
        local_base: ConfigSnapshot,
        options: &ContainerOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            registrations,
            reverse_dependencies,
            local_base,
            eager_rebuild: options.eager_rebuild,
            events,
            reload_lock: Mutex::new(()),
            completed_reloads: AtomicU64::new(0),
        }
    }

    /// 由组件定义推导反向依赖：每个组件引用字段都产生一条反向边
    pub fn derive_reverse_dependencies<'a, I>(definitions: I) -> HashMap<String, BTreeSet<String>>
    where
        I: IntoIterator<Item = &'a di_abstractions::BeanDefinition>,
    {
        let mut reverse: HashMap<String, BTreeSet<String>> = HashMap::new();
        for definition in definitions {
            for target in definition.bean_dependencies() {
                reverse
                    .entry(target.to_string())
                    .or_default()
                    .insert(definition.name().to_string());
            }
        }
        reverse
    }

    pub fn registrations(&self) -> &[RefreshRegistration] {
        &self.registrations
    }

    /// 直接引用指定组件的组件
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.reverse_dependencies
            .get(name)
            .map(|dependents| dependents.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 订阅配置变更事件
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChangeEvent> {
        self.events.subscribe()
    }

    /// 已完成的重载次数
    pub fn completed_reloads(&self) -> u64 {
        self.completed_reloads.load(Ordering::SeqCst)
    }

    fn publish(&self, event: ConfigChangeEvent) {
        // 没有订阅者时发送失败，忽略即可
        let _ = self.events.send(event);
    }

    fn reject(&self, push: &ConfigPush, error: RefreshError) -> RefreshError {
        error!("配置推送被拒绝: {} - {}", push.data_id, error);
        self.publish(ConfigChangeEvent::validation_failed(
            &push.data_id,
            "refresh",
            error.to_string(),
        ));
        error
    }

    /// 处理一次配置推送
    pub async fn on_config_push(
        &self,
        registry: &BeanRegistryImpl,
        push: ConfigPush,
    ) -> Result<ReloadReport, RefreshError> {
        let _serial = self.reload_lock.lock().await;
        let reload_id = uuid::Uuid::new_v4();
        let span = info_span!(
            "config_reload",
            reload_id = %reload_id,
            data_id = %push.data_id,
            version = tracing::field::Empty,
        );
        self.reload(registry, push, reload_id)
            .instrument(span)
            .await
    }

    async fn reload(
        &self,
        registry: &BeanRegistryImpl,
        push: ConfigPush,
        reload_id: uuid::Uuid,
    ) -> Result<ReloadReport, RefreshError> {
        let store = registry.store();

        // 闸门外完成解析与合并，失败时保持当前配置
        let merged = match store
            .parse_document(&push.content, push.format)
            .and_then(|document| store.merge(&self.local_base, &document))
        {
            Ok(merged) => merged,
            Err(e) => return Err(self.reject(&push, e.into())),
        };

        let mut state = match registry.gate().close().await {
            Ok(state) => state,
            Err(e) => return Err(self.reject(&push, e)),
        };

        let old = state.snapshot().clone();
        let new = merged.with_version(old.version() + 1);
        tracing::Span::current().record("version", new.version());

        let mut changed_keys = BTreeSet::new();
        let mut changed_beans = Vec::new();
        for registration in &self.registrations {
            let changed = store.diff(
                &old,
                &new,
                registration.watched_keys.iter().map(String::as_str),
            );
            if changed.is_empty() {
                continue;
            }
            info!("组件 {} 监听的配置发生变化: {:?}", registration.bean_name, changed);
            for key in &changed {
                if changed_keys.insert(key.clone()) {
                    self.publish(ConfigChangeEvent::updated(
                        key,
                        old.lookup(key).cloned(),
                        new.lookup(key).cloned(),
                        &push.data_id,
                    ));
                }
            }
            changed_beans.push(registration.bean_name.clone());
        }

        let Cascade { reset_beans, dropped } = self.cascade(registry, &state, &changed_beans);
        let version = new.version();
        state.swap_snapshot(new);

        let mut rebuilt_beans = Vec::new();
        let mut failures = Vec::new();
        if self.eager_rebuild {
            let deadline = registry.gate().reload_timeout();
            // 只重建确实丢弃了实例的单例，从未解析过的组件保持未初始化
            for name in &dropped {
                if deadline.is_some_and(|limit| state.elapsed() >= limit) {
                    warn!("预热重建超出时限，剩余组件将在下次解析时构建");
                    break;
                }
                match registry.resolve_in(&state, name) {
                    Ok(_) => rebuilt_beans.push(name.clone()),
                    Err(source) => {
                        warn!("级联重建组件失败: {} - {}", name, source);
                        failures.push(CascadeConstructionError {
                            bean_name: name.clone(),
                            source,
                        });
                    }
                }
            }
        }

        let elapsed = state.elapsed();
        drop(state);

        self.completed_reloads.fetch_add(1, Ordering::SeqCst);
        self.publish(
            ConfigChangeEvent::reloaded(&push.data_id, "refresh")
                .with_metadata("version", version.to_string())
                .with_metadata("reload_id", reload_id.to_string()),
        );
        info!(
            "配置重载完成: 版本 {}, 变化的配置 {}, 重置组件 {}, 耗时 {:?}",
            version,
            changed_keys.len(),
            reset_beans.len(),
            elapsed
        );

        Ok(ReloadReport {
            reload_id,
            version,
            changed_keys: changed_keys.into_iter().collect(),
            changed_beans,
            reset_beans,
            rebuilt_beans,
            failures,
            elapsed,
        })
    }

    /// 重置变化的组件并沿反向依赖级联
    ///
    /// 每个组件在一次重载中最多处理一次，环路也能终止。
    /// 只有单例会被重置，但级联会穿过工厂组件继续传播。
    fn cascade(
        &self,
        registry: &BeanRegistryImpl,
        state: &crate::registry::ActiveState,
        changed_beans: &[String],
    ) -> Cascade {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<(&str, Option<&str>)> =
            changed_beans.iter().map(|name| (name.as_str(), None)).collect();
        let mut cascade = Cascade::default();

        while let Some((name, origin)) = queue.pop_front() {
            if !visited.insert(name) {
                continue;
            }
            if let Some(origin) = origin {
                info!("级联重置: {} <- {}", name, origin);
            }

            let is_singleton = registry
                .definition(name)
                .is_some_and(|definition| definition.lifecycle().is_cached());
            if is_singleton {
                if registry.reset_in(state, name) {
                    cascade.dropped.push(name.to_string());
                }
                cascade.reset_beans.push(name.to_string());
            }

            if let Some(dependents) = self.reverse_dependencies.get(name) {
                queue.extend(
                    dependents
                        .iter()
                        .filter(|dependent| !visited.contains(dependent.as_str()))
                        .map(|dependent| (dependent.as_str(), Some(name))),
                );
            }
        }

        cascade
    }
}

/// 一次级联的结果
#[derive(Debug, Default)]
struct Cascade {
    /// 级联经过的全部单例
    reset_beans: Vec<String>,
    /// 其中确实丢弃了缓存实例的单例
    dropped: Vec<String>,
}
