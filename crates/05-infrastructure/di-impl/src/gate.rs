//! 并发闸门
//!
//! 读写锁保护当前生效的状态：解析在读锁下进行，配置重载持有写锁。
//! 重载进行中时新的解析会等待，直到重载完成后再读取新的状态。

use di_abstractions::ContainerOptions;
use infrastructure_common::{DependencyError, RefreshError};
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

/// 在可选时限内等待
async fn bounded<F: Future>(limit: Option<Duration>, future: F) -> Result<F::Output, u64> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)),
        None => Ok(future.await),
    }
}

/// 并发闸门
#[derive(Debug)]
pub struct ConcurrencyGate<T> {
    state: RwLock<T>,
    closed: AtomicBool,
    resolution_timeout: Option<Duration>,
    reload_timeout: Option<Duration>,
}

impl<T> ConcurrencyGate<T> {
    /// 创建新的闸门
    pub fn new(state: T, options: &ContainerOptions) -> Self {
        Self {
            state: RwLock::new(state),
            closed: AtomicBool::new(false),
            resolution_timeout: options.resolution_timeout,
            reload_timeout: options.reload_timeout,
        }
    }

    /// 进入闸门（共享访问）
    ///
    /// 重载进行中时等待其完成，超过解析时限返回 [`DependencyError::GateTimeout`]
    pub async fn enter(&self) -> Result<RwLockReadGuard<'_, T>, DependencyError> {
        bounded(self.resolution_timeout, self.state.read())
            .await
            .map_err(|waited_ms| {
                warn!("等待配置重载超时: {} 毫秒", waited_ms);
                DependencyError::GateTimeout { waited_ms }
            })
    }

    /// 关闭闸门（独占访问）
    ///
    /// 等待进行中的解析全部退出，超过重载时限返回 [`RefreshError::GateTimeout`]
    pub async fn close(&self) -> Result<GateGuard<'_, T>, RefreshError> {
        let guard = bounded(self.reload_timeout, self.state.write())
            .await
            .map_err(|waited_ms| {
                warn!("等待重载闸门超时: {} 毫秒", waited_ms);
                RefreshError::GateTimeout { waited_ms }
            })?;
        self.closed.store(true, Ordering::SeqCst);
        debug!("闸门关闭");
        Ok(GateGuard {
            guard,
            closed: &self.closed,
            closed_at: Instant::now(),
        })
    }

    /// 是否正在重载
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// 重载阶段的时限
    pub fn reload_timeout(&self) -> Option<Duration> {
        self.reload_timeout
    }
}

/// 闸门关闭期间持有的独占访问，释放即开启闸门
pub struct GateGuard<'a, T> {
    guard: RwLockWriteGuard<'a, T>,
    closed: &'a AtomicBool,
    closed_at: Instant,
}

impl<T> GateGuard<'_, T> {
    /// 闸门已关闭的时长
    pub fn elapsed(&self) -> Duration {
        self.closed_at.elapsed()
    }
}

impl<T> Deref for GateGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for GateGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for GateGuard<'_, T> {
    fn drop(&mut self) {
        self.closed.store(false, Ordering::SeqCst);
        debug!("闸门开启，已关闭 {:?}", self.closed_at.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn options(resolution_ms: u64, reload_ms: u64) -> ContainerOptions {
        ContainerOptions::default()
            .with_resolution_timeout(Some(Duration::from_millis(resolution_ms)))
            .with_reload_timeout(Some(Duration::from_millis(reload_ms)))
    }

    #[tokio::test]
    async fn readers_share_the_gate() {
        let gate = ConcurrencyGate::new(1_u32, &options(50, 50));
        let first = gate.enter().await.unwrap();
        let second = gate.enter().await.unwrap();
        assert_eq!(*first + *second, 2);
        assert!(!gate.is_closed());
    }

    #[tokio::test]
    async fn closed_gate_blocks_readers_until_reopened() {
        let gate = Arc::new(ConcurrencyGate::new(1_u32, &options(1000, 50)));
        let mut guard = gate.close().await.unwrap();
        assert!(gate.is_closed());

        let reader = {
            let gate = gate.clone();
            tokio::spawn(async move { *gate.enter().await.unwrap() })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        *guard = 2;
        drop(guard);

        assert_eq!(reader.await.unwrap(), 2);
        assert!(!gate.is_closed());
    }

    #[tokio::test]
    async fn readers_time_out_while_closed() {
        let gate = ConcurrencyGate::new(1_u32, &options(20, 50));
        let _guard = gate.close().await.unwrap();
        assert!(matches!(
            gate.enter().await,
            Err(DependencyError::GateTimeout { waited_ms: 20 })
        ));
    }

    #[tokio::test]
    async fn close_times_out_while_readers_hold_the_gate() {
        let gate = ConcurrencyGate::new(1_u32, &options(50, 20));
        let _reader = gate.enter().await.unwrap();
        assert!(matches!(
            gate.close().await,
            Err(RefreshError::GateTimeout { waited_ms: 20 })
        ));
        assert!(!gate.is_closed());
    }
}
