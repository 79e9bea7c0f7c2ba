//! 服务生命周期：`Created → Running → (Draining →) Stopped`
//!
//! - 停止信号由 `CancellationToken` 广播给所有进行中的调用；
//! - 进行中的调用以 `TaskTracker` 计数，优雅停止据此等待排空。
//!
use callback_common::{ServiceError, ServiceResult};
use parking_lot::Mutex;
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tokio_util::task::task_tracker::TaskTrackerToken;
use tracing::{info, warn};

/// 服务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
    /// 已创建，可注册处理器
    Created,
    /// 正在服务回调
    Running,
    /// 优雅停止中：拒绝新调用，等待进行中的调用完成
    Draining,
    /// 已停止
    Stopped,
}

impl ServiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) struct Lifecycle {
    state: Mutex<ServiceState>,
    shutdown: CancellationToken,
    inflight: TaskTracker,
    // 优雅停止超时后记录所用时限，供并发的其他停止调用返回同样的结果
    drain_timed_out: Mutex<Option<Duration>>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(ServiceState::Created),
            shutdown: CancellationToken::new(),
            inflight: TaskTracker::new(),
            drain_timed_out: Mutex::new(None),
        }
    }

    pub(crate) fn state(&self) -> ServiceState {
        *self.state.lock()
    }

    pub(crate) fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub(crate) fn inflight(&self) -> usize {
        self.inflight.len()
    }

    /// 仅在 `Created` 状态下允许注册
    pub(crate) fn ensure_created(&self) -> ServiceResult<()> {
        match self.state() {
            ServiceState::Created => Ok(()),
            other => Err(ServiceError::InvalidState {
                expected: ServiceState::Created.as_str(),
                actual: other.as_str(),
            }),
        }
    }

    pub(crate) fn start(&self) -> ServiceResult<()> {
        let mut state = self.state.lock();
        if *state != ServiceState::Created {
            return Err(ServiceError::InvalidState {
                expected: ServiceState::Created.as_str(),
                actual: state.as_str(),
            });
        }
        *state = ServiceState::Running;
        Ok(())
    }

    /// 登记一次进行中的调用；令牌被释放即视为调用结束
    pub(crate) fn enter(&self) -> ServiceResult<TaskTrackerToken> {
        // 持锁取令牌：一旦进入 Draining，不会再有新的调用被计数
        let state = self.state.lock();
        match *state {
            ServiceState::Running => Ok(self.inflight.token()),
            other => Err(ServiceError::NotServing {
                state: other.as_str(),
            }),
        }
    }

    /// 立即停止；返回停止前的状态
    pub(crate) fn stop(&self) -> ServiceState {
        let prev = {
            let mut state = self.state.lock();
            std::mem::replace(&mut *state, ServiceState::Stopped)
        };
        self.inflight.close();
        self.shutdown.cancel();
        prev
    }

    pub(crate) async fn graceful_stop(&self, timeout: Duration) -> ServiceResult<()> {
        let prev = {
            let mut state = self.state.lock();
            let prev = *state;
            if prev == ServiceState::Running {
                *state = ServiceState::Draining;
            }
            prev
        };

        match prev {
            ServiceState::Running => {}
            ServiceState::Created => {
                self.stop();
                return Ok(());
            }
            ServiceState::Draining => {
                // 另一次优雅停止正在进行，等它结束并沿用其结果
                self.shutdown.cancelled().await;
                return match *self.drain_timed_out.lock() {
                    Some(timeout) => Err(ServiceError::ShutdownTimeout { timeout }),
                    None => Ok(()),
                };
            }
            ServiceState::Stopped => return Ok(()),
        }

        self.inflight.close();
        info!(
            inflight = self.inflight.len(),
            timeout_ms = timeout.as_millis() as u64,
            "draining in-flight callbacks"
        );

        let drained = tokio::time::timeout(timeout, self.inflight.wait()).await;
        if drained.is_err() {
            *self.drain_timed_out.lock() = Some(timeout);
        }
        self.stop();

        match drained {
            Ok(()) => Ok(()),
            Err(_) => {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "graceful stop timed out, remaining callbacks cancelled"
                );
                Err(ServiceError::ShutdownTimeout { timeout })
            }
        }
    }

    pub(crate) async fn stopped(&self) {
        self.shutdown.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_only_from_created() {
        let lc = Lifecycle::new();
        assert!(lc.ensure_created().is_ok());
        lc.start().unwrap();
        assert_eq!(lc.state(), ServiceState::Running);
        assert!(matches!(
            lc.start(),
            Err(ServiceError::InvalidState { actual: "running", .. })
        ));
        assert!(lc.ensure_created().is_err());
    }

    #[test]
    fn enter_requires_running() {
        let lc = Lifecycle::new();
        assert!(matches!(
            lc.enter(),
            Err(ServiceError::NotServing { state: "created" })
        ));
        lc.start().unwrap();
        let token = lc.enter().unwrap();
        assert_eq!(lc.inflight(), 1);
        drop(token);
        assert_eq!(lc.inflight(), 0);
    }

    #[tokio::test]
    async fn graceful_stop_from_created_stops_immediately() {
        let lc = Lifecycle::new();
        lc.graceful_stop(Duration::from_millis(10)).await.unwrap();
        assert_eq!(lc.state(), ServiceState::Stopped);
        assert!(lc.shutdown_token().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn graceful_stop_times_out_with_inflight_work() {
        let lc = Lifecycle::new();
        lc.start().unwrap();
        let _held = lc.enter().unwrap();

        let err = lc
            .graceful_stop(Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ShutdownTimeout { .. }));
        assert_eq!(lc.state(), ServiceState::Stopped);
        assert!(lc.shutdown_token().is_cancelled());
    }

    #[test]
    fn stop_is_idempotent() {
        let lc = Lifecycle::new();
        lc.start().unwrap();
        assert_eq!(lc.stop(), ServiceState::Running);
        assert_eq!(lc.stop(), ServiceState::Stopped);
    }
}
