//! 演员配置（ActorConfig）与配置项（ActorOption）
//!
//! 配置项是按顺序作用在 `ActorConfig` 上的修改函数，后出现的配置项覆盖先前的值。
//!
//! ```rust
//! use callback_common::actor::config::{
//!     ActorConfig, with_actor_idle_timeout, with_drain_rebalanced_actors, with_serializer_name,
//! };
//! use std::time::Duration;
//!
//! let cfg = ActorConfig::from_options(vec![
//!     with_serializer_name("msgpack"),
//!     with_actor_idle_timeout(Duration::from_secs(60)),
//!     with_drain_rebalanced_actors(true),
//! ]);
//!
//! assert_eq!(cfg.serializer_type(), "msgpack");
//! assert_eq!(cfg.actor_idle_timeout(), Some(Duration::from_secs(60)));
//! assert!(cfg.drain_rebalanced_actors());
//! ```
use std::time::Duration;

/// 配置项：作用于 `ActorConfig` 的修改函数
pub type ActorOption = Box<dyn FnOnce(&mut ActorConfig) + Send>;

/// 单个演员类型的运行配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorConfig {
    serializer_type: String,
    actor_idle_timeout: Option<Duration>,
    actor_scan_interval: Option<Duration>,
    drain_ongoing_call_timeout: Option<Duration>,
    drain_rebalanced_actors: bool,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            serializer_type: ActorConfig::DEFAULT_SERIALIZER.to_string(),
            actor_idle_timeout: None,
            actor_scan_interval: None,
            drain_ongoing_call_timeout: None,
            drain_rebalanced_actors: false,
        }
    }
}

impl ActorConfig {
    pub const DEFAULT_SERIALIZER: &'static str = "json";

    /// 从默认配置出发，依次应用配置项
    pub fn from_options(opts: impl IntoIterator<Item = ActorOption>) -> Self {
        let mut cfg = Self::default();
        for opt in opts {
            opt(&mut cfg);
        }
        cfg
    }

    pub fn serializer_type(&self) -> &str {
        &self.serializer_type
    }

    /// 演员空闲多久后被回收
    pub fn actor_idle_timeout(&self) -> Option<Duration> {
        self.actor_idle_timeout
    }

    /// 空闲演员的扫描间隔
    pub fn actor_scan_interval(&self) -> Option<Duration> {
        self.actor_scan_interval
    }

    /// 再平衡时等待进行中调用完成的最长时间
    pub fn drain_ongoing_call_timeout(&self) -> Option<Duration> {
        self.drain_ongoing_call_timeout
    }

    pub fn drain_rebalanced_actors(&self) -> bool {
        self.drain_rebalanced_actors
    }
}

pub fn with_serializer_name(name: impl Into<String>) -> ActorOption {
    let name = name.into();
    Box::new(move |cfg| cfg.serializer_type = name)
}

pub fn with_actor_idle_timeout(timeout: Duration) -> ActorOption {
    Box::new(move |cfg| cfg.actor_idle_timeout = Some(timeout))
}

pub fn with_actor_scan_interval(interval: Duration) -> ActorOption {
    Box::new(move |cfg| cfg.actor_scan_interval = Some(interval))
}

pub fn with_drain_ongoing_call_timeout(timeout: Duration) -> ActorOption {
    Box::new(move |cfg| cfg.drain_ongoing_call_timeout = Some(timeout))
}

pub fn with_drain_rebalanced_actors(drain: bool) -> ActorOption {
    Box::new(move |cfg| cfg.drain_rebalanced_actors = drain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_json_serializer() {
        let cfg = ActorConfig::from_options(Vec::new());
        assert_eq!(cfg.serializer_type(), "json");
        assert_eq!(cfg.actor_idle_timeout(), None);
        assert!(!cfg.drain_rebalanced_actors());
    }

    #[test]
    fn later_options_win() {
        let cfg = ActorConfig::from_options(vec![
            with_actor_scan_interval(Duration::from_secs(30)),
            with_drain_ongoing_call_timeout(Duration::from_secs(5)),
            with_actor_scan_interval(Duration::from_secs(10)),
        ]);
        assert_eq!(cfg.actor_scan_interval(), Some(Duration::from_secs(10)));
        assert_eq!(cfg.drain_ongoing_call_timeout(), Some(Duration::from_secs(5)));
    }
}
