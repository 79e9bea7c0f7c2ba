//! 进程内回调服务（callback-service）
//!
//! `callback-common` 中 `Service` 契约的参考实现，不含传输层：
//! 外部运行时（或测试）在解码请求后直接调用 `InProcessService` 的调度入口。

mod actor_registry;
mod auth;
mod in_process_service;
mod lifecycle;
mod registry;
mod topic_registrar;

pub mod config;

pub use actor_registry::{ActorEntityConfig, ActorRuntimeConfig};
pub use auth::AppTokenAuthenticator;
pub use config::ServiceConfig;
pub use in_process_service::InProcessService;
pub use lifecycle::ServiceState;
pub use topic_registrar::{TopicRoutes, TopicRule, TopicSubscription};
