//! 应用回调契约（callback-common）
//!
//! 描述一个托管于边车运行时旁的应用需要向运行时暴露的回调面：
//! - 调用上下文（`context`）：可取消、可设截止时间、携带入站元数据；
//! - 事件与内容（`event`）：服务调用、主题消息、输入绑定、定时任务的载荷；
//! - 处理器（`handler`）：各类回调的函数类型与 `TopicEventSubscriber` 能力；
//! - 演员（`actor`）：演员工厂与按序应用的配置项；
//! - 服务（`service`）：注册点与启动/停止/优雅停止的生命周期契约。
//!
//! 本 crate 不包含任何传输实现。进程内参考实现见 `callback-service`。
//!
pub mod actor;
pub mod context;
pub mod error;
pub mod event;
pub mod handler;
pub mod service;

pub use context::CallContext;
pub use error::{ServiceError, ServiceResult};
pub use service::Service;

/// 向应用下发 API 令牌的环境变量名
pub const APP_API_TOKEN_ENV_VAR: &str = "APP_API_TOKEN";

/// 入站调用中携带 API 令牌的元数据键
pub const API_TOKEN_KEY: &str = "dapr-api-token";
