//! 演员（Actor）注册契约
//!
//! 应用通过工厂向外部运行时声明自己承载的演员类型。工厂分两种：
//! - `ActorFactory`：无上下文，旧接口，保留以兼容；
//! - `ActorFactoryContext`：创建时可拿到本次调用的 `CallContext`。
//!
//! 演员的调度、状态管理与轮次并发由外部运行时负责，这里只定义最小接口。

pub mod config;

use crate::context::CallContext;
use std::fmt;
use std::sync::Arc;

pub use config::{ActorConfig, ActorOption};

/// 演员实例
pub trait Actor: Send + Sync {
    /// 演员类型（同一工厂产出的实例类型必须一致）
    fn actor_type(&self) -> &str;
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

/// 无上下文的演员工厂
#[derive(Clone)]
pub struct ActorFactory(Arc<dyn Fn() -> Box<dyn Actor> + Send + Sync>);

impl ActorFactory {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Box<dyn Actor> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn create(&self) -> Box<dyn Actor> {
        (self.0)()
    }
}

impl fmt::Debug for ActorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActorFactory")
    }
}

/// 带调用上下文的演员工厂
#[derive(Clone)]
pub struct ActorFactoryContext(Arc<dyn Fn(&CallContext) -> Box<dyn Actor> + Send + Sync>);

impl ActorFactoryContext {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&CallContext) -> Box<dyn Actor> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn create(&self, ctx: &CallContext) -> Box<dyn Actor> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for ActorFactoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActorFactoryContext")
    }
}
