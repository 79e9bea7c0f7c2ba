//! 回调处理器（Handler）
//!
//! 定义应用向外部运行时注册的各类处理函数类型：
//! - `ServiceInvocationHandler`：服务调用，返回 `Content`；
//! - `TopicEventHandler`：主题消息，返回带重试标记的 `TopicEventReply`；
//! - `BindingInvocationHandler`：输入绑定，返回原始字节；
//! - `JobEventHandler`：定时任务，仅返回成功与否；
//! - `HealthCheckHandler`：健康检查。
//!
//! 每个处理函数类型都是对 `Arc<dyn Fn(CallContext, In) -> BoxFuture<Out>>` 的轻量包装，
//! 可廉价克隆并在多个任务间共享。`TopicEventHandler` 同时实现了单方法能力
//! `TopicEventSubscriber`，使任意符合签名的函数都能以订阅者身份注册。
//!
use crate::context::CallContext;
use crate::event::{
    BindingEvent, Content, InvocationEvent, JobEvent, SubscriptionResponseStatus, TopicEvent,
};
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// 主题处理器的返回值：重试标记 + 处理结果
///
/// 仅在存在错误时才会参考重试标记；无错误一律视为成功，
/// 与 `retry_flag` 的取值无关。
#[derive(Debug)]
pub struct TopicEventReply {
    retry: bool,
    result: anyhow::Result<()>,
}

impl TopicEventReply {
    pub fn new(retry: bool, result: anyhow::Result<()>) -> Self {
        Self { retry, result }
    }

    /// 处理成功
    pub fn success() -> Self {
        Self::new(false, Ok(()))
    }

    /// 处理失败，请求重投
    pub fn retry(err: impl Into<anyhow::Error>) -> Self {
        Self::new(true, Err(err.into()))
    }

    /// 处理失败，不再重投
    pub fn drop_event(err: impl Into<anyhow::Error>) -> Self {
        Self::new(false, Err(err.into()))
    }

    pub fn retry_flag(&self) -> bool {
        self.retry
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        self.result.as_ref().err()
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// 按重试策略换算投递结果
    pub fn status(&self) -> SubscriptionResponseStatus {
        match (&self.result, self.retry) {
            (Ok(()), _) => SubscriptionResponseStatus::Success,
            (Err(_), true) => SubscriptionResponseStatus::Retry,
            (Err(_), false) => SubscriptionResponseStatus::Drop,
        }
    }

    pub fn into_parts(self) -> (bool, anyhow::Result<()>) {
        (self.retry, self.result)
    }
}

macro_rules! handler_fn {
    ($(#[$meta:meta])* $name:ident, ($($arg:ident: $ty:ty),*) -> $out:ty) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(Arc<dyn Fn(CallContext $(, $ty)*) -> BoxFuture<'static, $out> + Send + Sync>);

        impl $name {
            pub fn new<F, Fut>(f: F) -> Self
            where
                F: Fn(CallContext $(, $ty)*) -> Fut + Send + Sync + 'static,
                Fut: Future<Output = $out> + Send + 'static,
            {
                Self(Arc::new(
                    move |ctx: CallContext $(, $arg: $ty)*| -> BoxFuture<'static, $out> {
                        Box::pin(f(ctx $(, $arg)*))
                    },
                ))
            }

            pub async fn call(&self, ctx: CallContext $(, $arg: $ty)*) -> $out {
                (self.0)(ctx $(, $arg)*).await
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(stringify!($name))
            }
        }
    };
}

handler_fn!(
    /// 服务调用处理函数
    ServiceInvocationHandler,
    (event: InvocationEvent) -> anyhow::Result<Content>
);

handler_fn!(
    /// 主题消息处理函数
    TopicEventHandler,
    (event: TopicEvent) -> TopicEventReply
);

handler_fn!(
    /// 输入绑定处理函数，返回写回绑定组件的原始字节
    BindingInvocationHandler,
    (event: BindingEvent) -> anyhow::Result<Vec<u8>>
);

handler_fn!(
    /// 定时任务处理函数
    JobEventHandler,
    (event: JobEvent) -> anyhow::Result<()>
);

handler_fn!(
    /// 健康检查处理函数
    HealthCheckHandler,
    () -> anyhow::Result<()>
);

/// 主题订阅者：处理一条主题消息
#[async_trait]
pub trait TopicEventSubscriber: Send + Sync {
    async fn handle(&self, ctx: &CallContext, event: &TopicEvent) -> TopicEventReply;
}

/// 处理函数即订阅者：原样转发调用，不做任何变换
#[async_trait]
impl TopicEventSubscriber for TopicEventHandler {
    async fn handle(&self, ctx: &CallContext, event: &TopicEvent) -> TopicEventReply {
        self.call(ctx.clone(), event.clone()).await
    }
}
