//! 回调服务（Service）契约
//!
//! 应用面向外部运行时暴露的注册点与生命周期操作。注册须在 `start` 之前完成；
//! 处理器的调度、投递重试与演员运行时均由外部运行时负责。
//!
use crate::actor::{ActorFactory, ActorFactoryContext, ActorOption};
use crate::error::ServiceResult;
use crate::event::Subscription;
use crate::handler::{
    BindingInvocationHandler, HealthCheckHandler, JobEventHandler, ServiceInvocationHandler,
    TopicEventHandler, TopicEventSubscriber,
};
use async_trait::async_trait;
use std::sync::Arc;

/// 回调服务
#[async_trait]
pub trait Service: Send + Sync {
    /// 设置健康检查处理器，`name` 为其对外暴露的路由名
    fn add_health_check_handler(&self, name: &str, handler: HealthCheckHandler)
    -> ServiceResult<()>;

    /// 按方法名注册服务调用处理器
    fn add_service_invocation_handler(
        &self,
        name: &str,
        handler: ServiceInvocationHandler,
    ) -> ServiceResult<()>;

    /// 按订阅声明注册主题处理函数
    ///
    /// 仅在处理器返回错误时才会考虑重试；没有错误即视为成功。
    fn add_topic_event_handler(
        &self,
        sub: Subscription,
        handler: TopicEventHandler,
    ) -> ServiceResult<()>;

    /// 按订阅声明注册主题订阅者
    ///
    /// 仅在订阅者返回错误时才会考虑重试；没有错误即视为成功。
    fn add_topic_event_subscriber(
        &self,
        sub: Subscription,
        subscriber: Arc<dyn TopicEventSubscriber>,
    ) -> ServiceResult<()>;

    /// 按绑定名注册输入绑定处理器
    fn add_binding_invocation_handler(
        &self,
        name: &str,
        handler: BindingInvocationHandler,
    ) -> ServiceResult<()>;

    /// 注册演员工厂
    #[deprecated(note = "use `register_actor_impl_factory_context` instead")]
    fn register_actor_impl_factory(&self, factory: ActorFactory, opts: Vec<ActorOption>);

    /// 注册带调用上下文的演员工厂
    fn register_actor_impl_factory_context(
        &self,
        factory: ActorFactoryContext,
        opts: Vec<ActorOption>,
    );

    /// 按任务名注册定时任务处理器
    fn add_job_event_handler(&self, name: &str, handler: JobEventHandler) -> ServiceResult<()>;

    /// 开始服务已注册的回调
    async fn start(&self) -> ServiceResult<()>;

    /// 立即停止，进行中的调用被取消
    async fn stop(&self) -> ServiceResult<()>;

    /// 优雅停止：拒绝新调用并等待进行中的调用完成
    async fn graceful_stop(&self) -> ServiceResult<()>;
}
