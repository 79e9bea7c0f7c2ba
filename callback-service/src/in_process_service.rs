use crate::actor_registry::{ActorRegistry, ActorRuntimeConfig};
use crate::auth::AppTokenAuthenticator;
use crate::config::ServiceConfig;
use crate::lifecycle::{Lifecycle, ServiceState};
use crate::registry::HandlerRegistry;
use crate::topic_registrar::{TopicRegistrar, TopicSubscription};
use async_trait::async_trait;
use callback_common::actor::{Actor, ActorConfig, ActorFactory, ActorFactoryContext, ActorOption};
use callback_common::event::{
    BindingEvent, Content, InvocationEvent, JobEvent, Subscription, SubscriptionResponseStatus,
    TopicEvent,
};
use callback_common::handler::{
    BindingInvocationHandler, HealthCheckHandler, JobEventHandler, ServiceInvocationHandler,
    TopicEventHandler, TopicEventSubscriber,
};
use callback_common::{CallContext, Service, ServiceError, ServiceResult};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio_util::task::task_tracker::TaskTrackerToken;
use tracing::{debug, error, info, warn};

/// 进程内（无传输层）的回调服务实现
///
/// - 注册：按名称/订阅声明存放处理器，仅在 `Created` 状态下接受；
/// - 调度：外部运行时解码请求后调用 `invoke_service` 等入口，
///   每次调用都会校验状态与令牌、计入进行中调用，并受调用方取消/截止时间与服务停止约束；
/// - 生命周期：`start` / `stop` / `graceful_stop`，以及等待停止的 `stopped`。
pub struct InProcessService {
    config: ServiceConfig,
    auth: AppTokenAuthenticator,
    lifecycle: Lifecycle,
    invocations: HandlerRegistry<ServiceInvocationHandler>,
    bindings: HandlerRegistry<BindingInvocationHandler>,
    jobs: HandlerRegistry<JobEventHandler>,
    // 至多一个健康检查处理器；名称仅用于日志
    health: Mutex<Option<(String, HealthCheckHandler)>>,
    topics: TopicRegistrar,
    actors: ActorRegistry,
}

impl Default for InProcessService {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}

impl InProcessService {
    pub fn new(config: ServiceConfig) -> Self {
        let auth = AppTokenAuthenticator::new(config.app_api_token().map(str::to_string));
        Self {
            config,
            auth,
            lifecycle: Lifecycle::new(),
            invocations: HandlerRegistry::new("invocation"),
            bindings: HandlerRegistry::new("binding"),
            jobs: HandlerRegistry::new("job"),
            health: Mutex::new(None),
            topics: TopicRegistrar::default(),
            actors: ActorRegistry::default(),
        }
    }

    /// 以环境变量中的应用令牌构造
    pub fn from_env() -> Self {
        Self::new(ServiceConfig::from_env())
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn state(&self) -> ServiceState {
        self.lifecycle.state()
    }

    /// 当前进行中的调用数
    pub fn inflight_calls(&self) -> usize {
        self.lifecycle.inflight()
    }

    /// 等待服务停止
    pub async fn stopped(&self) {
        self.lifecycle.stopped().await
    }

    // ---- 调度入口 ----

    pub async fn invoke_service(
        &self,
        ctx: &CallContext,
        method: &str,
        event: InvocationEvent,
    ) -> ServiceResult<Content> {
        let _call = self.admit(ctx)?;
        let handler = self.invocations.get(method)?;
        debug!(call_id = ctx.call_id(), method, "invoking service method");

        let kind = self.invocations.kind();
        let out = self
            .guarded(ctx, async {
                handler
                    .call(ctx.clone(), event)
                    .await
                    .map_err(|e| ServiceError::handler(kind, method, e))
            })
            .await;
        log_failure(ctx, kind, method, out)
    }

    /// 投递一条主题消息，返回告知外部运行时的处理结论
    ///
    /// 处理器的错误按重试标记换算为 `RETRY` / `DROP`，不作为调用错误返回。
    pub async fn deliver_topic_event(
        &self,
        ctx: &CallContext,
        path: &str,
        event: TopicEvent,
    ) -> ServiceResult<SubscriptionResponseStatus> {
        let _call = self.admit(ctx)?;
        let subscriber = self
            .topics
            .resolve(event.pubsub_name(), event.topic(), path)?;
        debug!(
            call_id = ctx.call_id(),
            pubsub = event.pubsub_name(),
            topic = event.topic(),
            path,
            "delivering topic event"
        );

        let reply = self
            .guarded(ctx, async { Ok(subscriber.handle(ctx, &event).await) })
            .await;
        let reply = log_failure(ctx, "topic", event.topic(), reply)?;

        let status = reply.status();
        if let Some(err) = reply.error() {
            warn!(
                call_id = ctx.call_id(),
                pubsub = event.pubsub_name(),
                topic = event.topic(),
                event_id = event.id(),
                status = %status,
                error = %err,
                "topic event handler failed"
            );
        }
        Ok(status)
    }

    pub async fn invoke_binding(
        &self,
        ctx: &CallContext,
        name: &str,
        event: BindingEvent,
    ) -> ServiceResult<Vec<u8>> {
        let _call = self.admit(ctx)?;
        let handler = self.bindings.get(name)?;
        debug!(call_id = ctx.call_id(), binding = name, "invoking input binding");

        let kind = self.bindings.kind();
        let out = self
            .guarded(ctx, async {
                handler
                    .call(ctx.clone(), event)
                    .await
                    .map_err(|e| ServiceError::handler(kind, name, e))
            })
            .await;
        log_failure(ctx, kind, name, out)
    }

    /// 触发定时任务；处理器按去掉 `job/` 前缀的任务名匹配
    pub async fn deliver_job_event(&self, ctx: &CallContext, event: JobEvent) -> ServiceResult<()> {
        let _call = self.admit(ctx)?;
        let name = event.job_name().to_string();
        let handler = self.jobs.get(&name)?;
        debug!(call_id = ctx.call_id(), job = %name, "delivering job event");

        let kind = self.jobs.kind();
        let out = self
            .guarded(ctx, async {
                handler
                    .call(ctx.clone(), event)
                    .await
                    .map_err(|e| ServiceError::handler(kind, &name, e))
            })
            .await;
        log_failure(ctx, kind, &name, out)
    }

    /// 健康检查；未注册处理器时视为健康
    pub async fn check_health(&self, ctx: &CallContext) -> ServiceResult<()> {
        let _call = self.admit(ctx)?;
        let Some((name, handler)) = self.health.lock().clone() else {
            return Ok(());
        };

        let kind = HEALTH_CHECK;
        let out = self
            .guarded(ctx, async {
                handler
                    .call(ctx.clone())
                    .await
                    .map_err(|e| ServiceError::handler(kind, &name, e))
            })
            .await;
        log_failure(ctx, kind, &name, out)
    }

    /// 用已注册的工厂创建指定类型的演员实例并赋予 ID
    pub fn activate_actor(
        &self,
        ctx: &CallContext,
        actor_type: &str,
        actor_id: &str,
    ) -> ServiceResult<Box<dyn Actor>> {
        let _call = self.admit(ctx)?;
        self.actors.activate(ctx, actor_type, actor_id)
    }

    // ---- 只读视图 ----

    pub fn list_topic_subscriptions(&self) -> Vec<TopicSubscription> {
        self.topics.subscriptions()
    }

    pub fn list_input_bindings(&self) -> Vec<String> {
        self.bindings.names()
    }

    pub fn registered_methods(&self) -> Vec<String> {
        self.invocations.names()
    }

    pub fn registered_jobs(&self) -> Vec<String> {
        self.jobs.names()
    }

    pub fn registered_actor_types(&self) -> Vec<String> {
        self.actors.types()
    }

    pub fn actor_config(&self, actor_type: &str) -> Option<ActorConfig> {
        self.actors.config(actor_type)
    }

    pub fn actor_runtime_config(&self) -> ActorRuntimeConfig {
        self.actors.runtime_config()
    }

    // ---- 内部 ----

    fn admit(&self, ctx: &CallContext) -> ServiceResult<TaskTrackerToken> {
        let call = self.lifecycle.enter()?;
        self.auth.verify(ctx).inspect_err(|_| {
            warn!(call_id = ctx.call_id(), "rejected call with invalid app token");
        })?;
        Ok(call)
    }

    /// 处理器与调用方取消、截止时间、服务停止三者竞争，先到者决定结果
    async fn guarded<T, Fut>(&self, ctx: &CallContext, fut: Fut) -> ServiceResult<T>
    where
        Fut: Future<Output = ServiceResult<T>>,
    {
        let shutdown = self.lifecycle.shutdown_token();
        let run = async {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => Err(ServiceError::Cancelled),
                _ = ctx.cancelled() => Err(ServiceError::Cancelled),
                out = fut => out,
            }
        };

        match ctx.deadline() {
            Some(deadline) => tokio::time::timeout_at(deadline, run)
                .await
                .unwrap_or_else(|_| Err(ServiceError::DeadlineExceeded)),
            None => run.await,
        }
    }

    fn accepts_registration(&self, what: &str) -> bool {
        match self.lifecycle.ensure_created() {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, "{what} registration ignored");
                false
            }
        }
    }
}

const HEALTH_CHECK: &str = "health check";

fn log_failure<T>(
    ctx: &CallContext,
    kind: &'static str,
    name: &str,
    out: ServiceResult<T>,
) -> ServiceResult<T> {
    if let Err(err) = &out {
        warn!(call_id = ctx.call_id(), kind, name, error = %err, "callback failed");
    }
    out
}

#[async_trait]
impl Service for InProcessService {
    fn add_health_check_handler(
        &self,
        name: &str,
        handler: HealthCheckHandler,
    ) -> ServiceResult<()> {
        self.lifecycle.ensure_created()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::invalid_registration(format!(
                "{HEALTH_CHECK} name required"
            )));
        }

        // 检查与写入在同一把锁内完成
        let mut slot = self.health.lock();
        if let Some((existing, _)) = slot.as_ref() {
            return Err(ServiceError::AlreadyRegistered {
                kind: HEALTH_CHECK,
                name: existing.clone(),
            });
        }
        *slot = Some((name.to_string(), handler));
        drop(slot);

        info!(name = %name, "health check handler registered");
        Ok(())
    }

    fn add_service_invocation_handler(
        &self,
        name: &str,
        handler: ServiceInvocationHandler,
    ) -> ServiceResult<()> {
        self.lifecycle.ensure_created()?;
        let name = self.invocations.register(name, handler)?;
        info!(method = %name, "service invocation handler registered");
        Ok(())
    }

    fn add_topic_event_handler(
        &self,
        sub: Subscription,
        handler: TopicEventHandler,
    ) -> ServiceResult<()> {
        self.add_topic_event_subscriber(sub, Arc::new(handler))
    }

    fn add_topic_event_subscriber(
        &self,
        sub: Subscription,
        subscriber: Arc<dyn TopicEventSubscriber>,
    ) -> ServiceResult<()> {
        self.lifecycle.ensure_created()?;
        self.topics.add_subscription(&sub, subscriber)?;
        info!(
            pubsub = sub.pubsub_name(),
            topic = sub.topic(),
            route = sub.route(),
            rule = sub.is_rule(),
            "topic subscription registered"
        );
        Ok(())
    }

    fn add_binding_invocation_handler(
        &self,
        name: &str,
        handler: BindingInvocationHandler,
    ) -> ServiceResult<()> {
        self.lifecycle.ensure_created()?;
        let name = self.bindings.register(name, handler)?;
        info!(binding = %name, "binding invocation handler registered");
        Ok(())
    }

    fn register_actor_impl_factory(&self, factory: ActorFactory, opts: Vec<ActorOption>) {
        if !self.accepts_registration("actor factory") {
            return;
        }
        let actor_type = self
            .actors
            .register_plain(factory, ActorConfig::from_options(opts));
        info!(actor_type = %actor_type, "actor factory registered");
    }

    fn register_actor_impl_factory_context(
        &self,
        factory: ActorFactoryContext,
        opts: Vec<ActorOption>,
    ) {
        if !self.accepts_registration("actor factory") {
            return;
        }
        let actor_type = self
            .actors
            .register_contextual(factory, ActorConfig::from_options(opts));
        info!(actor_type = %actor_type, "actor factory registered");
    }

    fn add_job_event_handler(&self, name: &str, handler: JobEventHandler) -> ServiceResult<()> {
        self.lifecycle.ensure_created()?;
        let name = self.jobs.register(name, handler)?;
        info!(job = %name, "job event handler registered");
        Ok(())
    }

    async fn start(&self) -> ServiceResult<()> {
        self.lifecycle.start()?;
        info!(
            methods = self.invocations.names().len(),
            subscriptions = self.topics.subscriptions().len(),
            bindings = self.bindings.names().len(),
            jobs = self.jobs.names().len(),
            actors = self.actors.types().len(),
            health_check = self.health.lock().is_some(),
            token_auth = self.auth.is_enabled(),
            "callback service started"
        );
        Ok(())
    }

    async fn stop(&self) -> ServiceResult<()> {
        let inflight = self.lifecycle.inflight();
        let prev = self.lifecycle.stop();
        if prev != ServiceState::Stopped {
            info!(previous = %prev, inflight, "callback service stopped");
        }
        Ok(())
    }

    async fn graceful_stop(&self) -> ServiceResult<()> {
        self.lifecycle
            .graceful_stop(self.config.graceful_stop_timeout())
            .await?;
        info!("callback service stopped gracefully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn echo() -> ServiceInvocationHandler {
        ServiceInvocationHandler::new(|_ctx, ev: InvocationEvent| async move {
            Ok(Content::new(ev.content_type(), ev.data()))
        })
    }

    #[tokio::test]
    async fn registration_closes_after_start() {
        let svc = InProcessService::default();
        svc.add_service_invocation_handler("echo", echo()).unwrap();
        svc.start().await.unwrap();

        let err = svc
            .add_service_invocation_handler("late", echo())
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidState {
                expected: "created",
                actual: "running"
            }
        ));
        assert_eq!(svc.registered_methods(), vec!["echo".to_string()]);
    }

    #[tokio::test]
    async fn only_one_health_check_handler() {
        let svc = InProcessService::default();
        let ok = HealthCheckHandler::new(|_ctx| async { Ok(()) });
        svc.add_health_check_handler("healthz", ok.clone()).unwrap();
        assert!(matches!(
            svc.add_health_check_handler("livez", ok),
            Err(ServiceError::AlreadyRegistered {
                kind: "health check",
                ..
            })
        ));
    }

    #[test]
    fn concurrent_health_check_registrations_admit_exactly_one() {
        let svc = Arc::new(InProcessService::default());
        let workers: Vec<_> = (0..8)
            .map(|i| {
                let svc = svc.clone();
                std::thread::spawn(move || {
                    let ok = HealthCheckHandler::new(|_ctx| async { Ok(()) });
                    svc.add_health_check_handler(&format!("healthz-{i}"), ok)
                })
            })
            .collect();

        let accepted = workers
            .into_iter()
            .map(|w| w.join().unwrap())
            .filter(Result::is_ok)
            .count();
        assert_eq!(accepted, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_bounds_the_handler() {
        let svc = InProcessService::default();
        svc.add_service_invocation_handler(
            "slow",
            ServiceInvocationHandler::new(|_ctx, _ev| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Content::empty())
            }),
        )
        .unwrap();
        svc.start().await.unwrap();

        let ctx = CallContext::new().with_timeout(Duration::from_millis(100));
        let err = svc
            .invoke_service(&ctx, "slow", InvocationEvent::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DeadlineExceeded));
        assert_eq!(svc.inflight_calls(), 0);
    }

    #[tokio::test]
    async fn caller_cancellation_aborts_the_call() {
        let svc = InProcessService::default();
        svc.add_binding_invocation_handler(
            "queue",
            BindingInvocationHandler::new(|_ctx, _ev| async {
                std::future::pending::<()>().await;
                Ok(Vec::new())
            }),
        )
        .unwrap();
        svc.start().await.unwrap();

        let ctx = CallContext::new();
        ctx.cancel();
        let err = svc
            .invoke_binding(&ctx, "queue", BindingEvent::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Cancelled));
    }
}
