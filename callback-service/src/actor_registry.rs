//! 演员注册表
//!
//! 记录应用承载的演员类型、对应工厂与配置，并生成外部运行时读取的演员配置文档。
//!
use callback_common::actor::{Actor, ActorConfig, ActorFactory, ActorFactoryContext};
use callback_common::{CallContext, ServiceError, ServiceResult};
use dashmap::DashMap;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

#[derive(Clone)]
enum Factory {
    Plain(ActorFactory),
    Contextual(ActorFactoryContext),
}

impl Factory {
    fn create(&self, ctx: &CallContext) -> Box<dyn Actor> {
        match self {
            Factory::Plain(f) => f.create(),
            Factory::Contextual(f) => f.create(ctx),
        }
    }
}

#[derive(Clone)]
struct ActorRegistration {
    factory: Factory,
    config: ActorConfig,
}

#[derive(Default)]
pub(crate) struct ActorRegistry {
    actors: DashMap<String, ActorRegistration>,
}

impl ActorRegistry {
    pub(crate) fn register_plain(&self, factory: ActorFactory, config: ActorConfig) -> String {
        self.register(Factory::Plain(factory), config)
    }

    pub(crate) fn register_contextual(
        &self,
        factory: ActorFactoryContext,
        config: ActorConfig,
    ) -> String {
        self.register(Factory::Contextual(factory), config)
    }

    // 先用工厂造一个探测实例以取得演员类型；同类型后注册者覆盖先注册者
    fn register(&self, factory: Factory, config: ActorConfig) -> String {
        let actor_type = factory.create(&CallContext::new()).actor_type().to_string();
        let replaced = self
            .actors
            .insert(actor_type.clone(), ActorRegistration { factory, config })
            .is_some();
        if replaced {
            warn!(actor_type = %actor_type, "actor factory replaced by a later registration");
        }
        actor_type
    }

    pub(crate) fn activate(
        &self,
        ctx: &CallContext,
        actor_type: &str,
        actor_id: &str,
    ) -> ServiceResult<Box<dyn Actor>> {
        let factory = self
            .actors
            .get(actor_type)
            .map(|r| r.factory.clone())
            .ok_or_else(|| ServiceError::HandlerNotFound {
                kind: "actor",
                name: actor_type.to_string(),
            })?;

        let mut actor = factory.create(ctx);
        actor.set_id(actor_id.to_string());
        Ok(actor)
    }

    pub(crate) fn config(&self, actor_type: &str) -> Option<ActorConfig> {
        self.actors.get(actor_type).map(|r| r.config.clone())
    }

    pub(crate) fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.actors.iter().map(|e| e.key().clone()).collect();
        types.sort_unstable();
        types
    }

    pub(crate) fn runtime_config(&self) -> ActorRuntimeConfig {
        let entities = self.types();
        let entities_config = entities
            .iter()
            .filter_map(|t| self.config(t).map(|c| ActorEntityConfig::new(t, &c)))
            .collect();
        ActorRuntimeConfig {
            entities,
            entities_config,
        }
    }
}

/// 演员配置文档：声明承载的演员类型及其各自的运行参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRuntimeConfig {
    entities: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    entities_config: Vec<ActorEntityConfig>,
}

impl ActorRuntimeConfig {
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn entities_config(&self) -> &[ActorEntityConfig] {
        &self.entities_config
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorEntityConfig {
    entities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actor_idle_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actor_scan_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    drain_ongoing_call_timeout: Option<String>,
    drain_rebalanced_actors: bool,
}

impl ActorEntityConfig {
    fn new(actor_type: &str, cfg: &ActorConfig) -> Self {
        Self {
            entities: vec![actor_type.to_string()],
            actor_idle_timeout: cfg.actor_idle_timeout().map(format_duration),
            actor_scan_interval: cfg.actor_scan_interval().map(format_duration),
            drain_ongoing_call_timeout: cfg.drain_ongoing_call_timeout().map(format_duration),
            drain_rebalanced_actors: cfg.drain_rebalanced_actors(),
        }
    }
}

/// 时长字符串：整秒用 `s`，否则用 `ms`
fn format_duration(d: Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}
