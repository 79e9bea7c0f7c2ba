//! 主题注册表（TopicRegistrar）
//!
//! 以 `"{pubsub}-{topic}"`（或关闭主题校验时的 `"{pubsub}"`）为键聚合同一主题的全部订阅：
//! - 不带匹配表达式的订阅设置默认路由与默认处理器，每个键仅允许一个；
//! - 带匹配表达式的订阅追加一条路由规则，规则按优先级升序排列；
//! - 每个处理器同时按路由路径索引，投递时按路径选取，缺省回落到默认处理器；
//! - 路径比较前去除首尾空白与前导 `/`，与服务调用的方法名规则一致。
//!
use callback_common::event::Subscription;
use callback_common::handler::TopicEventSubscriber;
use callback_common::{ServiceError, ServiceResult};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// 对外声明的订阅（外部运行时据此建立订阅）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSubscription {
    #[serde(rename = "pubsubname")]
    pubsub_name: String,
    topic: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    metadata: HashMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    route: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    routes: Option<TopicRoutes>,
    #[serde(skip_serializing_if = "String::is_empty")]
    dead_letter_topic: String,
}

/// 路由规则集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicRoutes {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rules: Vec<TopicRule>,
    #[serde(skip_serializing_if = "String::is_empty")]
    default: String,
}

/// 单条路由规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicRule {
    #[serde(rename = "match")]
    match_expr: String,
    path: String,
    #[serde(skip)]
    priority: i32,
}

impl TopicSubscription {
    fn new(sub: &Subscription) -> Self {
        Self {
            pubsub_name: sub.pubsub_name().to_string(),
            topic: sub.topic().to_string(),
            metadata: sub.metadata().clone(),
            route: String::new(),
            routes: None,
            dead_letter_topic: sub.dead_letter_topic().to_string(),
        }
    }

    pub fn pubsub_name(&self) -> &str {
        &self.pubsub_name
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// 默认路由（无规则时）
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn routes(&self) -> Option<&TopicRoutes> {
        self.routes.as_ref()
    }

    pub fn dead_letter_topic(&self) -> &str {
        &self.dead_letter_topic
    }

    fn set_default_route(&mut self, path: &str) {
        match self.routes.as_mut() {
            Some(routes) => routes.default = path.to_string(),
            None => self.route = path.to_string(),
        }
    }

    fn add_rule(&mut self, path: &str, match_expr: &str, priority: i32) {
        // 首条规则出现时，把已有的默认路由迁入规则集合
        let routes = self.routes.get_or_insert_with(|| TopicRoutes {
            rules: Vec::new(),
            default: std::mem::take(&mut self.route),
        });
        let at = routes.rules.partition_point(|r| r.priority <= priority);
        routes.rules.insert(
            at,
            TopicRule {
                match_expr: match_expr.to_string(),
                path: path.to_string(),
                priority,
            },
        );
    }
}

impl TopicRoutes {
    pub fn rules(&self) -> &[TopicRule] {
        &self.rules
    }

    pub fn default_route(&self) -> &str {
        &self.default
    }
}

impl TopicRule {
    pub fn match_expr(&self) -> &str {
        &self.match_expr
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }
}

struct TopicRegistration {
    subscription: TopicSubscription,
    default_handler: Option<Arc<dyn TopicEventSubscriber>>,
    route_handlers: HashMap<String, Arc<dyn TopicEventSubscriber>>,
}

#[derive(Default)]
pub(crate) struct TopicRegistrar {
    registrations: DashMap<String, TopicRegistration>,
}

impl TopicRegistrar {
    pub(crate) fn add_subscription(
        &self,
        sub: &Subscription,
        subscriber: Arc<dyn TopicEventSubscriber>,
    ) -> ServiceResult<()> {
        if sub.topic().is_empty() {
            return Err(ServiceError::invalid_registration("topic name required"));
        }
        if sub.pubsub_name().is_empty() {
            return Err(ServiceError::invalid_registration("pub/sub name required"));
        }
        if sub.is_rule() && sub.route().is_empty() {
            return Err(ServiceError::invalid_registration(
                "path is required for routing rules",
            ));
        }

        let key = if sub.disable_topic_validation() {
            sub.pubsub_name().to_string()
        } else {
            registration_key(sub.pubsub_name(), sub.topic())
        };

        let mut reg = self
            .registrations
            .entry(key.clone())
            .or_insert_with(|| TopicRegistration {
                subscription: TopicSubscription::new(sub),
                default_handler: None,
                route_handlers: HashMap::new(),
            });

        if reg.route_handlers.contains_key(route_key(sub.route())) {
            return Err(ServiceError::AlreadyRegistered {
                kind: "topic route",
                name: format!("{key}:{}", sub.route()),
            });
        }
        if !sub.is_rule() && reg.default_handler.is_some() {
            return Err(ServiceError::AlreadyRegistered {
                kind: "topic default route",
                name: key,
            });
        }

        if !sub.metadata().is_empty() && sub.metadata() != reg.subscription.metadata() {
            warn!(
                key = %key,
                "subscription metadata already set by an earlier registration, ignoring"
            );
        }

        if sub.is_rule() {
            reg.subscription
                .add_rule(sub.route(), sub.match_expr(), sub.priority());
        } else {
            reg.subscription.set_default_route(sub.route());
            reg.default_handler = Some(subscriber.clone());
        }
        reg.route_handlers
            .insert(route_key(sub.route()).to_string(), subscriber);

        Ok(())
    }

    /// 为一次投递选取订阅者：先按主题键、再按组件键查找，路径优先于默认处理器
    pub(crate) fn resolve(
        &self,
        pubsub: &str,
        topic: &str,
        path: &str,
    ) -> ServiceResult<Arc<dyn TopicEventSubscriber>> {
        let reg = self
            .registrations
            .get(&registration_key(pubsub, topic))
            .or_else(|| self.registrations.get(pubsub))
            .ok_or_else(|| ServiceError::TopicNotConfigured {
                pubsub: pubsub.to_string(),
                topic: topic.to_string(),
            })?;

        let by_path = (!path.is_empty())
            .then(|| reg.route_handlers.get(route_key(path)))
            .flatten();

        by_path
            .or(reg.default_handler.as_ref())
            .cloned()
            .ok_or_else(|| ServiceError::RouteNotConfigured {
                path: path.to_string(),
                pubsub: pubsub.to_string(),
                topic: topic.to_string(),
            })
    }

    /// 已声明的订阅（按键排序，输出稳定）
    pub(crate) fn subscriptions(&self) -> Vec<TopicSubscription> {
        let mut entries: Vec<(String, TopicSubscription)> = self
            .registrations
            .iter()
            .map(|e| (e.key().clone(), e.value().subscription.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, s)| s).collect()
    }
}

fn registration_key(pubsub: &str, topic: &str) -> String {
    format!("{pubsub}-{topic}")
}

fn route_key(path: &str) -> &str {
    path.trim().trim_start_matches('/')
}
