use bon::Builder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 主题订阅声明
///
/// - 未设置 `match_expr` 时，该订阅作为主题的默认路由；
/// - 设置 `match_expr` 时，作为一条按 `priority` 升序排列的路由规则，要求 `route` 非空。
#[derive(Builder, Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[builder(on(String, into))]
#[serde(default, rename_all = "camelCase")]
pub struct Subscription {
    /// 发布订阅组件名
    #[serde(rename = "pubsubname")]
    pubsub_name: String,
    /// 主题名
    topic: String,
    /// 订阅元数据
    #[builder(default)]
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    metadata: HashMap<String, String>,
    /// 投递路径
    #[builder(default)]
    route: String,
    /// 路由规则的匹配表达式（CEL）
    #[builder(default)]
    #[serde(rename = "match")]
    match_expr: String,
    /// 路由规则优先级，数值越小越先匹配
    #[builder(default)]
    priority: i32,
    /// 关闭主题校验：同一组件下的全部主题共用一个注册
    #[builder(default)]
    disable_topic_validation: bool,
    /// 死信主题
    #[builder(default)]
    dead_letter_topic: String,
}

impl Subscription {
    pub fn pubsub_name(&self) -> &str {
        &self.pubsub_name
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn match_expr(&self) -> &str {
        &self.match_expr
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn disable_topic_validation(&self) -> bool {
        self.disable_topic_validation
    }

    pub fn dead_letter_topic(&self) -> &str {
        &self.dead_letter_topic
    }

    /// 是否为路由规则（而非默认路由）
    pub fn is_rule(&self) -> bool {
        !self.match_expr.is_empty()
    }
}

/// 订阅投递结果，告知外部运行时如何处理该消息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionResponseStatus {
    /// 处理成功
    Success,
    /// 处理失败，请求重投
    Retry,
    /// 处理失败，丢弃（或转入死信）
    Drop,
}

impl SubscriptionResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Retry => "RETRY",
            Self::Drop => "DROP",
        }
    }
}

impl fmt::Display for SubscriptionResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_upper_case() {
        let s = serde_json::to_string(&SubscriptionResponseStatus::Retry).unwrap();
        assert_eq!(s, r#""RETRY""#);
        assert_eq!(SubscriptionResponseStatus::Drop.to_string(), "DROP");
    }

    #[test]
    fn match_makes_a_rule() {
        let default = Subscription::builder()
            .pubsub_name("messages")
            .topic("orders")
            .route("/orders")
            .build();
        let rule = Subscription::builder()
            .pubsub_name("messages")
            .topic("orders")
            .route("/orders/vip")
            .match_expr(r#"event.type == "vip""#)
            .priority(1)
            .build();
        assert!(!default.is_rule());
        assert!(rule.is_rule());
    }
}
