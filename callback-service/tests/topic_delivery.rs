use async_trait::async_trait;
use callback_common::event::{Subscription, SubscriptionResponseStatus, TopicEvent};
use callback_common::handler::{TopicEventHandler, TopicEventReply, TopicEventSubscriber};
use callback_common::{CallContext, Service, ServiceError};
use callback_service::InProcessService;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Deserialize)]
struct Order {
    id: u32,
    amount: u32,
}

fn orders(route: &str) -> Subscription {
    Subscription::builder()
        .pubsub_name("messages")
        .topic("orders")
        .route(route)
        .build()
}

fn order_event(id: u32, amount: u32) -> TopicEvent {
    TopicEvent::builder()
        .id(format!("evt-{id}"))
        .pubsub_name("messages")
        .topic("orders")
        .data_content_type("application/json")
        .data(serde_json::json!({"id": id, "amount": amount}))
        .build()
}

/// 金额为 0 视为坏消息（丢弃），金额超限视为暂时失败（重试）
fn order_handler(seen: Arc<AtomicUsize>) -> TopicEventHandler {
    TopicEventHandler::new(move |_ctx, ev: TopicEvent| {
        let seen = seen.clone();
        async move {
            let order: Order = match ev.decode() {
                Ok(o) => o,
                Err(e) => return TopicEventReply::drop_event(e),
            };
            seen.fetch_add(1, Ordering::SeqCst);
            match order.amount {
                0 => TopicEventReply::drop_event(anyhow::anyhow!("order {} has no amount", order.id)),
                a if a > 1_000 => TopicEventReply::retry(anyhow::anyhow!("limit service busy")),
                // 成功时即便请求重试也按成功处理
                _ => TopicEventReply::new(true, Ok(())),
            }
        }
    })
}

async fn running_service(seen: Arc<AtomicUsize>) -> InProcessService {
    let svc = InProcessService::default();
    svc.add_topic_event_handler(orders("/orders"), order_handler(seen))
        .unwrap();
    svc.start().await.unwrap();
    svc
}

#[tokio::test]
async fn handler_outcome_maps_to_subscription_status() {
    let seen = Arc::new(AtomicUsize::new(0));
    let svc = running_service(seen.clone()).await;
    let ctx = CallContext::new();

    let ok = svc
        .deliver_topic_event(&ctx, "/orders", order_event(1, 10))
        .await
        .unwrap();
    let retry = svc
        .deliver_topic_event(&ctx, "/orders", order_event(2, 5_000))
        .await
        .unwrap();
    let dropped = svc
        .deliver_topic_event(&ctx, "/orders", order_event(3, 0))
        .await
        .unwrap();

    assert_eq!(ok, SubscriptionResponseStatus::Success);
    assert_eq!(retry, SubscriptionResponseStatus::Retry);
    assert_eq!(dropped, SubscriptionResponseStatus::Drop);
    assert_eq!(seen.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn unknown_topic_and_route_are_errors() {
    let svc = InProcessService::default();
    let rule = Subscription::builder()
        .pubsub_name("messages")
        .topic("orders")
        .route("/orders/vip")
        .match_expr(r#"event.data.amount > 1000"#)
        .build();
    svc.add_topic_event_handler(rule, order_handler(Arc::new(AtomicUsize::new(0))))
        .unwrap();
    svc.start().await.unwrap();
    let ctx = CallContext::new();

    let payments = TopicEvent::builder()
        .pubsub_name("messages")
        .topic("payments")
        .build();
    assert!(matches!(
        svc.deliver_topic_event(&ctx, "", payments).await,
        Err(ServiceError::TopicNotConfigured { .. })
    ));
    assert!(matches!(
        svc.deliver_topic_event(&ctx, "/orders", order_event(1, 1)).await,
        Err(ServiceError::RouteNotConfigured { .. })
    ));
    assert_eq!(
        svc.deliver_topic_event(&ctx, "/orders/vip", order_event(1, 1))
            .await
            .unwrap(),
        SubscriptionResponseStatus::Success
    );
}

struct Audit {
    routed: AtomicUsize,
}

#[async_trait]
impl TopicEventSubscriber for Audit {
    async fn handle(&self, _ctx: &CallContext, _event: &TopicEvent) -> TopicEventReply {
        self.routed.fetch_add(1, Ordering::SeqCst);
        TopicEventReply::success()
    }
}

#[tokio::test]
async fn path_selects_route_subscriber() {
    let seen = Arc::new(AtomicUsize::new(0));
    let audit = Arc::new(Audit {
        routed: AtomicUsize::new(0),
    });

    let svc = InProcessService::default();
    svc.add_topic_event_handler(orders("/orders"), order_handler(seen.clone()))
        .unwrap();
    let audit_rule = Subscription::builder()
        .pubsub_name("messages")
        .topic("orders")
        .route("/orders/audit")
        .match_expr(r#"event.type == "audit""#)
        .priority(1)
        .build();
    svc.add_topic_event_subscriber(audit_rule, audit.clone())
        .unwrap();
    svc.start().await.unwrap();
    let ctx = CallContext::new();

    svc.deliver_topic_event(&ctx, "/orders/audit", order_event(1, 1))
        .await
        .unwrap();
    svc.deliver_topic_event(&ctx, "", order_event(2, 1))
        .await
        .unwrap();

    assert_eq!(audit.routed.load(Ordering::SeqCst), 1);
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    let subs = svc.list_topic_subscriptions();
    assert_eq!(subs.len(), 1);
    let routes = subs[0].routes().expect("rules registered");
    assert_eq!(routes.default_route(), "/orders");
    assert_eq!(routes.rules()[0].path(), "/orders/audit");
}

#[tokio::test]
async fn undecodable_payload_is_dropped() {
    let svc = running_service(Arc::new(AtomicUsize::new(0))).await;
    let bad = TopicEvent::builder()
        .pubsub_name("messages")
        .topic("orders")
        .raw_data(b"not json".as_slice())
        .build();
    let status = svc
        .deliver_topic_event(&CallContext::new(), "/orders", bad)
        .await
        .unwrap();
    assert_eq!(status, SubscriptionResponseStatus::Drop);
}
