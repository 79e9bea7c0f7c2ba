use callback_common::event::{Content, InvocationEvent, JobEvent, Subscription, TopicEvent};
use callback_common::handler::{
    HealthCheckHandler, JobEventHandler, ServiceInvocationHandler, TopicEventHandler,
    TopicEventReply,
};
use callback_common::{CallContext, Service};
use callback_service::InProcessService;
use serde::Deserialize;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct OrderPlaced {
    id: String,
    amount: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let svc = InProcessService::from_env();

    svc.add_health_check_handler(
        "healthz",
        HealthCheckHandler::new(|_ctx| async { Ok(()) }),
    )?;
    svc.add_service_invocation_handler(
        "/echo",
        ServiceInvocationHandler::new(|_ctx, ev: InvocationEvent| async move {
            Ok(Content::new(ev.content_type(), ev.data()))
        }),
    )?;
    svc.add_topic_event_handler(
        Subscription::builder()
            .pubsub_name("messages")
            .topic("orders")
            .route("/orders")
            .dead_letter_topic("orders-dead")
            .build(),
        TopicEventHandler::new(|_ctx, ev: TopicEvent| async move {
            match ev.decode::<OrderPlaced>() {
                Ok(order) => {
                    println!("OrderPlaced: id={} amount={}", order.id, order.amount);
                    TopicEventReply::success()
                }
                Err(e) => TopicEventReply::drop_event(e),
            }
        }),
    )?;
    svc.add_job_event_handler(
        "nightly-report",
        JobEventHandler::new(|_ctx, ev: JobEvent| async move {
            println!("Job fired: {}", ev.job_name());
            Ok(())
        }),
    )?;

    println!(
        "subscriptions: {}",
        serde_json::to_string(&svc.list_topic_subscriptions())?
    );

    svc.start().await?;

    let ctx = CallContext::new().with_timeout(Duration::from_secs(5));
    svc.check_health(&ctx).await?;

    let reply = svc
        .invoke_service(
            &ctx,
            "echo",
            InvocationEvent::builder()
                .data(b"hello".to_vec())
                .content_type("text/plain")
                .verb("POST")
                .build(),
        )
        .await?;
    println!("echo: {}", String::from_utf8_lossy(reply.data()));

    let status = svc
        .deliver_topic_event(
            &ctx,
            "/orders",
            TopicEvent::builder()
                .id("evt-1")
                .pubsub_name("messages")
                .topic("orders")
                .data_content_type("application/json")
                .data(serde_json::json!({"id": "o-1", "amount": 42}))
                .build(),
        )
        .await?;
    println!("topic status: {status}");

    svc.deliver_job_event(
        &ctx,
        JobEvent::builder().job_type("job/nightly-report").build(),
    )
    .await?;

    svc.graceful_stop().await?;
    println!("state: {}", svc.state());
    Ok(())
}
