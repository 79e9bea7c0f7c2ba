//! 回调事件与内容（Event / Content）
//!
//! 定义外部运行时投递给应用的各类输入载荷，以及服务调用的输出内容：
//! - `InvocationEvent` / `Content`：服务调用的入参与出参；
//! - `TopicEvent` / `Subscription`：发布订阅的消息与订阅声明；
//! - `BindingEvent`：输入绑定事件；
//! - `JobEvent`：定时任务触发事件。

mod binding;
mod invocation;
mod job;
mod subscription;
mod topic;

pub use binding::BindingEvent;
pub use invocation::{Content, InvocationEvent};
pub use job::JobEvent;
pub use subscription::{Subscription, SubscriptionResponseStatus};
pub use topic::TopicEvent;
