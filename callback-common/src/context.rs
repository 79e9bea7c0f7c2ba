//! 调用上下文（CallContext）
//!
//! 承载一次回调调用所需的横切信息：
//! - 可取消令牌：外部运行时取消调用时，处理器可通过 `cancelled()` 感知；
//! - 截止时间：调度端据此对处理器施加超时；
//! - 入站元数据：如 `dapr-api-token` 等调用头；
//! - 调用 ID：用于日志关联。
//!
use crate::API_TOKEN_KEY;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// 可取消的调用上下文
///
/// 克隆开销很小（令牌内部为引用计数），克隆体与原上下文共享同一取消状态。
///
/// ```rust
/// use callback_common::context::CallContext;
/// use std::time::Duration;
///
/// let ctx = CallContext::new()
///     .with_metadata("dapr-api-token", "secret")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(ctx.api_token(), Some("secret"));
/// assert!(ctx.deadline().is_some());
/// assert!(!ctx.is_cancelled());
/// ```
#[derive(Clone, Debug)]
pub struct CallContext {
    call_id: String,
    token: CancellationToken,
    deadline: Option<Instant>,
    metadata: HashMap<String, String>,
}

impl Default for CallContext {
    fn default() -> Self {
        Self {
            call_id: Uuid::new_v4().to_string(),
            token: CancellationToken::new(),
            deadline: None,
            metadata: HashMap::new(),
        }
    }
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定调用 ID（通常沿用外部运行时下发的追踪 ID）
    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = call_id.into();
        self
    }

    /// 使用外部令牌，便于调用方统一取消一组调用
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// 派生子上下文：取消父上下文会级联取消子上下文，反之不成立
    pub fn child(&self) -> Self {
        Self {
            call_id: self.call_id.clone(),
            token: self.token.child_token(),
            deadline: self.deadline,
            metadata: self.metadata.clone(),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// 入站调用携带的应用 API 令牌
    pub fn api_token(&self) -> Option<&str> {
        self.metadata_value(API_TOKEN_KEY)
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// 等待取消信号
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// 截止时间是否已过（未设置截止时间则永不过期）
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}
