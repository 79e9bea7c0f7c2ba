//! 回调服务统一错误定义
//!
//! 覆盖注册校验、调度路由、鉴权、生命周期与处理器失败等最小必要集合，
//! 传输层可据此映射为各自协议的状态码。
//!
use std::time::Duration;
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ServiceError {
    // --- 注册 ---
    #[error("invalid registration: {reason}")]
    InvalidRegistration { reason: String },
    #[error("handler already registered: kind={kind}, name={name}")]
    AlreadyRegistered { kind: &'static str, name: String },

    // --- 调度/路由 ---
    #[error("handler not found: kind={kind}, name={name}")]
    HandlerNotFound { kind: &'static str, name: String },
    #[error("pub/sub and topic combination not configured: {pubsub}/{topic}")]
    TopicNotConfigured { pubsub: String, topic: String },
    #[error("route {path} for pub/sub and topic combination not configured: {pubsub}/{topic}")]
    RouteNotConfigured {
        path: String,
        pubsub: String,
        topic: String,
    },
    #[error("handler failed: kind={kind}, name={name}, reason={source}")]
    Handler {
        kind: &'static str,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    // --- 鉴权 ---
    #[error("authentication failed: app token mismatch")]
    Unauthenticated,

    // --- 生命周期 ---
    #[error("invalid state: expected={expected}, actual={actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("service is not serving callbacks: state={state}")]
    NotServing { state: &'static str },
    #[error("call cancelled")]
    Cancelled,
    #[error("call deadline exceeded")]
    DeadlineExceeded,
    #[error("graceful stop timed out after {timeout:?}")]
    ShutdownTimeout { timeout: Duration },

    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

impl ServiceError {
    pub fn invalid_registration(reason: impl Into<String>) -> Self {
        ServiceError::InvalidRegistration {
            reason: reason.into(),
        }
    }

    pub fn handler(kind: &'static str, name: impl Into<String>, source: anyhow::Error) -> Self {
        ServiceError::Handler {
            kind,
            name: name.into(),
            source,
        }
    }
}

/// 统一 Result 类型别名
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_error_keeps_source_message() {
        let err = ServiceError::handler("invocation", "echo", anyhow::anyhow!("boom"));
        assert_eq!(
            err.to_string(),
            "handler failed: kind=invocation, name=echo, reason=boom"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn route_error_names_the_combination() {
        let err = ServiceError::RouteNotConfigured {
            path: "/orders".into(),
            pubsub: "messages".into(),
            topic: "orders".into(),
        };
        assert!(err.to_string().ends_with("messages/orders"));
    }
}
