//! 入站调用鉴权
//!
//! 配置了应用 API 令牌时，每次入站调用都必须在元数据 `dapr-api-token` 中携带相同的值。
//!
use callback_common::{CallContext, ServiceError, ServiceResult};

#[derive(Clone, Debug, Default)]
pub struct AppTokenAuthenticator {
    token: Option<String>,
}

impl AppTokenAuthenticator {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    pub fn verify(&self, ctx: &CallContext) -> ServiceResult<()> {
        let Some(expected) = self.token.as_deref() else {
            return Ok(());
        };

        match ctx.api_token() {
            Some(actual) if actual == expected => Ok(()),
            _ => Err(ServiceError::Unauthenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callback_common::API_TOKEN_KEY;

    #[test]
    fn disabled_admits_everything() {
        let auth = AppTokenAuthenticator::default();
        assert!(!auth.is_enabled());
        assert!(auth.verify(&CallContext::new()).is_ok());
    }

    #[test]
    fn token_must_match() {
        let auth = AppTokenAuthenticator::new(Some("secret".into()));
        let ok = CallContext::new().with_metadata(API_TOKEN_KEY, "secret");
        let wrong = CallContext::new().with_metadata(API_TOKEN_KEY, "guess");

        assert!(auth.verify(&ok).is_ok());
        assert!(matches!(
            auth.verify(&wrong),
            Err(ServiceError::Unauthenticated)
        ));
        assert!(matches!(
            auth.verify(&CallContext::new()),
            Err(ServiceError::Unauthenticated)
        ));
    }
}
