//! 服务配置（ServiceConfig）
//!
//! 通过 builder 显式构造，或用 `from_env` 读取运行时下发的环境变量。
//!
use bon::Builder;
use callback_common::APP_API_TOKEN_ENV_VAR;
use std::time::Duration;

/// 进程内回调服务配置
#[derive(Builder, Clone, Debug)]
pub struct ServiceConfig {
    /// 应用 API 令牌；为空时不校验入站调用
    #[builder(into)]
    app_api_token: Option<String>,
    /// 优雅停止时等待进行中调用的最长时间
    #[builder(default = ServiceConfig::DEFAULT_GRACEFUL_STOP_TIMEOUT)]
    graceful_stop_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            app_api_token: None,
            graceful_stop_timeout: Self::DEFAULT_GRACEFUL_STOP_TIMEOUT,
        }
    }
}

impl ServiceConfig {
    pub const DEFAULT_GRACEFUL_STOP_TIMEOUT: Duration = Duration::from_secs(10);

    /// 从环境变量读取令牌，其余取默认值
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 以自定义查找函数读取配置，空字符串视为未设置
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let app_api_token = lookup(APP_API_TOKEN_ENV_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Self {
            app_api_token,
            ..Self::default()
        }
    }

    pub fn app_api_token(&self) -> Option<&str> {
        self.app_api_token.as_deref()
    }

    pub fn graceful_stop_timeout(&self) -> Duration {
        self.graceful_stop_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_reads_token_and_ignores_blank() {
        let cfg = ServiceConfig::from_lookup(|k| {
            (k == APP_API_TOKEN_ENV_VAR).then(|| " secret ".to_string())
        });
        assert_eq!(cfg.app_api_token(), Some("secret"));

        let blank = ServiceConfig::from_lookup(|_| Some("   ".to_string()));
        assert_eq!(blank.app_api_token(), None);
        assert_eq!(
            blank.graceful_stop_timeout(),
            ServiceConfig::DEFAULT_GRACEFUL_STOP_TIMEOUT
        );
    }

    #[test]
    fn builder_defaults_timeout() {
        let cfg = ServiceConfig::builder().app_api_token("t").build();
        assert_eq!(cfg.app_api_token(), Some("t"));
        assert_eq!(cfg.graceful_stop_timeout(), Duration::from_secs(10));
    }
}
