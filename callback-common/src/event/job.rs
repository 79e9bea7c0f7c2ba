use bon::Builder;
use serde::{Deserialize, Serialize};

/// 定时任务触发事件
#[derive(Builder, Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JobEvent {
    /// 任务名，可能带有 `job/` 前缀
    #[builder(into)]
    job_type: String,
    /// 任务注册时附带的数据
    #[builder(default, into)]
    data: Vec<u8>,
}

impl JobEvent {
    const PREFIX: &'static str = "job/";

    pub fn job_type(&self) -> &str {
        &self.job_type
    }

    /// 去掉 `job/` 前缀后的任务名，用于匹配处理器
    pub fn job_name(&self) -> &str {
        self.job_type
            .strip_prefix(Self::PREFIX)
            .unwrap_or(&self.job_type)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_name_strips_method_prefix() {
        let prefixed = JobEvent::builder().job_type("job/cleanup").build();
        let plain = JobEvent::builder().job_type("cleanup").build();
        assert_eq!(prefixed.job_name(), "cleanup");
        assert_eq!(plain.job_name(), "cleanup");
    }
}
