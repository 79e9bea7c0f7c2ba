use crate::error::ServiceResult;
use bon::Builder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// 发布订阅消息（CloudEvents 信封 + 路由信息）
#[derive(Builder, Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder(on(String, into))]
#[serde(default)]
pub struct TopicEvent {
    /// 事件唯一标识
    #[builder(default)]
    id: String,
    /// CloudEvents 规范版本
    #[builder(default)]
    #[serde(rename = "specversion")]
    spec_version: String,
    /// 事件类型
    #[builder(default)]
    #[serde(rename = "type")]
    event_type: String,
    /// 事件来源
    #[builder(default)]
    source: String,
    /// 负载的内容类型
    #[builder(default)]
    #[serde(rename = "datacontenttype")]
    data_content_type: String,
    /// 已解析的负载
    #[builder(default)]
    data: Value,
    /// 未经解析的原始负载（仅在进程内传递，不参与序列化）
    #[builder(default, into)]
    #[serde(skip)]
    raw_data: Vec<u8>,
    /// 二进制负载的 base64 编码
    #[builder(default)]
    data_base64: String,
    #[builder(default)]
    subject: String,
    /// 消息所属主题
    #[builder(default)]
    topic: String,
    /// 发布订阅组件名
    #[builder(default)]
    #[serde(rename = "pubsubname")]
    pubsub_name: String,
    #[builder(default)]
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    metadata: HashMap<String, String>,
}

impl TopicEvent {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn spec_version(&self) -> &str {
        &self.spec_version
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn data_content_type(&self) -> &str {
        &self.data_content_type
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn raw_data(&self) -> &[u8] {
        &self.raw_data
    }

    pub fn data_base64(&self) -> &str {
        &self.data_base64
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn pubsub_name(&self) -> &str {
        &self.pubsub_name
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// 将负载解码为目标类型
    ///
    /// 优先使用原始字节；负载为 JSON 字符串时按 JSON 文档再解析一次；
    /// 否则直接从已解析的 JSON 值转换。
    pub fn decode<T: DeserializeOwned>(&self) -> ServiceResult<T> {
        if !self.raw_data.is_empty() {
            return Ok(serde_json::from_slice(&self.raw_data)?);
        }
        match &self.data {
            Value::String(s) => match serde_json::from_str(s) {
                Ok(v) => Ok(v),
                // 普通字符串负载（非 JSON 文档）按字符串值本身解码
                Err(_) => Ok(serde_json::from_value(self.data.clone())?),
            },
            other => Ok(serde_json::from_value(other.clone())?),
        }
    }
}
