use bon::Builder;
use serde::{Deserialize, Serialize};

/// 服务调用事件
#[derive(Builder, Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[builder(on(String, into))]
#[serde(default, rename_all = "camelCase")]
pub struct InvocationEvent {
    /// 请求体
    #[builder(default)]
    data: Vec<u8>,
    /// 请求体的内容类型
    #[builder(default)]
    content_type: String,
    /// 请求体为 protobuf Any 时的类型 URL
    #[builder(default)]
    data_type_url: String,
    /// HTTP 动词（经 HTTP 转发时存在）
    #[builder(default)]
    verb: String,
    /// 查询串（经 HTTP 转发时存在）
    #[builder(default)]
    query_string: String,
}

impl InvocationEvent {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data_type_url(&self) -> &str {
        &self.data_type_url
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn query_string(&self) -> &str {
        &self.query_string
    }
}

/// 服务调用的输出内容
#[derive(Builder, Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[builder(on(String, into))]
#[serde(default, rename_all = "camelCase")]
pub struct Content {
    #[builder(default)]
    data: Vec<u8>,
    #[builder(default)]
    content_type: String,
    #[builder(default)]
    data_type_url: String,
}

impl Content {
    pub fn new(content_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
            data_type_url: String::new(),
        }
    }

    /// 无内容的响应
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data_type_url(&self) -> &str {
        &self.data_type_url
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
