use bon::Builder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 输入绑定事件
#[derive(Builder, Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingEvent {
    /// 绑定组件投递的原始数据
    #[builder(default, into)]
    data: Vec<u8>,
    /// 绑定组件附带的元数据
    #[builder(default)]
    metadata: HashMap<String, String>,
}

impl BindingEvent {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }
}
