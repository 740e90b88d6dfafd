pub mod error;
pub mod event;
pub mod predicate;
pub mod property;
pub mod provider;
pub mod request;
pub mod status;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

pub use error::{ResourceError, ResourceResult};
pub use event::{ResourceEventType, ResourceProviderEvent, ResourceProviderObserver};
pub use predicate::Predicate;
pub use property::{property_id, PropertyId};
pub use provider::ResourceProvider;
pub use request::Request;
pub use status::{RequestStatus, Status};

/// PropertyMap 属性ID到值的有序映射
pub type PropertyMap = BTreeMap<PropertyId, Value>;

/// ResourceType 表示资源的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ResourceType {
    Extension,
    Request,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Extension => "Extension",
            ResourceType::Request => "Request",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource 是后端实体实例的通用属性包
///
/// 相等性和哈希基于类型和完整的属性映射，因此结果集按完整属性去重，
/// 而不是按主键去重。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    resource_type: ResourceType,
    properties: PropertyMap,
}

impl Resource {
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            properties: PropertyMap::new(),
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn set_property(&mut self, id: PropertyId, value: impl Into<Value>) {
        self.properties.insert(id, value.into());
    }

    pub fn with_property(mut self, id: PropertyId, value: impl Into<Value>) -> Self {
        self.set_property(id, value);
        self
    }

    pub fn property(&self, id: &PropertyId) -> Option<&Value> {
        self.properties.get(id)
    }

    pub fn remove_property(&mut self, id: &PropertyId) -> Option<Value> {
        self.properties.remove(id)
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn into_properties(self) -> PropertyMap {
        self.properties
    }
}

impl Hash for Resource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.resource_type.hash(state);
        for (id, value) in &self.properties {
            id.hash(state);
            // serde_json::Value 没有实现 Hash；对象按键有序，序列化形式稳定
            value.to_string().hash(state);
        }
    }
}
