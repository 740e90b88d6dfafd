use crate::resource::{PropertyId, PropertyMap};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Request 是一次资源调用的不可变请求
///
/// - `property_ids`: 读取时请求的属性ID，为空表示全部属性
/// - `properties`: 写入时携带的属性映射
/// - `request_info`: 与具体资源无关的请求级信息（如操作上下文）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    property_ids: HashSet<PropertyId>,
    properties: Vec<PropertyMap>,
    request_info: HashMap<String, String>,
}

impl Request {
    pub fn new(property_ids: HashSet<PropertyId>, properties: Vec<PropertyMap>) -> Self {
        Self {
            property_ids,
            properties,
            request_info: HashMap::new(),
        }
    }

    /// 创建读取请求
    pub fn read(property_ids: impl IntoIterator<Item = PropertyId>) -> Self {
        Self::new(property_ids.into_iter().collect(), Vec::new())
    }

    /// 创建携带属性映射的写入请求
    pub fn write(properties: Vec<PropertyMap>) -> Self {
        Self::new(HashSet::new(), properties)
    }

    pub fn with_request_info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_info.insert(key.into(), value.into());
        self
    }

    pub fn property_ids(&self) -> &HashSet<PropertyId> {
        &self.property_ids
    }

    pub fn properties(&self) -> &[PropertyMap] {
        &self.properties
    }

    pub fn request_info(&self) -> &HashMap<String, String> {
        &self.request_info
    }

    /// 请求中出现的全部属性ID（请求的ID和写入映射的键）
    pub fn all_property_ids(&self) -> HashSet<PropertyId> {
        self.property_ids
            .iter()
            .cloned()
            .chain(self.properties.iter().flat_map(|map| map.keys().cloned()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::property_id;
    use serde_json::json;

    #[test]
    fn test_read_request() {
        let id = property_id("Extensions", "extension_name");
        let request = Request::read([id.clone()]);
        assert!(request.property_ids().contains(&id));
        assert!(request.properties().is_empty());
    }

    #[test]
    fn test_all_property_ids_includes_payload_keys() {
        let name = property_id("Extensions", "extension_name");
        let other = property_id("Extensions", "description");
        let request = Request::new(
            HashSet::from([name.clone()]),
            vec![PropertyMap::from([(other.clone(), json!("x"))])],
        )
        .with_request_info("context", "Refresh stacks");

        let ids = request.all_property_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&other));
        assert_eq!(request.request_info().get("context").map(String::as_str), Some("Refresh stacks"));
    }
}
