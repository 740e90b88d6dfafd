use crate::resource::{property_id, PropertyId, Resource, ResourceType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

pub static REQUEST_ID_PROPERTY_ID: LazyLock<PropertyId> = LazyLock::new(|| property_id("Requests", "id"));
pub static REQUEST_STATUS_PROPERTY_ID: LazyLock<PropertyId> =
    LazyLock::new(|| property_id("Requests", "status"));

/// 变更操作的整体状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// 已接受，异步执行中
    Accepted,
    InProgress,
    Complete,
    Failed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Status::Accepted => "Accepted",
            Status::InProgress => "InProgress",
            Status::Complete => "Complete",
            Status::Failed => "Failed",
        };
        f.write_str(text)
    }
}

/// RequestStatus 描述一次变更操作的结果
///
/// 立即完成的操作没有 `request_resource`；异步跟踪的操作携带一个
/// `Request` 类型的资源，其中包含跟踪ID和状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestStatus {
    status: Status,
    request_resource: Option<Resource>,
    associated_resources: HashSet<Resource>,
}

impl RequestStatus {
    /// 立即完成的操作
    pub fn complete() -> Self {
        Self::complete_with(HashSet::new())
    }

    pub fn complete_with(associated_resources: HashSet<Resource>) -> Self {
        Self {
            status: Status::Complete,
            request_resource: None,
            associated_resources,
        }
    }

    /// 由跟踪ID引用的异步操作
    pub fn tracked(request_id: u64, status: Status) -> Self {
        let request_resource = Resource::new(ResourceType::Request)
            .with_property(REQUEST_ID_PROPERTY_ID.clone(), request_id)
            .with_property(REQUEST_STATUS_PROPERTY_ID.clone(), status.to_string());
        Self {
            status,
            request_resource: Some(request_resource),
            associated_resources: HashSet::new(),
        }
    }

    pub fn with_associated_resources(mut self, resources: HashSet<Resource>) -> Self {
        self.associated_resources = resources;
        self
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn request_resource(&self) -> Option<&Resource> {
        self.request_resource.as_ref()
    }

    pub fn associated_resources(&self) -> &HashSet<Resource> {
        &self.associated_resources
    }

    /// 异步操作的跟踪ID
    pub fn tracking_id(&self) -> Option<u64> {
        self.request_resource
            .as_ref()
            .and_then(|resource| resource.property(&REQUEST_ID_PROPERTY_ID))
            .and_then(|value| value.as_u64())
    }
}
