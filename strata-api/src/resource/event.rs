use crate::resource::{Predicate, Request, ResourceType};
use serde::{Deserialize, Serialize};

/// 资源变更事件的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceEventType {
    Create,
    Update,
    Delete,
}

/// ResourceProviderEvent 通知某类资源可能已经发生变化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceProviderEvent {
    pub resource_type: ResourceType,
    pub event_type: ResourceEventType,
    pub request: Request,
    pub predicate: Option<Predicate>,
}

impl ResourceProviderEvent {
    pub fn new(
        resource_type: ResourceType,
        event_type: ResourceEventType,
        request: Request,
        predicate: Option<Predicate>,
    ) -> Self {
        Self {
            resource_type,
            event_type,
            request,
            predicate,
        }
    }
}

/// ResourceProviderObserver 接收资源变更通知
///
/// 通知是尽力而为的：实现不能返回错误，也不应阻塞调用者。
pub trait ResourceProviderObserver: Send + Sync {
    fn update(&self, event: &ResourceProviderEvent);
}
