//! 所有资源提供者共享的基础契约
//!
//! 这里的函数不依赖具体资源类型：属性校验、请求属性的计算、谓词到属性映射的
//! 展开、请求状态的转换以及变更通知。

use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use strata_api::{
    OperationStatus, Predicate, PropertyId, PropertyMap, Request, RequestStatus,
    RequestStatusResponse, Resource, ResourceError, ResourceProvider, ResourceProviderEvent,
    ResourceProviderObserver, ResourceResult, ResourceType, Status,
};
use tracing::debug;

/// ProviderSchema 资源类型的静态schema，在提供者构造时建立且之后不可变
#[derive(Debug, Clone)]
pub struct ProviderSchema {
    pub resource_type: ResourceType,
    pub property_ids: HashSet<PropertyId>,
    pub key_property_ids: BTreeMap<ResourceType, PropertyId>,
    pub pk_property_ids: HashSet<PropertyId>,
}

impl ProviderSchema {
    pub fn new(
        resource_type: ResourceType,
        property_ids: impl IntoIterator<Item = PropertyId>,
        key_property_ids: impl IntoIterator<Item = (ResourceType, PropertyId)>,
        pk_property_ids: impl IntoIterator<Item = PropertyId>,
    ) -> Self {
        Self {
            resource_type,
            property_ids: property_ids.into_iter().collect(),
            key_property_ids: key_property_ids.into_iter().collect(),
            pk_property_ids: pk_property_ids.into_iter().collect(),
        }
    }
}

/// 校验请求和谓词中的属性ID，发现不支持的属性时在调用后端之前失败
pub fn check_request(
    provider: &dyn ResourceProvider,
    request: &Request,
    predicate: Option<&Predicate>,
) -> ResourceResult<()> {
    let mut ids = request.all_property_ids();
    if let Some(predicate) = predicate {
        ids.extend(predicate.property_ids());
    }

    let unsupported = provider.check_property_ids(&ids);
    if unsupported.is_empty() {
        Ok(())
    } else {
        Err(ResourceError::unsupported_property(
            provider.resource_type(),
            unsupported,
        ))
    }
}

/// 读取时实际需要返回的属性ID
///
/// 请求为空表示全部属性；否则谓词中的属性也要返回，以便调用者做事后过滤。
pub fn request_property_ids(request: &Request, predicate: Option<&Predicate>) -> HashSet<PropertyId> {
    let mut ids = request.property_ids().clone();
    if !ids.is_empty() {
        if let Some(predicate) = predicate {
            ids.extend(predicate.property_ids());
        }
    }
    ids
}

/// 属性是否被请求：空集合表示全部，请求一个分类即请求其下所有属性
pub fn is_property_requested(id: &PropertyId, requested: &HashSet<PropertyId>) -> bool {
    requested.is_empty()
        || requested.contains(id)
        || requested.iter().any(|category| id.is_within(category))
}

/// 只有在属性被请求时才设置到资源上
pub fn set_resource_property(
    resource: &mut Resource,
    id: &PropertyId,
    value: impl Into<Value>,
    requested: &HashSet<PropertyId>,
) -> bool {
    if is_property_requested(id, requested) {
        resource.set_property(id.clone(), value);
        true
    } else {
        false
    }
}

/// 将谓词展开为属性映射；没有谓词时得到一个空映射（不加约束）
pub fn property_maps(predicate: Option<&Predicate>) -> Vec<PropertyMap> {
    match predicate {
        None => vec![PropertyMap::new()],
        Some(predicate) => predicate.to_property_maps(),
    }
}

/// 由后端回执得到请求状态
pub fn request_status(response: Option<RequestStatusResponse>) -> RequestStatus {
    match response {
        None => RequestStatus::complete(),
        Some(response) => RequestStatus::tracked(response.request_id, status_of(response.status)),
    }
}

fn status_of(status: OperationStatus) -> Status {
    match status {
        OperationStatus::Pending | OperationStatus::Queued => Status::Accepted,
        OperationStatus::InProgress => Status::InProgress,
        OperationStatus::Completed => Status::Complete,
        OperationStatus::Failed | OperationStatus::Aborted => Status::Failed,
    }
}

/// 通知所有观察者；通知是尽力而为的
pub fn notify(observers: &[Arc<dyn ResourceProviderObserver>], event: &ResourceProviderEvent) {
    debug!(
        resource_type = %event.resource_type,
        event_type = ?event.event_type,
        observers = observers.len(),
        "Notifying resource change"
    );
    for observer in observers {
        observer.update(event);
    }
}
