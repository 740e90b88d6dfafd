use crate::resource::{
    Predicate, PropertyId, Request, RequestStatus, Resource, ResourceError, ResourceResult,
    ResourceType,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// ResourceProvider 是每种资源类型都要实现的通用能力接口
///
/// 默认的变更方法返回 `UnsupportedOperation`，因此只读资源类型只需实现
/// 读取方法以及它真正支持的变更。
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    fn resource_type(&self) -> ResourceType;

    /// 该类型支持的全部属性ID（包括分类ID）
    fn property_ids(&self) -> &HashSet<PropertyId>;

    /// 各资源类型到其键属性ID的映射
    fn key_property_ids(&self) -> &BTreeMap<ResourceType, PropertyId>;

    /// 唯一确定一个实例的主键属性ID
    fn pk_property_ids(&self) -> &HashSet<PropertyId>;

    /// 返回给定ID中不被支持的那些
    ///
    /// 一个ID被支持，当且仅当它在schema中，或者它是schema中某个属性的
    /// 分类，或者它位于schema中某个分类之下。schema中的普通属性不是分类，
    /// 其下的ID不被支持。
    fn check_property_ids(&self, ids: &HashSet<PropertyId>) -> BTreeSet<PropertyId> {
        let supported = self.property_ids();
        let is_category = |known: &PropertyId| supported.iter().any(|other| other.is_within(known));
        ids.iter()
            .filter(|id| {
                !supported.contains(*id)
                    && !supported
                        .iter()
                        .any(|known| known.is_within(id) || (id.is_within(known) && is_category(known)))
            })
            .cloned()
            .collect()
    }

    async fn create_resources(&self, request: &Request) -> ResourceResult<RequestStatus> {
        let _ = request;
        Err(ResourceError::unsupported_operation(self.resource_type(), "Create"))
    }

    async fn get_resources(
        &self,
        request: &Request,
        predicate: Option<&Predicate>,
    ) -> ResourceResult<HashSet<Resource>>;

    async fn update_resources(
        &self,
        request: &Request,
        predicate: Option<&Predicate>,
    ) -> ResourceResult<RequestStatus> {
        let _ = (request, predicate);
        Err(ResourceError::unsupported_operation(self.resource_type(), "Update"))
    }

    async fn delete_resources(
        &self,
        request: &Request,
        predicate: Option<&Predicate>,
    ) -> ResourceResult<RequestStatus> {
        let _ = (request, predicate);
        Err(ResourceError::unsupported_operation(self.resource_type(), "Delete"))
    }
}
