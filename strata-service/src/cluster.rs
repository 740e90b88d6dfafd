//! 集群控制器：按资源类型分派到提供者，并负责谓词的事后过滤

use crate::provider::base;
use crate::provider::registry::{ProviderContext, ProviderRegistry};
use std::collections::HashSet;
use std::sync::Arc;
use strata_api::{
    Predicate, Request, RequestStatus, Resource, ResourceError, ResourceProvider, ResourceResult,
    ResourceType,
};
use tracing::debug;

/// ClusterController 是提供者的调用方
///
/// 提供者只把主键等值条件下推到后端，可能返回多于谓词匹配的资源，
/// 因此读取结果在这里用完整谓词再过滤一次。
pub struct ClusterController {
    registry: ProviderRegistry,
}

impl ClusterController {
    pub fn new(context: &ProviderContext) -> Self {
        Self::with_registry(ProviderRegistry::new(context))
    }

    pub fn with_registry(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn provider(
        &self,
        resource_type: ResourceType,
        request: &Request,
        predicate: Option<&Predicate>,
    ) -> ResourceResult<Arc<dyn ResourceProvider>> {
        let provider = self.registry.provider(resource_type)?;
        base::check_request(provider.as_ref(), request, predicate)?;
        Ok(provider)
    }

    /// 读取满足谓词的全部资源，没有匹配时返回空集合
    pub async fn get_resources(
        &self,
        resource_type: ResourceType,
        request: &Request,
        predicate: Option<&Predicate>,
    ) -> ResourceResult<HashSet<Resource>> {
        let provider = self.provider(resource_type, request, predicate)?;
        let resources = provider.get_resources(request, predicate).await?;
        let fetched = resources.len();

        let resources: HashSet<Resource> = match predicate {
            Some(predicate) => resources
                .into_iter()
                .filter(|resource| predicate.evaluate(resource))
                .collect(),
            None => resources,
        };
        debug!(
            resource_type = %resource_type,
            fetched,
            matched = resources.len(),
            "Filtered provider resources"
        );
        Ok(resources)
    }

    /// 读取恰好一个资源
    ///
    /// 过滤后为空时返回 `NoSuchResource`；匹配多个时返回 `System`。
    pub async fn get_resource(
        &self,
        resource_type: ResourceType,
        request: &Request,
        predicate: &Predicate,
    ) -> ResourceResult<Resource> {
        let mut resources = self
            .get_resources(resource_type, request, Some(predicate))
            .await?
            .into_iter();

        match (resources.next(), resources.next()) {
            (Some(resource), None) => Ok(resource),
            (None, _) => Err(ResourceError::no_such_resource(format!(
                "The requested resource doesn't exist: {} not found where {}.",
                resource_type,
                describe(predicate)
            ))),
            (Some(_), Some(_)) => Err(ResourceError::system(format!(
                "More than one {} resource matched {}.",
                resource_type,
                describe(predicate)
            ))),
        }
    }

    pub async fn create_resources(
        &self,
        resource_type: ResourceType,
        request: &Request,
    ) -> ResourceResult<RequestStatus> {
        let provider = self.provider(resource_type, request, None)?;
        provider.create_resources(request).await
    }

    pub async fn update_resources(
        &self,
        resource_type: ResourceType,
        request: &Request,
        predicate: Option<&Predicate>,
    ) -> ResourceResult<RequestStatus> {
        let provider = self.provider(resource_type, request, predicate)?;
        provider.update_resources(request, predicate).await
    }

    pub async fn delete_resources(
        &self,
        resource_type: ResourceType,
        request: &Request,
        predicate: Option<&Predicate>,
    ) -> ResourceResult<RequestStatus> {
        let provider = self.provider(resource_type, request, predicate)?;
        provider.delete_resources(request, predicate).await
    }
}

fn describe(predicate: &Predicate) -> String {
    serde_json::to_string(predicate).unwrap_or_else(|_| "<predicate>".to_string())
}
