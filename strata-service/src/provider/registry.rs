use crate::provider::extension;
use std::collections::BTreeMap;
use std::sync::Arc;
use strata_api::{
    ManagementController, ResourceError, ResourceProvider, ResourceProviderObserver, ResourceResult,
    ResourceType,
};
use tracing::debug;

/// ProviderContext 构造提供者时需要的共享依赖
#[derive(Clone)]
pub struct ProviderContext {
    pub controller: Arc<dyn ManagementController>,
    pub observers: Vec<Arc<dyn ResourceProviderObserver>>,
}

impl ProviderContext {
    pub fn new(controller: Arc<dyn ManagementController>) -> Self {
        Self {
            controller,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ResourceProviderObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

pub type ProviderFactory = fn(&ProviderContext) -> Arc<dyn ResourceProvider>;

/// 内置的资源类型及其工厂
static FACTORIES: &[(ResourceType, ProviderFactory)] =
    &[(ResourceType::Extension, extension::create_provider)];

/// ProviderRegistry 按资源类型查找提供者
///
/// 提供者在注册表构造时一次性创建，之后以 `Arc` 共享。
pub struct ProviderRegistry {
    providers: BTreeMap<ResourceType, Arc<dyn ResourceProvider>>,
}

impl ProviderRegistry {
    pub fn new(context: &ProviderContext) -> Self {
        Self::with_factories(context, FACTORIES)
    }

    pub fn with_factories(context: &ProviderContext, factories: &[(ResourceType, ProviderFactory)]) -> Self {
        let providers: BTreeMap<_, _> = factories
            .iter()
            .map(|(resource_type, factory)| (*resource_type, factory(context)))
            .collect();
        debug!(provider_count = providers.len(), "Resource providers registered");
        Self { providers }
    }

    pub fn provider(&self, resource_type: ResourceType) -> ResourceResult<Arc<dyn ResourceProvider>> {
        self.providers
            .get(&resource_type)
            .cloned()
            .ok_or(ResourceError::UnknownResourceType(resource_type))
    }

    pub fn resource_types(&self) -> Vec<ResourceType> {
        self.providers.keys().copied().collect()
    }
}
