//! Extension 资源提供者
//!
//! 一个扩展版本类似于栈版本，但包含自定义服务。扩展资源是只读的：
//! 更新调用不会修改扩展本身，而是触发一次栈元数据刷新。

use crate::provider::base::{self, ProviderSchema};
use crate::provider::command;
use crate::provider::registry::ProviderContext;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, LazyLock};
use strata_api::{
    property_id, ExtensionRequest, ExtensionResponse, ManagementController, Predicate, PropertyId,
    PropertyMap, Request, RequestStatus, Resource, ResourceEventType, ResourceProvider,
    ResourceProviderEvent, ResourceProviderObserver, ResourceResult, ResourceType,
};
use tracing::{debug, info};

/// Extension 属性所在的分类；请求分类即请求其下全部属性
pub static EXTENSION_CATEGORY: LazyLock<PropertyId> = LazyLock::new(|| property_id("Extensions", ""));

pub static EXTENSION_NAME_PROPERTY_ID: LazyLock<PropertyId> =
    LazyLock::new(|| property_id("Extensions", "extension_name"));

static SCHEMA: LazyLock<ProviderSchema> = LazyLock::new(|| {
    ProviderSchema::new(
        ResourceType::Extension,
        [EXTENSION_NAME_PROPERTY_ID.clone()],
        [(ResourceType::Extension, EXTENSION_NAME_PROPERTY_ID.clone())],
        [EXTENSION_NAME_PROPERTY_ID.clone()],
    )
});

/// ExtensionResourceProvider 把扩展查询翻译成管理控制器的批量请求
pub struct ExtensionResourceProvider {
    schema: &'static ProviderSchema,
    controller: Arc<dyn ManagementController>,
    observers: Vec<Arc<dyn ResourceProviderObserver>>,
}

impl ExtensionResourceProvider {
    pub fn new(controller: Arc<dyn ManagementController>) -> Self {
        Self {
            schema: &SCHEMA,
            controller,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ResourceProviderObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// 只使用属性映射中的主键构造后端请求
    fn extension_request(properties: &PropertyMap) -> ExtensionRequest {
        ExtensionRequest::new(
            properties
                .get(&*EXTENSION_NAME_PROPERTY_ID)
                .map(|value| match value {
                    Value::String(name) => name.clone(),
                    other => other.to_string(),
                }),
        )
    }

    fn to_resource(response: ExtensionResponse, requested: &HashSet<PropertyId>) -> Resource {
        let mut resource = Resource::new(ResourceType::Extension);
        let name = Value::String(response.extension_name);
        if !base::set_resource_property(&mut resource, &EXTENSION_NAME_PROPERTY_ID, name.clone(), requested) {
            // 主键总是返回
            resource.set_property(EXTENSION_NAME_PROPERTY_ID.clone(), name);
        }
        resource
    }
}

/// 注册表使用的工厂函数
pub fn create_provider(context: &ProviderContext) -> Arc<dyn ResourceProvider> {
    let provider = context
        .observers
        .iter()
        .cloned()
        .fold(ExtensionResourceProvider::new(Arc::clone(&context.controller)), |provider, observer| {
            provider.with_observer(observer)
        });
    Arc::new(provider)
}

#[async_trait]
impl ResourceProvider for ExtensionResourceProvider {
    fn resource_type(&self) -> ResourceType {
        self.schema.resource_type
    }

    fn property_ids(&self) -> &HashSet<PropertyId> {
        &self.schema.property_ids
    }

    fn key_property_ids(&self) -> &BTreeMap<ResourceType, PropertyId> {
        &self.schema.key_property_ids
    }

    fn pk_property_ids(&self) -> &HashSet<PropertyId> {
        &self.schema.pk_property_ids
    }

    async fn get_resources(
        &self,
        request: &Request,
        predicate: Option<&Predicate>,
    ) -> ResourceResult<HashSet<Resource>> {
        base::check_request(self, request, predicate)?;

        let requests: HashSet<ExtensionRequest> = base::property_maps(predicate)
            .iter()
            .map(Self::extension_request)
            .collect();
        let requested = base::request_property_ids(request, predicate);

        debug!(request_count = requests.len(), "Querying extensions");
        let responses =
            command::get_resources(|| self.controller.get_extensions(&requests)).await?;

        let resources: HashSet<Resource> = responses
            .into_iter()
            .map(|response| Self::to_resource(response, &requested))
            .collect();
        debug!(resource_count = resources.len(), "Resolved extension resources");
        Ok(resources)
    }

    /// 任何更新都会触发一次全局的栈元数据刷新，与请求内容无关
    // TODO: 扩展需要自己的更新操作，届时不再借用 update_stacks
    async fn update_resources(
        &self,
        request: &Request,
        predicate: Option<&Predicate>,
    ) -> ResourceResult<RequestStatus> {
        let response = command::modify_resources(|| self.controller.update_stacks()).await?;
        info!(
            tracked = response.is_some(),
            "Stack metadata refresh triggered by extension update"
        );

        base::notify(
            &self.observers,
            &ResourceProviderEvent::new(
                ResourceType::Extension,
                ResourceEventType::Update,
                request.clone(),
                predicate.cloned(),
            ),
        );

        Ok(base::request_status(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use strata_api::resource::predicate::predicates::{equals, in_values, not_equals};
    use strata_api::{
        ControllerError, OperationStatus, RequestStatusResponse, ResourceError, Status,
    };

    /// RecordingController 记录每次后端调用
    struct RecordingController {
        extensions: Vec<&'static str>,
        get_calls: Mutex<Vec<HashSet<ExtensionRequest>>>,
        update_calls: AtomicUsize,
        update_response: Option<RequestStatusResponse>,
        failure: Option<fn() -> ControllerError>,
    }

    impl RecordingController {
        fn new(extensions: Vec<&'static str>) -> Self {
            Self {
                extensions,
                get_calls: Mutex::new(Vec::new()),
                update_calls: AtomicUsize::new(0),
                update_response: None,
                failure: None,
            }
        }

        fn failing(failure: fn() -> ControllerError) -> Self {
            Self {
                failure: Some(failure),
                ..Self::new(vec![])
            }
        }

        fn get_calls(&self) -> Vec<HashSet<ExtensionRequest>> {
            self.get_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ManagementController for RecordingController {
        async fn get_extensions(
            &self,
            requests: &HashSet<ExtensionRequest>,
        ) -> Result<HashSet<ExtensionResponse>, ControllerError> {
            self.get_calls.lock().unwrap().push(requests.clone());
            if let Some(failure) = self.failure {
                return Err(failure());
            }
            let mut responses = HashSet::new();
            for request in requests {
                for name in &self.extensions {
                    if request.extension_name.as_deref().map_or(true, |n| n == *name) {
                        responses.insert(ExtensionResponse::new(*name));
                    }
                }
            }
            Ok(responses)
        }

        async fn update_stacks(&self) -> Result<Option<RequestStatusResponse>, ControllerError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(failure) = self.failure {
                return Err(failure());
            }
            Ok(self.update_response.clone())
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        events: Mutex<Vec<ResourceProviderEvent>>,
    }

    impl ResourceProviderObserver for CountingObserver {
        fn update(&self, event: &ResourceProviderEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn name_id() -> PropertyId {
        EXTENSION_NAME_PROPERTY_ID.clone()
    }

    fn provider(controller: &Arc<RecordingController>) -> ExtensionResourceProvider {
        ExtensionResourceProvider::new(controller.clone())
    }

    fn names(resources: &HashSet<Resource>) -> Vec<String> {
        let mut names: Vec<String> = resources
            .iter()
            .filter_map(|r| r.property(&name_id()).and_then(Value::as_str).map(String::from))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_property_id_registry_mapping() {
        assert_eq!(name_id().as_str(), "Extensions/extension_name");
        assert!(name_id().ptr_eq(&property_id("Extensions", "extension_name")));
    }

    #[tokio::test]
    async fn test_get_all_without_predicate() {
        let controller = Arc::new(RecordingController::new(vec!["EXT-1.0", "EXT-2.0"]));
        let resources = provider(&controller)
            .get_resources(&Request::default(), None)
            .await
            .unwrap();

        assert_eq!(names(&resources), vec!["EXT-1.0", "EXT-2.0"]);
        assert_eq!(controller.get_calls(), vec![HashSet::from([ExtensionRequest::all()])]);
    }

    #[tokio::test]
    async fn test_get_by_primary_key() {
        let controller = Arc::new(RecordingController::new(vec!["EXT-1.0", "EXT-2.0"]));
        let predicate = equals(name_id(), "EXT-1.0");
        let resources = provider(&controller)
            .get_resources(&Request::read([name_id()]), Some(&predicate))
            .await
            .unwrap();

        assert_eq!(resources.len(), 1);
        let resource = resources.iter().next().unwrap();
        assert_eq!(resource.property(&name_id()), Some(&json!("EXT-1.0")));
        assert_eq!(
            controller.get_calls(),
            vec![HashSet::from([ExtensionRequest::named("EXT-1.0")])]
        );
    }

    #[tokio::test]
    async fn test_disjunction_is_one_batched_call() {
        let controller = Arc::new(RecordingController::new(vec!["EXT-1.0", "EXT-2.0", "EXT-3.0"]));
        let predicate = equals(name_id(), "EXT-1.0").or(equals(name_id(), "EXT-3.0"));
        let resources = provider(&controller)
            .get_resources(&Request::default(), Some(&predicate))
            .await
            .unwrap();

        assert_eq!(names(&resources), vec!["EXT-1.0", "EXT-3.0"]);
        let calls = controller.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2);
    }

    #[tokio::test]
    async fn test_non_key_filter_over_fetches() {
        let controller = Arc::new(RecordingController::new(vec!["EXT-1.0", "EXT-2.0"]));
        let predicate = not_equals(name_id(), "EXT-1.0");
        let resources = provider(&controller)
            .get_resources(&Request::default(), Some(&predicate))
            .await
            .unwrap();

        // 非等值条件不下推，过滤交给调用者
        assert_eq!(resources.len(), 2);
        assert_eq!(controller.get_calls(), vec![HashSet::from([ExtensionRequest::all()])]);
    }

    #[tokio::test]
    async fn test_no_match_returns_empty_set() {
        let controller = Arc::new(RecordingController::new(vec!["EXT-1.0"]));
        let predicate = in_values(name_id(), vec![json!("NOPE-1"), json!("NOPE-2")]);
        let resources = provider(&controller)
            .get_resources(&Request::default(), Some(&predicate))
            .await
            .unwrap();
        assert!(resources.is_empty());
    }

    #[tokio::test]
    async fn test_requested_primary_key_only() {
        let controller = Arc::new(RecordingController::new(vec!["EXT-1.0", "EXT-2.0"]));
        let resources = provider(&controller)
            .get_resources(&Request::read([name_id()]), None)
            .await
            .unwrap();
        assert!(resources
            .iter()
            .all(|r| r.properties().keys().cloned().collect::<Vec<_>>() == vec![name_id()]));
    }

    #[tokio::test]
    async fn test_requested_category_selects_its_properties() {
        let controller = Arc::new(RecordingController::new(vec!["EXT-1.0"]));
        let resources = provider(&controller)
            .get_resources(&Request::read([EXTENSION_CATEGORY.clone()]), None)
            .await
            .unwrap();
        assert_eq!(names(&resources), vec!["EXT-1.0"]);
    }

    #[tokio::test]
    async fn test_get_is_idempotent() {
        let controller = Arc::new(RecordingController::new(vec!["EXT-1.0", "EXT-2.0"]));
        let provider = provider(&controller);
        let predicate = equals(name_id(), "EXT-2.0").or(equals(name_id(), "EXT-1.0"));

        let first = provider.get_resources(&Request::default(), Some(&predicate)).await.unwrap();
        let second = provider.get_resources(&Request::default(), Some(&predicate)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unsupported_property_fails_before_backend_call() {
        let controller = Arc::new(RecordingController::new(vec!["EXT-1.0"]));
        let bogus = property_id("Extensions", "bogus");

        let err = provider(&controller)
            .get_resources(&Request::read([bogus.clone()]), None)
            .await
            .unwrap_err();
        match err {
            ResourceError::UnsupportedProperty { property_ids, resource_type } => {
                assert_eq!(resource_type, ResourceType::Extension);
                assert!(property_ids.contains(&bogus));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let predicate = equals(property_id("Stacks", "stack_name"), "HDP");
        let err = provider(&controller)
            .get_resources(&Request::default(), Some(&predicate))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Stacks/stack_name"));
        assert!(controller.get_calls().is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_is_system_error() {
        let controller = Arc::new(RecordingController::failing(|| {
            ControllerError::Internal("metadata store unavailable".to_string())
        }));
        let err = provider(&controller)
            .get_resources(&Request::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::System { .. }));
        assert!(err.to_string().contains("metadata store unavailable"));
    }

    #[tokio::test]
    async fn test_update_always_refreshes_and_notifies_once() {
        let controller = Arc::new(RecordingController::new(vec!["EXT-1.0"]));
        let observer = Arc::new(CountingObserver::default());
        let provider = provider(&controller).with_observer(observer.clone());

        let status = provider.update_resources(&Request::default(), None).await.unwrap();
        assert_eq!(status.status(), Status::Complete);
        assert_eq!(controller.update_calls.load(Ordering::SeqCst), 1);

        let payload = PropertyMap::from([(name_id(), json!("ignored"))]);
        let predicate = equals(name_id(), "EXT-1.0");
        provider
            .update_resources(&Request::write(vec![payload]), Some(&predicate))
            .await
            .unwrap();
        assert_eq!(controller.update_calls.load(Ordering::SeqCst), 2);

        let events = observer.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|e| e.resource_type == ResourceType::Extension && e.event_type == ResourceEventType::Update));
        assert_eq!(events[1].predicate, Some(predicate));
    }

    #[tokio::test]
    async fn test_update_reflects_tracked_refresh() {
        let controller = Arc::new(RecordingController {
            update_response: Some(RequestStatusResponse::new(12, OperationStatus::Queued)),
            ..RecordingController::new(vec![])
        });
        let status = provider(&controller)
            .update_resources(&Request::default(), None)
            .await
            .unwrap();
        assert_eq!(status.status(), Status::Accepted);
        assert_eq!(status.tracking_id(), Some(12));
    }

    #[tokio::test]
    async fn test_update_backend_failure() {
        let controller = Arc::new(RecordingController::failing(|| {
            ControllerError::StackAccess("invalid stack definition".to_string())
        }));
        let err = provider(&controller)
            .update_resources(&Request::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::System { .. }));
        assert_eq!(controller.update_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_and_delete_are_unsupported() {
        let controller = Arc::new(RecordingController::new(vec!["EXT-1.0"]));
        let provider = provider(&controller);

        let err = provider.delete_resources(&Request::default(), None).await.unwrap_err();
        assert!(matches!(err, ResourceError::UnsupportedOperation { .. }));
        let err = provider.create_resources(&Request::default()).await.unwrap_err();
        assert!(matches!(err, ResourceError::UnsupportedOperation { .. }));

        assert!(controller.get_calls().is_empty());
        assert_eq!(controller.update_calls.load(Ordering::SeqCst), 0);
    }
}
