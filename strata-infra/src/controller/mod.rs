use crate::operation::OperationTracker;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use strata_api::{
    ControllerError, ExtensionRequest, ExtensionResponse, ManagementController, OperationStatus,
    RequestStatusResponse,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const REFRESH_CONTEXT: &str = "Refresh stack metadata";

/// 栈元数据刷新的执行方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// 在调用中完成刷新，不产生跟踪ID
    #[default]
    Synchronous,
    /// 登记为异步操作并在后台任务中完成
    Asynchronous,
}

/// InMemoryManagementController 基于内存目录的管理控制器
///
/// 已登记（staged）的扩展定义在栈元数据刷新之后才对查询可见。
pub struct InMemoryManagementController {
    active: Arc<RwLock<BTreeSet<String>>>,
    staged: Arc<RwLock<BTreeSet<String>>>,
    tracker: Arc<OperationTracker>,
    refresh_mode: RefreshMode,
}

impl InMemoryManagementController {
    pub fn new<I, S>(extensions: I, tracker: Arc<OperationTracker>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let catalog: BTreeSet<String> = extensions.into_iter().map(Into::into).collect();
        Self {
            active: Arc::new(RwLock::new(catalog.clone())),
            staged: Arc::new(RwLock::new(catalog)),
            tracker,
            refresh_mode: RefreshMode::default(),
        }
    }

    pub fn with_refresh_mode(mut self, refresh_mode: RefreshMode) -> Self {
        self.refresh_mode = refresh_mode;
        self
    }

    pub fn tracker(&self) -> &Arc<OperationTracker> {
        &self.tracker
    }

    /// 登记一个扩展定义，下一次刷新后生效
    pub async fn stage_extension(&self, extension_name: impl Into<String>) {
        self.staged.write().await.insert(extension_name.into());
    }

    /// 移除一个扩展定义，下一次刷新后生效
    pub async fn unstage_extension(&self, extension_name: &str) -> bool {
        self.staged.write().await.remove(extension_name)
    }

    /// 当前对查询可见的扩展名称
    pub async fn extension_names(&self) -> Vec<String> {
        self.active.read().await.iter().cloned().collect()
    }

    async fn reload(active: &RwLock<BTreeSet<String>>, staged: &RwLock<BTreeSet<String>>) -> usize {
        let snapshot = staged.read().await.clone();
        let count = snapshot.len();
        *active.write().await = snapshot;
        count
    }
}

#[async_trait]
impl ManagementController for InMemoryManagementController {
    async fn get_extensions(
        &self,
        requests: &HashSet<ExtensionRequest>,
    ) -> Result<HashSet<ExtensionResponse>, ControllerError> {
        let active = self.active.read().await;
        let mut responses = HashSet::new();

        for request in requests {
            match request.extension_name.as_deref() {
                Some(name) if active.contains(name) => {
                    responses.insert(ExtensionResponse::new(name));
                }
                Some(name) => {
                    // 缺失的名称不是错误，交给调用者决定精确匹配的语义
                    debug!(extension_name = name, "Extension not found in catalog");
                }
                None => {
                    responses.extend(active.iter().map(ExtensionResponse::new));
                }
            }
        }

        debug!(
            request_count = requests.len(),
            response_count = responses.len(),
            "Resolved extension requests"
        );
        Ok(responses)
    }

    async fn update_stacks(&self) -> Result<Option<RequestStatusResponse>, ControllerError> {
        match self.refresh_mode {
            RefreshMode::Synchronous => {
                let count = Self::reload(&self.active, &self.staged).await;
                info!(extension_count = count, "Stack metadata refreshed");
                Ok(None)
            }
            RefreshMode::Asynchronous => {
                let operation = self.tracker.begin(REFRESH_CONTEXT).await;
                let id = operation.id;
                let tracker = Arc::clone(&self.tracker);
                let active = Arc::clone(&self.active);
                let staged = Arc::clone(&self.staged);

                tokio::spawn(async move {
                    // 如果操作在开始前已被取消，则不执行刷新
                    if let Err(e) = tracker.transition(id, OperationStatus::InProgress).await {
                        warn!(request_id = id, "Skipping stack refresh: {}", e);
                        return;
                    }
                    let count = Self::reload(&active, &staged).await;
                    match tracker.transition(id, OperationStatus::Completed).await {
                        Ok(_) => info!(request_id = id, extension_count = count, "Stack metadata refreshed"),
                        Err(e) => warn!(request_id = id, "Failed to complete stack refresh: {}", e),
                    }
                });

                Ok(Some(operation.to_response()))
            }
        }
    }
}
