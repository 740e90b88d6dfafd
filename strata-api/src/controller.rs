//! 管理控制器的出站接口
//!
//! 资源提供者只依赖这里定义的操作；编排和持久化由实现方负责。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// ExtensionRequest 按名称查询扩展，名称为空表示不加约束
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionRequest {
    pub extension_name: Option<String>,
}

impl ExtensionRequest {
    pub fn new(extension_name: Option<String>) -> Self {
        Self { extension_name }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn named(extension_name: impl Into<String>) -> Self {
        Self::new(Some(extension_name.into()))
    }
}

/// ExtensionResponse 描述一个匹配的扩展
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionResponse {
    pub extension_name: String,
}

impl ExtensionResponse {
    pub fn new(extension_name: impl Into<String>) -> Self {
        Self {
            extension_name: extension_name.into(),
        }
    }
}

/// 后端异步操作的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationStatus {
    Pending,
    Queued,
    InProgress,
    Completed,
    Failed,
    Aborted,
}

impl OperationStatus {
    /// 操作是否已经结束
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationStatus::Completed | OperationStatus::Failed | OperationStatus::Aborted
        )
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OperationStatus::Pending => "PENDING",
            OperationStatus::Queued => "QUEUED",
            OperationStatus::InProgress => "IN_PROGRESS",
            OperationStatus::Completed => "COMPLETED",
            OperationStatus::Failed => "FAILED",
            OperationStatus::Aborted => "ABORTED",
        };
        f.write_str(text)
    }
}

/// RequestStatusResponse 是后端对一次异步操作的回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStatusResponse {
    pub request_id: u64,
    pub status: OperationStatus,
    pub context: Option<String>,
}

impl RequestStatusResponse {
    pub fn new(request_id: u64, status: OperationStatus) -> Self {
        Self {
            request_id,
            status,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// ControllerError 是管理控制器内部的领域错误
///
/// 它不能越过资源提供者的边界，必须先被翻译成 `ResourceError`。
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Parent object not found: {0}")]
    ParentObjectNotFound(String),

    #[error("Stack access error: {0}")]
    StackAccess(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// ManagementController 是资源提供者依赖的后端协作者
#[async_trait]
pub trait ManagementController: Send + Sync {
    /// 批量查询扩展；一次调用处理全部请求
    async fn get_extensions(
        &self,
        requests: &HashSet<ExtensionRequest>,
    ) -> Result<HashSet<ExtensionResponse>, ControllerError>;

    /// 重新加载栈元数据；返回 None 表示同步完成
    async fn update_stacks(&self) -> Result<Option<RequestStatusResponse>, ControllerError>;
}
