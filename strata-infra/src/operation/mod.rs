use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use strata_api::{OperationStatus, RequestStatusResponse};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// TrackedOperation 表示一个被异步跟踪的后端操作
#[derive(Debug, Clone, Serialize)]
pub struct TrackedOperation {
    pub id: u64,
    pub context: String,
    pub status: OperationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrackedOperation {
    pub fn to_response(&self) -> RequestStatusResponse {
        RequestStatusResponse::new(self.id, self.status).with_context(self.context.clone())
    }
}

/// 已结束操作的默认保留时间
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(600);

/// OperationTracker 记录异步操作，调用者通过跟踪ID轮询进度或取消
///
/// 已结束的操作在保留时间过后被清理，清理发生在登记新操作时。
pub struct OperationTracker {
    next_id: AtomicU64,
    retention: Duration,
    operations: RwLock<HashMap<u64, TrackedOperation>>,
}

impl OperationTracker {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            retention: DEFAULT_RETENTION,
            operations: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// 登记一个新操作，初始状态为 Queued
    pub async fn begin(&self, context: impl Into<String>) -> TrackedOperation {
        let now = Utc::now();
        let operation = TrackedOperation {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            context: context.into(),
            status: OperationStatus::Queued,
            created_at: now,
            updated_at: now,
        };
        let mut operations = self.operations.write().await;
        Self::prune_expired(&mut operations, self.retention);
        operations.insert(operation.id, operation.clone());
        drop(operations);
        info!(request_id = operation.id, context = %operation.context, "Operation queued");
        operation
    }

    /// 推进操作状态；已结束的操作不能再变化
    pub async fn transition(&self, id: u64, status: OperationStatus) -> Result<TrackedOperation> {
        let mut operations = self.operations.write().await;
        let operation = operations
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Unknown operation {id}"))?;
        if operation.status.is_terminal() {
            bail!("Operation {} already finished with status {}", id, operation.status);
        }
        debug!(request_id = id, from = %operation.status, to = %status, "Operation transition");
        operation.status = status;
        operation.updated_at = Utc::now();
        Ok(operation.clone())
    }

    /// 取消一个尚未结束的操作
    pub async fn abort(&self, id: u64) -> Result<TrackedOperation> {
        self.transition(id, OperationStatus::Aborted).await
    }

    /// 清理超过保留时间的已结束操作，返回清理的数量
    pub async fn prune(&self) -> usize {
        let mut operations = self.operations.write().await;
        Self::prune_expired(&mut operations, self.retention)
    }

    fn prune_expired(operations: &mut HashMap<u64, TrackedOperation>, retention: Duration) -> usize {
        let now = Utc::now();
        let before = operations.len();
        operations.retain(|_, operation| {
            !operation.status.is_terminal()
                || (now - operation.updated_at)
                    .to_std()
                    .map_or(true, |age| age < retention)
        });
        let pruned = before - operations.len();
        if pruned > 0 {
            debug!(pruned, "Pruned finished operations");
        }
        pruned
    }

    pub async fn operation_count(&self) -> usize {
        self.operations.read().await.len()
    }

    pub async fn get(&self, id: u64) -> Option<TrackedOperation> {
        self.operations.read().await.get(&id).cloned()
    }

    /// 轮询直到操作结束或超时
    pub async fn wait_for_completion(
        &self,
        id: u64,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<TrackedOperation> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let operation = self
                .get(id)
                .await
                .ok_or_else(|| anyhow!("Unknown operation {id}"))?;
            if operation.status.is_terminal() {
                return Ok(operation);
            }
            if tokio::time::Instant::now() >= deadline {
                bail!("Timed out waiting for operation {} ({})", id, operation.status);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

impl Default for OperationTracker {
    fn default() -> Self {
        Self::new()
    }
}
