use std::future::Future;
use strata_api::{ControllerError, ResourceError, ResourceResult};
use tracing::{error, warn};

/// 命令执行的上下文，只影响错误信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandContext {
    Query,
    Modify,
}

impl CommandContext {
    fn action(&self) -> &'static str {
        match self {
            CommandContext::Query => "getting",
            CommandContext::Modify => "modifying",
        }
    }
}

/// 把后端的领域错误翻译成对外的错误分类，原始错误保留为 source
pub fn translate(context: CommandContext, err: ControllerError) -> ResourceError {
    match err {
        e @ ControllerError::ParentObjectNotFound(_) => {
            warn!("Parent resource not found while {} resources: {}", context.action(), e);
            ResourceError::NoSuchParentResource {
                message: e.to_string(),
                source: Some(Box::new(e)),
            }
        }
        e @ ControllerError::ObjectNotFound(_) => {
            warn!("Resource not found while {} resources: {}", context.action(), e);
            ResourceError::NoSuchResource {
                message: format!("The requested resource doesn't exist: {e}"),
                source: Some(Box::new(e)),
            }
        }
        e => {
            error!("Caught exception {} resources: {}", context.action(), e);
            ResourceError::System {
                message: format!("Caught exception {} resources: {}", context.action(), e),
                source: Some(Box::new(e)),
            }
        }
    }
}

/// 执行一次后端命令；命令只被调用一次，成功结果原样返回
pub async fn execute<T, F, Fut>(context: CommandContext, command: F) -> ResourceResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ControllerError>>,
{
    command().await.map_err(|e| translate(context, e))
}

pub async fn get_resources<T, F, Fut>(command: F) -> ResourceResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ControllerError>>,
{
    execute(CommandContext::Query, command).await
}

pub async fn modify_resources<T, F, Fut>(command: F) -> ResourceResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ControllerError>>,
{
    execute(CommandContext::Modify, command).await
}
