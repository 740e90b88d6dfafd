use crate::resource::{PropertyId, ResourceType};
use std::collections::BTreeSet;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// ResourceError 是资源提供者对外暴露的错误分类
#[derive(Error, Debug)]
pub enum ResourceError {
    /// 后端执行命令时出现的意外错误
    #[error("System exception: {message}")]
    System {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// 请求或谓词中包含该资源类型不支持的属性
    #[error(
        "The properties [{}] specified in the request or predicate are not supported for the resource type {resource_type}.",
        join(.property_ids)
    )]
    UnsupportedProperty {
        resource_type: ResourceType,
        property_ids: BTreeSet<PropertyId>,
    },

    #[error("{message}")]
    NoSuchResource {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("{message}")]
    NoSuchParentResource {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// 只读资源类型收到了不支持的变更操作
    #[error("{operation} is not supported for the resource type {resource_type}.")]
    UnsupportedOperation {
        resource_type: ResourceType,
        operation: &'static str,
    },

    #[error("No resource provider is registered for the resource type {0}.")]
    UnknownResourceType(ResourceType),
}

impl ResourceError {
    pub fn system(message: impl Into<String>) -> Self {
        ResourceError::System {
            message: message.into(),
            source: None,
        }
    }

    pub fn no_such_resource(message: impl Into<String>) -> Self {
        ResourceError::NoSuchResource {
            message: message.into(),
            source: None,
        }
    }

    pub fn unsupported_property(
        resource_type: ResourceType,
        property_ids: impl IntoIterator<Item = PropertyId>,
    ) -> Self {
        ResourceError::UnsupportedProperty {
            resource_type,
            property_ids: property_ids.into_iter().collect(),
        }
    }

    pub fn unsupported_operation(resource_type: ResourceType, operation: &'static str) -> Self {
        ResourceError::UnsupportedOperation {
            resource_type,
            operation,
        }
    }
}

fn join(ids: &BTreeSet<PropertyId>) -> String {
    ids.iter()
        .map(PropertyId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type ResourceResult<T> = std::result::Result<T, ResourceError>;
