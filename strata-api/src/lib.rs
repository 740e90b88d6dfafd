pub mod controller;
pub mod resource;

pub use controller::{
    ControllerError, ExtensionRequest, ExtensionResponse, ManagementController, OperationStatus,
    RequestStatusResponse,
};

pub use resource::{
    property_id, Predicate, PropertyId, PropertyMap, Request, RequestStatus, Resource,
    ResourceError, ResourceEventType, ResourceProvider, ResourceProviderEvent,
    ResourceProviderObserver, ResourceResult, ResourceType, Status,
};
