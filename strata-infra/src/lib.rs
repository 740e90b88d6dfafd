pub mod controller;
pub mod event;
pub mod operation;

pub use controller::{InMemoryManagementController, RefreshMode};
pub use event::EventBus;
pub use operation::{OperationTracker, TrackedOperation};
