pub mod base;
pub mod command;
pub mod extension;
pub mod registry;

pub use base::ProviderSchema;
pub use command::CommandContext;
pub use extension::{ExtensionResourceProvider, EXTENSION_CATEGORY, EXTENSION_NAME_PROPERTY_ID};
pub use registry::{ProviderContext, ProviderFactory, ProviderRegistry};
