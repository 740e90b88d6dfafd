pub mod cluster;
pub mod provider;

pub use cluster::ClusterController;

pub use provider::{
    CommandContext, ExtensionResourceProvider, ProviderContext, ProviderFactory, ProviderRegistry,
    ProviderSchema, EXTENSION_CATEGORY, EXTENSION_NAME_PROPERTY_ID,
};
