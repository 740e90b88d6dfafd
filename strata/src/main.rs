mod config;
mod error;

use config::{Config, LoggingConfig};
use error::Result;
use std::sync::Arc;
use std::time::Duration;
use strata_api::{Request, ResourceProviderEvent, ResourceType};
use strata_infra::{EventBus, InMemoryManagementController, OperationTracker, RefreshMode};
use strata_service::{ClusterController, ProviderContext, EXTENSION_NAME_PROPERTY_ID};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::discover()?;

    // 初始化日志
    init_logging(&config.logging)?;

    info!("Starting Strata...");
    run(&config).await?;
    info!("Strata finished");

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| format!("Invalid log level {}: {}", logging.level, e))?;
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to set tracing subscriber: {}", e))?;
    Ok(())
}

async fn run(config: &Config) -> Result<()> {
    let tracker = Arc::new(OperationTracker::new());
    let refresh_mode = if config.controller.async_refresh {
        RefreshMode::Asynchronous
    } else {
        RefreshMode::Synchronous
    };
    let backend = Arc::new(
        InMemoryManagementController::new(config.controller.extensions.iter().cloned(), tracker.clone())
            .with_refresh_mode(refresh_mode),
    );
    info!(
        extension_count = config.controller.extensions.len(),
        refresh_mode = ?refresh_mode,
        "Management controller initialized"
    );

    // 事件总线
    let bus = EventBus::new(config.events.capacity);
    tokio::spawn(log_events(bus.subscribe()));

    let context = ProviderContext::new(backend).with_observer(Arc::new(bus));
    let cluster = ClusterController::new(&context);
    info!(resource_types = ?cluster.registry().resource_types(), "Cluster controller initialized");

    log_extensions(&cluster).await?;

    if config.controller.refresh_on_start {
        let status = cluster
            .update_resources(ResourceType::Extension, &Request::default(), None)
            .await?;
        info!(
            status = %status.status(),
            request_id = ?status.tracking_id(),
            "Stack metadata refresh requested"
        );

        if let Some(id) = status.tracking_id() {
            let operation = tracker
                .wait_for_completion(id, POLL_INTERVAL, REFRESH_TIMEOUT)
                .await?;
            info!(request_id = id, status = %operation.status, "Stack metadata refresh finished");
        }
        log_extensions(&cluster).await?;
    }

    Ok(())
}

async fn log_extensions(cluster: &ClusterController) -> Result<Vec<String>> {
    let resources = cluster
        .get_resources(ResourceType::Extension, &Request::read([EXTENSION_NAME_PROPERTY_ID.clone()]), None)
        .await?;

    let mut names: Vec<String> = resources
        .iter()
        .filter_map(|resource| resource.property(&EXTENSION_NAME_PROPERTY_ID))
        .filter_map(|value| value.as_str().map(String::from))
        .collect();
    names.sort();

    for name in &names {
        info!(extension_name = %name, "Extension available");
    }
    info!(extension_count = names.len(), "Extensions listed");
    Ok(names)
}

async fn log_events(mut events: broadcast::Receiver<ResourceProviderEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => info!(
                resource_type = %event.resource_type,
                event_type = ?event.event_type,
                "Resource change event"
            ),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Resource change events dropped"),
            Err(RecvError::Closed) => break,
        }
    }
}
