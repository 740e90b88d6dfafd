use strata_api::{ResourceProviderEvent, ResourceProviderObserver};
use tokio::sync::broadcast;
use tracing::debug;

/// EventBus 把资源变更事件广播给所有订阅者
///
/// 发送是尽力而为的：没有订阅者或订阅者落后都不会影响发布方。
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ResourceProviderEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResourceProviderEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl ResourceProviderObserver for EventBus {
    fn update(&self, event: &ResourceProviderEvent) {
        match self.sender.send(event.clone()) {
            Ok(receivers) => debug!(
                resource_type = %event.resource_type,
                event_type = ?event.event_type,
                receivers,
                "Published resource change event"
            ),
            Err(_) => debug!(
                resource_type = %event.resource_type,
                "No subscribers for resource change event"
            ),
        }
    }
}
