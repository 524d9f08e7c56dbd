//! 领域事件派发器（EventDispatcher）
//!
//! 为单个事件解析全部处理器并依次执行：前一个处理器完成后才调用下一个，
//! 任一处理器失败即中止本事件的派发（其余处理器不再调用），且不重试。
//!
use crate::error::{RepositoryError, RepositoryResult};
use crate::factory::ObjectFactory;
use crate::handler_registry::EventHandlerRegistry;
use async_trait::async_trait;
use ddd_domain::domain_event::DomainEvent;
use std::sync::Arc;
use tracing::{debug, warn};

/// 事件派发器
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(&self, event: &dyn DomainEvent) -> RepositoryResult<()>;
}

/// 基于 `EventHandlerRegistry` 的顺序派发器
pub struct DomainEventDispatcher {
    registry: Arc<EventHandlerRegistry>,
    factory: Arc<dyn ObjectFactory>,
}

impl DomainEventDispatcher {
    pub fn new(registry: Arc<EventHandlerRegistry>, factory: Arc<dyn ObjectFactory>) -> Self {
        Self { registry, factory }
    }
}

#[async_trait]
impl EventDispatcher for DomainEventDispatcher {
    async fn dispatch(&self, event: &dyn DomainEvent) -> RepositoryResult<()> {
        self.registry.scan();

        let handlers = self.registry.handlers_for(self.factory.as_ref(), event)?;
        if handlers.is_empty() {
            debug!(event_type = event.event_type(), "no handler for domain event");
            return Ok(());
        }

        for handler in handlers {
            debug!(
                event_type = event.event_type(),
                handler = handler.handler_name(),
                "handling domain event"
            );

            if let Err(source) = handler.handle(event).await {
                warn!(
                    event_type = event.event_type(),
                    handler = handler.handler_name(),
                    error = %source,
                    "domain event handler failed"
                );
                return Err(RepositoryError::HandlerFailure {
                    handler: handler.handler_name(),
                    event_type: event.event_type(),
                    source,
                });
            }
        }

        Ok(())
    }
}
