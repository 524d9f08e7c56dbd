//! 领域事件处理器（DomainEventHandler）
//!
//! 业务代码针对具体事件类型实现 `DomainEventHandler<E>`；
//! 注册表与派发器只看到类型擦除后的 `EventHandler`。
//!
use async_trait::async_trait;
use ddd_domain::domain_event::DomainEvent;
use ddd_domain::error::{DomainError, DomainResult};
use std::any::type_name;
use std::marker::PhantomData;

/// 处理某一具体类型的领域事件
#[async_trait]
pub trait DomainEventHandler<E>: Send + Sync + 'static
where
    E: DomainEvent,
{
    async fn handle(&self, event: &E) -> DomainResult<()>;
}

/// 类型擦除后的事件处理器
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// 处理器名称（用于日志与错误信息）
    fn handler_name(&self) -> &'static str;

    async fn handle(&self, event: &dyn DomainEvent) -> DomainResult<()>;
}

pub(crate) struct HandlerAdapter<H, E> {
    handler: H,
    _event: PhantomData<fn(&E)>,
}

impl<H, E> HandlerAdapter<H, E> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            handler,
            _event: PhantomData,
        }
    }
}

#[async_trait]
impl<H, E> EventHandler for HandlerAdapter<H, E>
where
    H: DomainEventHandler<E>,
    E: DomainEvent,
{
    fn handler_name(&self) -> &'static str {
        type_name::<H>()
    }

    async fn handle(&self, event: &dyn DomainEvent) -> DomainResult<()> {
        let Some(typed) = event.downcast_ref::<E>() else {
            return Err(DomainError::TypeMismatch {
                expected: type_name::<E>().to_string(),
                found: event.event_type().to_string(),
            });
        };

        self.handler.handle(typed).await
    }
}
