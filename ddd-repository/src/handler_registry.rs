//! 事件处理器注册表（EventHandlerRegistry）
//!
//! 维护“事件类型 -> 处理器类型列表”的映射，保持声明顺序。处理器实例在每次查询时
//! 通过对象工厂构造，以便处理器拿到属于当前工作单元的依赖。
//!
use crate::error::{RepositoryError, RepositoryResult};
use crate::event_handler::{DomainEventHandler, EventHandler, HandlerAdapter};
use crate::factory::{ObjectFactory, TypeKey};
use ddd_domain::domain_event::DomainEvent;
use once_cell::sync::OnceCell;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use tracing::{debug, info};

type Bind = fn(Box<dyn Any + Send + Sync>) -> Option<Box<dyn EventHandler>>;

fn bind<H, E>(instance: Box<dyn Any + Send + Sync>) -> Option<Box<dyn EventHandler>>
where
    H: DomainEventHandler<E>,
    E: DomainEvent,
{
    let handler = instance.downcast::<H>().ok()?;
    Some(Box::new(HandlerAdapter::<H, E>::new(*handler)))
}

/// 候选处理器：处理器类型、其处理的事件类型与绑定函数
#[derive(Clone, Copy, Debug)]
pub struct HandlerCandidate {
    handler: TypeKey,
    event: TypeKey,
    bind: Bind,
}

impl HandlerCandidate {
    pub fn of<H, E>() -> Self
    where
        H: DomainEventHandler<E>,
        E: DomainEvent,
    {
        Self {
            handler: TypeKey::of::<H>(),
            event: TypeKey::of::<E>(),
            bind: bind::<H, E>,
        }
    }

    pub fn handler_type(&self) -> &'static str {
        self.handler.name()
    }

    pub fn event_type(&self) -> &'static str {
        self.event.name()
    }
}

/// 事件类型到处理器的注册表
pub struct EventHandlerRegistry {
    candidates: Vec<HandlerCandidate>,
    by_event: OnceCell<HashMap<TypeId, Vec<HandlerCandidate>>>,
}

impl EventHandlerRegistry {
    pub fn new(candidates: Vec<HandlerCandidate>) -> Self {
        Self {
            candidates,
            by_event: OnceCell::new(),
        }
    }

    /// 填充注册表；已填充时直接返回
    pub fn scan(&self) {
        self.table();
    }

    pub fn is_populated(&self) -> bool {
        self.by_event.get().is_some()
    }

    /// 构造处理 `event` 的全部处理器实例（按声明顺序）
    ///
    /// 仅匹配事件的具体类型；没有注册处理器时返回空列表。
    pub fn handlers_for(
        &self,
        factory: &dyn ObjectFactory,
        event: &dyn DomainEvent,
    ) -> RepositoryResult<Vec<Box<dyn EventHandler>>> {
        let Some(candidates) = self.table().get(&event.as_any().type_id()) else {
            return Ok(Vec::new());
        };

        candidates
            .iter()
            .map(|candidate| {
                factory
                    .create(&candidate.handler)
                    .and_then(candidate.bind)
                    .ok_or(RepositoryError::HandlerConstruction {
                        handler: candidate.handler_type(),
                        event_type: event.event_type(),
                    })
            })
            .collect()
    }

    /// 已注册处理器的事件类型；未扫描时为空
    pub fn registered_events(&self) -> Vec<TypeKey> {
        let Some(by_event) = self.by_event.get() else {
            return Vec::new();
        };

        let mut events: Vec<TypeKey> = Vec::with_capacity(by_event.len());
        for candidate in &self.candidates {
            if !events.contains(&candidate.event) {
                events.push(candidate.event);
            }
        }
        events
    }

    fn table(&self) -> &HashMap<TypeId, Vec<HandlerCandidate>> {
        self.by_event.get_or_init(|| {
            let mut by_event: HashMap<TypeId, Vec<HandlerCandidate>> = HashMap::new();
            for candidate in &self.candidates {
                debug!(
                    event_type = candidate.event_type(),
                    handler = candidate.handler_type(),
                    "registered domain event handler"
                );
                by_event
                    .entry(candidate.event.id())
                    .or_default()
                    .push(*candidate);
            }

            info!(
                handlers = self.candidates.len(),
                event_types = by_event.len(),
                "event handler registry populated"
            );
            by_event
        })
    }
}

impl FromIterator<HandlerCandidate> for EventHandlerRegistry {
    fn from_iter<I: IntoIterator<Item = HandlerCandidate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryObjectFactory;
    use async_trait::async_trait;
    use ddd_domain::error::DomainResult;
    use ddd_macros::domain_event;

    #[domain_event]
    struct Shipped {
        parcels: u32,
    }

    #[domain_event]
    struct Cancelled;

    struct Notify;
    struct Audit;

    #[async_trait]
    impl DomainEventHandler<Shipped> for Notify {
        async fn handle(&self, _event: &Shipped) -> DomainResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl DomainEventHandler<Shipped> for Audit {
        async fn handle(&self, _event: &Shipped) -> DomainResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl DomainEventHandler<Cancelled> for Audit {
        async fn handle(&self, _event: &Cancelled) -> DomainResult<()> {
            Ok(())
        }
    }

    fn registry() -> EventHandlerRegistry {
        [
            HandlerCandidate::of::<Notify, Shipped>(),
            HandlerCandidate::of::<Audit, Shipped>(),
            HandlerCandidate::of::<Audit, Cancelled>(),
        ]
        .into_iter()
        .collect()
    }

    fn factory() -> InMemoryObjectFactory {
        let factory = InMemoryObjectFactory::new();
        factory.register(|| Notify);
        factory.register(|| Audit);
        factory
    }

    #[test]
    fn exact_type_match_in_declaration_order() {
        let registry = registry();
        registry.scan();

        let handlers = registry
            .handlers_for(&factory(), &Shipped { parcels: 2 })
            .unwrap();
        let names: Vec<_> = handlers.iter().map(|h| h.handler_name()).collect();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with("Notify"));
        assert!(names[1].ends_with("Audit"));

        let handlers = registry.handlers_for(&factory(), &Cancelled).unwrap();
        assert_eq!(handlers.len(), 1);
    }

    #[test]
    fn unregistered_event_yields_no_handlers() {
        #[domain_event]
        struct Unrelated;

        let registry = registry();
        assert!(
            registry
                .handlers_for(&factory(), &Unrelated)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn scan_is_idempotent() {
        let registry = registry();
        assert!(!registry.is_populated());
        assert!(registry.registered_events().is_empty());

        registry.scan();
        registry.scan();
        assert!(registry.is_populated());
        assert_eq!(
            registry.registered_events(),
            vec![TypeKey::of::<Shipped>(), TypeKey::of::<Cancelled>()]
        );
        assert_eq!(
            registry
                .handlers_for(&factory(), &Shipped { parcels: 1 })
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn unconstructible_handler_is_reported() {
        let registry = registry();
        let factory = InMemoryObjectFactory::new();
        factory.register(|| Notify);

        match registry.handlers_for(&factory, &Shipped { parcels: 1 }) {
            Err(RepositoryError::HandlerConstruction {
                handler,
                event_type,
            }) => {
                assert!(handler.ends_with("Audit"));
                assert_eq!(event_type, "Shipped");
            }
            Err(other) => panic!("unexpected {other:?}"),
            Ok(_) => panic!("Audit cannot be constructed"),
        }
    }
}
