#![allow(dead_code)]

use async_trait::async_trait;
use ddd_domain::aggregate::{Aggregate, HasDomainEvents};
use ddd_domain::domain_event::{DomainEvent, DomainEvents};
use ddd_domain::entity::{EntityRef, SharedEntity};
use ddd_domain::error::{DomainError, DomainResult};
use ddd_domain::value_object::EntityIdentity;
use ddd_macros::{aggregate, domain_event, entity};
use ddd_repository::{
    DomainEventDispatcher, DomainEventHandler, EntityStrategy, EntityTypes, EventHandlerRegistry,
    HandlerCandidate, InMemoryObjectFactory, InMemoryStorage, Repository, RepositoryError,
    StorageAdapter, StrategyCandidate, StrategyRegistry, TrackedEntity, UnitOfWork,
    UnitOfWorkConfig,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

// ---------------- journal ----------------

/// 按发生顺序记录派发、校验与持久化
#[derive(Clone, Debug, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }
}

// ---------------- domain ----------------

pub trait OrderRoot: Send + Sync {
    fn is_shipped(&self) -> bool;
    fn line_count(&self) -> usize;
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderLine {
    pub product_id: EntityIdentity,
    pub quantity: u32,
}

#[domain_event]
pub struct OrderShipped {
    pub order_id: EntityIdentity,
    pub lines: Vec<OrderLine>,
}

#[domain_event]
pub struct OrderNoted {
    pub order_id: EntityIdentity,
    pub note: String,
}

#[aggregate]
pub struct Order {
    lines: Vec<OrderLine>,
    shipped: bool,
    journal: Journal,
}

impl Order {
    pub fn place(journal: &Journal) -> Self {
        Self {
            id: EntityIdentity::random(),
            lines: Vec::new(),
            shipped: false,
            journal: journal.clone(),
            domain_events: DomainEvents::default(),
        }
    }

    pub fn add_line(&mut self, product_id: EntityIdentity, quantity: u32) {
        self.lines.push(OrderLine {
            product_id,
            quantity,
        });
    }

    pub fn ship(&mut self) {
        self.shipped = true;
        let event = OrderShipped {
            order_id: self.id,
            lines: self.lines.clone(),
        };
        self.record_event(event);
    }

    pub fn note(&mut self, note: &str) {
        let event = OrderNoted {
            order_id: self.id,
            note: note.to_string(),
        };
        self.record_event(event);
    }
}

impl Aggregate for Order {
    fn assert_valid(&self) -> DomainResult<()> {
        self.journal.push("validate Order");

        let mut seen = HashSet::new();
        for line in &self.lines {
            if !seen.insert(line.product_id) {
                return Err(DomainError::invalid_state(format!(
                    "duplicate order line for product {}",
                    line.product_id
                )));
            }
        }
        Ok(())
    }
}

impl OrderRoot for Order {
    fn is_shipped(&self) -> bool {
        self.shipped
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }
}

#[entity]
pub struct Inventory {
    on_hand: u32,
}

impl Inventory {
    pub fn stock(product_id: EntityIdentity, on_hand: u32) -> Self {
        Self {
            id: product_id,
            on_hand,
        }
    }

    pub fn on_hand(&self) -> u32 {
        self.on_hand
    }

    pub fn reduce(&mut self, quantity: u32) -> DomainResult<()> {
        self.on_hand = self
            .on_hand
            .checked_sub(quantity)
            .ok_or_else(|| DomainError::invalid_state("insufficient inventory"))?;
        Ok(())
    }
}

// ---------------- strategies ----------------

pub struct OrderStrategy {
    storage: Arc<InMemoryStorage>,
    removals: Arc<AtomicUsize>,
}

#[async_trait]
impl EntityStrategy for OrderStrategy {
    type Entity = Order;

    fn entity_types(&self) -> EntityTypes<Order> {
        EntityTypes::<Order>::new()
            .concrete()
            .alias(|order| order as SharedEntity<dyn OrderRoot>)
    }

    async fn add(&self, entity: EntityRef<Order>) -> DomainResult<()> {
        let id = entity.read().await.id;
        self.storage.add(id, TrackedEntity::aggregate(&entity)).await
    }

    async fn load(&self, id: EntityIdentity) -> DomainResult<Option<EntityRef<Order>>> {
        Ok(self.storage.find::<Order>(id).await)
    }

    async fn remove(&self, entity: EntityRef<Order>) -> DomainResult<()> {
        let id = entity.read().await.id;
        self.removals.fetch_add(1, Ordering::SeqCst);
        self.storage.remove(id).await;
        Ok(())
    }
}

pub struct InventoryStrategy {
    storage: Arc<InMemoryStorage>,
}

#[async_trait]
impl EntityStrategy for InventoryStrategy {
    type Entity = Inventory;

    fn entity_types(&self) -> EntityTypes<Inventory> {
        EntityTypes::<Inventory>::new().concrete()
    }

    async fn add(&self, entity: EntityRef<Inventory>) -> DomainResult<()> {
        let id = entity.read().await.id;
        self.storage.add(id, TrackedEntity::entity(&entity)).await
    }

    async fn load(&self, id: EntityIdentity) -> DomainResult<Option<EntityRef<Inventory>>> {
        Ok(self.storage.find::<Inventory>(id).await)
    }

    async fn remove(&self, entity: EntityRef<Inventory>) -> DomainResult<()> {
        let id = entity.read().await.id;
        self.storage.remove(id).await;
        Ok(())
    }
}

/// 记录持久化顺序的存储包装
pub struct JournaledStorage {
    inner: Arc<InMemoryStorage>,
    journal: Journal,
}

#[async_trait]
impl StorageAdapter for JournaledStorage {
    async fn tracked_entities(&self) -> Vec<TrackedEntity> {
        self.inner.tracked_entities().await
    }

    async fn save_changes(&self) -> DomainResult<()> {
        self.journal.push("persist");
        self.inner.save_changes().await
    }
}

// ---------------- handlers ----------------

fn unit_of_work(slot: &Weak<UnitOfWork>) -> DomainResult<Arc<UnitOfWork>> {
    slot.upgrade()
        .ok_or_else(|| DomainError::invalid_state("unit of work is gone"))
}

fn repository_failure(err: RepositoryError) -> DomainError {
    DomainError::Repository {
        reason: err.to_string(),
    }
}

/// 记录派发顺序
pub struct Recorder {
    journal: Journal,
}

#[async_trait]
impl DomainEventHandler<OrderShipped> for Recorder {
    async fn handle(&self, event: &OrderShipped) -> DomainResult<()> {
        self.journal.push(format!("dispatch {}", event.event_type()));
        Ok(())
    }
}

#[async_trait]
impl DomainEventHandler<OrderNoted> for Recorder {
    async fn handle(&self, event: &OrderNoted) -> DomainResult<()> {
        self.journal.push(format!("dispatch {}", event.event_type()));
        Ok(())
    }
}

/// 发货后扣减库存，并在处理器内重入提交
pub struct ReduceInventoryWhenOrderShipped {
    uow: Weak<UnitOfWork>,
}

#[async_trait]
impl DomainEventHandler<OrderShipped> for ReduceInventoryWhenOrderShipped {
    async fn handle(&self, event: &OrderShipped) -> DomainResult<()> {
        let uow = unit_of_work(&self.uow)?;
        for line in &event.lines {
            let inventory = uow
                .load_required::<Inventory>(line.product_id)
                .await
                .map_err(repository_failure)?;
            inventory.write().await.reduce(line.quantity)?;
        }
        uow.commit().await.map_err(repository_failure)
    }
}

/// 在已派发的聚合上追加新事件
pub struct NoteShipment {
    uow: Weak<UnitOfWork>,
}

#[async_trait]
impl DomainEventHandler<OrderShipped> for NoteShipment {
    async fn handle(&self, event: &OrderShipped) -> DomainResult<()> {
        let uow = unit_of_work(&self.uow)?;
        let order = uow
            .load_required::<Order>(event.order_id)
            .await
            .map_err(repository_failure)?;
        order.write().await.note("packed");
        Ok(())
    }
}

/// 每次处理都重新记录同一事件，永不收敛
pub struct Echo {
    uow: Weak<UnitOfWork>,
}

#[async_trait]
impl DomainEventHandler<OrderNoted> for Echo {
    async fn handle(&self, event: &OrderNoted) -> DomainResult<()> {
        let uow = unit_of_work(&self.uow)?;
        let order = uow
            .load_required::<Order>(event.order_id)
            .await
            .map_err(repository_failure)?;
        order.write().await.note(&event.note);
        Ok(())
    }
}

pub struct RejectShipment;

#[async_trait]
impl DomainEventHandler<OrderShipped> for RejectShipment {
    async fn handle(&self, _event: &OrderShipped) -> DomainResult<()> {
        Err(DomainError::event_handler(
            "RejectShipment",
            "carrier unavailable",
        ))
    }
}

// ---------------- fixture ----------------

pub struct Fixture {
    pub uow: Arc<UnitOfWork>,
    pub storage: Arc<InMemoryStorage>,
    pub journal: Journal,
    pub order_removals: Arc<AtomicUsize>,
}

impl Fixture {
    pub fn new(handlers: Vec<HandlerCandidate>) -> Result<Self, RepositoryError> {
        Self::with_config(handlers, UnitOfWorkConfig::default())
    }

    pub fn with_config(
        handlers: Vec<HandlerCandidate>,
        config: UnitOfWorkConfig,
    ) -> Result<Self, RepositoryError> {
        let journal = Journal::default();
        let storage = Arc::new(InMemoryStorage::new());
        let order_removals = Arc::new(AtomicUsize::new(0));
        let slot: Arc<OnceLock<Weak<UnitOfWork>>> = Arc::default();

        let factory = Arc::new(InMemoryObjectFactory::new());
        {
            let storage = storage.clone();
            let removals = order_removals.clone();
            factory.register(move || OrderStrategy {
                storage: storage.clone(),
                removals: removals.clone(),
            });
        }
        {
            let storage = storage.clone();
            factory.register(move || InventoryStrategy {
                storage: storage.clone(),
            });
        }
        {
            let journal = journal.clone();
            factory.register(move || Recorder {
                journal: journal.clone(),
            });
        }
        {
            let slot = slot.clone();
            factory.register(move || ReduceInventoryWhenOrderShipped {
                uow: slot.get().cloned().unwrap_or_default(),
            });
        }
        {
            let slot = slot.clone();
            factory.register(move || NoteShipment {
                uow: slot.get().cloned().unwrap_or_default(),
            });
        }
        {
            let slot = slot.clone();
            factory.register(move || Echo {
                uow: slot.get().cloned().unwrap_or_default(),
            });
        }
        factory.register(|| RejectShipment);

        let strategies = StrategyRegistry::new(vec![
            StrategyCandidate::of::<OrderStrategy>(),
            StrategyCandidate::of::<InventoryStrategy>(),
        ]);
        let dispatcher =
            DomainEventDispatcher::new(Arc::new(EventHandlerRegistry::new(handlers)), factory.clone());
        let adapter = JournaledStorage {
            inner: storage.clone(),
            journal: journal.clone(),
        };

        let uow = Arc::new(
            UnitOfWork::builder()
                .storage(Arc::new(adapter))
                .strategies(Arc::new(strategies))
                .dispatcher(Arc::new(dispatcher))
                .factory(factory)
                .config(config)
                .build()?,
        );
        let _ = slot.set(Arc::downgrade(&uow));

        Ok(Self {
            uow,
            storage,
            journal,
            order_removals,
        })
    }

    /// 新建一个订单并加入工作单元（不提交）
    pub async fn place_order(&self) -> Result<EntityRef<Order>, RepositoryError> {
        let order = EntityRef::new(Order::place(&self.journal));
        self.uow.add(order.clone()).await?;
        Ok(order)
    }

    /// 直接写入一条已持久化的库存
    pub async fn seed_inventory(&self, on_hand: u32) -> EntityRef<Inventory> {
        let product_id = EntityIdentity::random();
        let inventory = EntityRef::new(Inventory::stock(product_id, on_hand));
        self.storage
            .seed(product_id, TrackedEntity::entity(&inventory))
            .await;
        inventory
    }
}
