use async_trait::async_trait;
use ddd_domain::aggregate::{Aggregate, HasDomainEvents};
use ddd_domain::domain_event::{DomainEvent, DomainEvents};
use ddd_domain::entity::{Entity, EntityRef, SharedEntity};
use ddd_domain::error::{DomainError, DomainResult};
use ddd_domain::value_object::{EntityIdentity, NonEmptyString, PositiveInteger};
use ddd_macros::{aggregate, domain_event, entity};
use ddd_repository::{
    DomainEventDispatcher, DomainEventHandler, EntityStrategy, EntityTypes, EventHandlerRegistry,
    HandlerCandidate, InMemoryObjectFactory, InMemoryStorage, Repository, RepositoryError,
    StrategyCandidate, StrategyRegistry, TrackedEntity, UnitOfWork,
};
use std::collections::HashSet;
use std::sync::{Arc, OnceLock, Weak};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// ---------------- domain ----------------

trait OrderRoot: Send + Sync {
    fn customer(&self) -> &str;
    fn is_shipped(&self) -> bool;
}

#[derive(Clone, Debug, PartialEq)]
struct OrderLine {
    product_id: EntityIdentity,
    quantity: PositiveInteger,
}

#[domain_event(event_type = "order.shipped")]
struct OrderShipped {
    order_id: EntityIdentity,
    lines: Vec<OrderLine>,
}

#[aggregate]
struct Order {
    customer: NonEmptyString,
    lines: Vec<OrderLine>,
    shipped: bool,
}

impl Order {
    fn place(customer: NonEmptyString) -> Self {
        Self {
            id: EntityIdentity::random(),
            customer,
            lines: Vec::new(),
            shipped: false,
            domain_events: DomainEvents::default(),
        }
    }

    fn add_line(&mut self, product_id: EntityIdentity, quantity: PositiveInteger) {
        self.lines.push(OrderLine {
            product_id,
            quantity,
        });
    }

    fn ship(&mut self) -> DomainResult<()> {
        if self.shipped {
            return Err(DomainError::invalid_state("order already shipped"));
        }
        self.shipped = true;
        let event = OrderShipped {
            order_id: self.id,
            lines: self.lines.clone(),
        };
        self.record_event(event);
        Ok(())
    }
}

impl Aggregate for Order {
    fn assert_valid(&self) -> DomainResult<()> {
        let mut products = HashSet::new();
        for line in &self.lines {
            if !products.insert(line.product_id) {
                return Err(DomainError::invalid_state(format!(
                    "product {} appears in more than one order line",
                    line.product_id
                )));
            }
        }
        Ok(())
    }
}

impl OrderRoot for Order {
    fn customer(&self) -> &str {
        &self.customer
    }

    fn is_shipped(&self) -> bool {
        self.shipped
    }
}

#[entity]
struct Inventory {
    on_hand: i64,
}

impl Inventory {
    fn reduce(&mut self, quantity: PositiveInteger) -> DomainResult<()> {
        let remaining = self.on_hand - quantity.value();
        if remaining < 0 {
            return Err(DomainError::invalid_state(format!(
                "insufficient inventory for product {}",
                self.id
            )));
        }
        self.on_hand = remaining;
        Ok(())
    }
}

// ---------------- persistence ----------------

struct OrderStrategy {
    storage: Arc<InMemoryStorage>,
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
        let id = entity.read().await.id();
        self.storage.add(id, TrackedEntity::aggregate(&entity)).await
    }

    async fn load(&self, id: EntityIdentity) -> DomainResult<Option<EntityRef<Order>>> {
        Ok(self.storage.find::<Order>(id).await)
    }

    async fn remove(&self, entity: EntityRef<Order>) -> DomainResult<()> {
        let id = entity.read().await.id();
        self.storage.remove(id).await;
        Ok(())
    }
}

struct InventoryStrategy {
    storage: Arc<InMemoryStorage>,
}

#[async_trait]
impl EntityStrategy for InventoryStrategy {
    type Entity = Inventory;

    fn entity_types(&self) -> EntityTypes<Inventory> {
        EntityTypes::<Inventory>::new().concrete()
    }

    async fn add(&self, entity: EntityRef<Inventory>) -> DomainResult<()> {
        let id = entity.read().await.id();
        self.storage.add(id, TrackedEntity::entity(&entity)).await
    }

    async fn load(&self, id: EntityIdentity) -> DomainResult<Option<EntityRef<Inventory>>> {
        Ok(self.storage.find::<Inventory>(id).await)
    }

    async fn remove(&self, entity: EntityRef<Inventory>) -> DomainResult<()> {
        let id = entity.read().await.id();
        self.storage.remove(id).await;
        Ok(())
    }
}

// ---------------- handlers ----------------

/// 发货后扣减库存，并在同一工作单元中提交
struct ReduceInventoryWhenOrderShipped {
    uow: Weak<UnitOfWork>,
}

#[async_trait]
impl DomainEventHandler<OrderShipped> for ReduceInventoryWhenOrderShipped {
    async fn handle(&self, event: &OrderShipped) -> DomainResult<()> {
        let uow = self
            .uow
            .upgrade()
            .ok_or_else(|| DomainError::invalid_state("unit of work is gone"))?;
        let failure = |err: RepositoryError| DomainError::Repository {
            reason: err.to_string(),
        };

        for line in &event.lines {
            let inventory = uow
                .load_required::<Inventory>(line.product_id)
                .await
                .map_err(failure)?;
            inventory.write().await.reduce(line.quantity)?;
        }
        uow.commit().await.map_err(failure)
    }
}

struct AnnounceShipment;

#[async_trait]
impl DomainEventHandler<OrderShipped> for AnnounceShipment {
    async fn handle(&self, event: &OrderShipped) -> DomainResult<()> {
        tracing::info!(
            event_type = event.event_type(),
            order_id = %event.order_id,
            lines = event.lines.len(),
            "order shipped"
        );
        Ok(())
    }
}

// ---------------- wiring ----------------

struct App {
    uow: Arc<UnitOfWork>,
    storage: Arc<InMemoryStorage>,
}

fn wire() -> anyhow::Result<App> {
    let storage = Arc::new(InMemoryStorage::new());
    let slot: Arc<OnceLock<Weak<UnitOfWork>>> = Arc::default();

    let factory = Arc::new(InMemoryObjectFactory::new());
    {
        let storage = storage.clone();
        factory.register(move || OrderStrategy {
            storage: storage.clone(),
        });
    }
    {
        let storage = storage.clone();
        factory.register(move || InventoryStrategy {
            storage: storage.clone(),
        });
    }
    {
        let slot = slot.clone();
        factory.register(move || ReduceInventoryWhenOrderShipped {
            uow: slot.get().cloned().unwrap_or_default(),
        });
    }
    factory.register(|| AnnounceShipment);

    let strategies = StrategyRegistry::new(vec![
        StrategyCandidate::of::<OrderStrategy>(),
        StrategyCandidate::of::<InventoryStrategy>(),
    ]);
    let handlers = EventHandlerRegistry::new(vec![
        HandlerCandidate::of::<AnnounceShipment, OrderShipped>(),
        HandlerCandidate::of::<ReduceInventoryWhenOrderShipped, OrderShipped>(),
    ]);
    let dispatcher = DomainEventDispatcher::new(Arc::new(handlers), factory.clone());

    let uow = Arc::new(
        UnitOfWork::builder()
            .storage(storage.clone())
            .strategies(Arc::new(strategies))
            .dispatcher(Arc::new(dispatcher))
            .factory(factory)
            .build()?,
    );
    let _ = slot.set(Arc::downgrade(&uow));

    Ok(App { uow, storage })
}

async fn stock(app: &App, on_hand: i64) -> anyhow::Result<EntityIdentity> {
    let id = EntityIdentity::random();
    app.uow.add(EntityRef::new(Inventory { id, on_hand })).await?;
    Ok(id)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 下单并发货：处理器扣减库存并在提交过程中重入提交
    let app = wire()?;
    let pens = stock(&app, 10).await?;
    let inks = stock(&app, 5).await?;
    app.uow.commit().await?;

    let order = EntityRef::new(Order::place(NonEmptyString::new("alice")?));
    {
        let mut order = order.write().await;
        order.add_line(pens, PositiveInteger::new(3)?);
        order.add_line(inks, PositiveInteger::new(2)?);
    }
    let order_id = order.read().await.id();
    app.uow
        .add(order.project(|order| order as SharedEntity<dyn OrderRoot>))
        .await?;
    app.uow.commit().await?;

    let root = app.uow.load_required::<dyn OrderRoot>(order_id).await?;
    {
        let root = root.read().await;
        println!(
            "placed: order={}, customer={}, shipped={}",
            order_id,
            root.customer(),
            root.is_shipped()
        );
    }

    let order = app.uow.load_required::<Order>(order_id).await?;
    order.write().await.ship()?;
    app.uow.commit().await?;

    for product in [pens, inks] {
        let inventory = app.uow.load_required::<Inventory>(product).await?;
        println!("inventory: product={}, on_hand={}", product, inventory.read().await.on_hand);
    }
    println!("saves: {}", app.storage.save_count());

    // 不变量不成立时提交中止，不会持久化
    let app = wire()?;
    let pens = stock(&app, 10).await?;
    let order = EntityRef::new(Order::place(NonEmptyString::new("bob")?));
    {
        let mut order = order.write().await;
        order.add_line(pens, PositiveInteger::new(1)?);
        order.add_line(pens, PositiveInteger::new(1)?);
    }
    let order_id = order.read().await.id();
    app.uow.add(order).await?;
    match app.uow.commit().await {
        Ok(()) => println!("unexpected: invalid order committed"),
        Err(err) => println!("rejected: {err}"),
    }
    println!(
        "persisted after rejection: order={}, saves={}",
        app.storage.is_stored(order_id).await,
        app.storage.save_count()
    );

    Ok(())
}
