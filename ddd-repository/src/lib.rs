//! 仓储与工作单元（ddd-repository）
//!
//! 让领域对象的添加、加载、移除与提交不依赖具体存储技术，并保证：
//! - 聚合上记录的领域事件在事务提交前派发给处理器；
//! - 全部事件派发完成后、持久化之前，校验每个聚合的不变量。
//!
//! 组成：
//! - `factory`：对象工厂协议（依赖注入容器的抽象），`InMemoryObjectFactory` 为内存实现；
//! - `strategy` / `strategy_registry`：按类型别名解析持久化策略；
//! - `event_handler` / `handler_registry` / `dispatcher`：按事件具体类型解析并顺序执行处理器；
//! - `storage`：存储适配器协议，`InMemoryStorage` 为内存实现；
//! - `repository` / `unit_of_work`：仓储接口与提交协议。
//!
pub mod dispatcher;
pub mod error;
pub mod event_handler;
pub mod factory;
pub mod handler_registry;
pub mod inmemory_object_factory;
pub mod inmemory_storage;
pub mod repository;
pub mod storage;
pub mod strategy;
pub mod strategy_registry;
pub mod unit_of_work;

pub use dispatcher::{DomainEventDispatcher, EventDispatcher};
pub use error::{RepositoryError, RepositoryResult};
pub use event_handler::{DomainEventHandler, EventHandler};
pub use factory::{ObjectFactory, TypeKey};
pub use handler_registry::{EventHandlerRegistry, HandlerCandidate};
pub use inmemory_object_factory::InMemoryObjectFactory;
pub use inmemory_storage::{EntryState, InMemoryStorage};
pub use repository::Repository;
pub use storage::{StorageAdapter, TrackedEntity};
pub use strategy::{EntityStrategy, EntityTypes, PersistenceStrategy};
pub use strategy_registry::{StrategyCandidate, StrategyRegistry};
pub use unit_of_work::{UnitOfWork, UnitOfWorkConfig};
