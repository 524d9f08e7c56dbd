//! 工作单元（UnitOfWork）
//!
//! `Repository` 的默认实现。提交流程严格按以下顺序执行：
//! 1. 读取存储当前跟踪的实体，取出其中的聚合；
//! 2. 按跟踪顺序逐个聚合派发待处理事件：每个事件先从聚合上移除，再派发并等待完成；
//!    处理器在派发期间新记录的事件会在下一轮继续派发，轮数受 `max_drain_rounds` 限制；
//! 3. 全部事件派发完成后，校验每个聚合的不变量（包括没有事件的聚合）；
//! 4. 全部校验通过后，要求存储在单个事务中持久化。
//!
//! 任一步失败即中止提交，已派发的事件不会恢复到聚合上。
//!
use crate::dispatcher::EventDispatcher;
use crate::error::{RepositoryError, RepositoryResult};
use crate::factory::{ObjectFactory, TypeKey};
use crate::repository::Repository;
use crate::storage::StorageAdapter;
use crate::strategy::PersistenceStrategy;
use crate::strategy_registry::StrategyRegistry;
use async_trait::async_trait;
use bon::Builder;
use ddd_domain::aggregate::Aggregate;
use ddd_domain::domain_event::DomainEvent;
use ddd_domain::entity::{EntityRef, SharedEntity};
use ddd_domain::error::DomainError;
use ddd_domain::value_object::EntityIdentity;
use std::any::type_name;
use std::sync::Arc;
use tracing::{debug, warn};

/// 工作单元配置
#[derive(Clone, Copy, Debug)]
pub struct UnitOfWorkConfig {
    /// 单次提交内对聚合事件的最大派发轮数
    pub max_drain_rounds: usize,
}

impl Default for UnitOfWorkConfig {
    fn default() -> Self {
        Self {
            max_drain_rounds: 16,
        }
    }
}

/// 工作单元：仓储 + 提交协议
///
/// 通过 `UnitOfWork::builder()` 构造，`build()` 时立即扫描策略注册表。
#[derive(Builder)]
#[builder(finish_fn(name = build_unscanned, vis = ""))]
pub struct UnitOfWork {
    storage: Arc<dyn StorageAdapter>,
    strategies: Arc<StrategyRegistry>,
    dispatcher: Arc<dyn EventDispatcher>,
    factory: Arc<dyn ObjectFactory>,
    #[builder(default)]
    config: UnitOfWorkConfig,
}

impl<S: unit_of_work_builder::IsComplete> UnitOfWorkBuilder<S> {
    /// 构造工作单元并扫描策略注册表；扫描失败时返回错误
    pub fn build(self) -> RepositoryResult<UnitOfWork> {
        let unit_of_work = self.build_unscanned();
        unit_of_work
            .strategies
            .scan(unit_of_work.factory.as_ref())?;
        Ok(unit_of_work)
    }
}

impl UnitOfWork {
    pub fn config(&self) -> &UnitOfWorkConfig {
        &self.config
    }

    fn strategy_for(
        &self,
        entity_type: &TypeKey,
    ) -> RepositoryResult<Box<dyn PersistenceStrategy>> {
        self.strategies.resolve(self.factory.as_ref(), entity_type)
    }

    /// 第 2 步：派发所有待处理事件
    async fn dispatch_pending(
        &self,
        aggregates: &[SharedEntity<dyn Aggregate>],
    ) -> RepositoryResult<()> {
        let max_rounds = self.config.max_drain_rounds.max(1);

        for round in 1..=max_rounds {
            for aggregate in aggregates {
                self.drain(aggregate).await?;
            }

            if !has_pending_events(aggregates).await {
                return Ok(());
            }
            debug!(round, "domain events recorded during dispatch, draining again");
        }

        warn!(rounds = max_rounds, "pending domain events left after drain limit");
        Err(RepositoryError::DrainLimitExceeded { rounds: max_rounds })
    }

    /// 派发本轮开始时聚合上已有的事件
    async fn drain(&self, aggregate: &SharedEntity<dyn Aggregate>) -> RepositoryResult<()> {
        let pending = aggregate.read().await.domain_events().len();

        for _ in 0..pending {
            // 重入的提交可能已经取走了剩余事件
            let Some(event) = take_next_event(aggregate).await else {
                break;
            };

            if let Err(err) = self.dispatcher.dispatch(event.as_ref()).await {
                warn!(
                    event_type = event.event_type(),
                    error = %err,
                    "domain event dispatch failed, event is not restored"
                );
                return Err(err);
            }
        }

        Ok(())
    }

    /// 第 3 步：校验每个聚合的不变量
    async fn assert_invariants(
        &self,
        aggregates: &[SharedEntity<dyn Aggregate>],
    ) -> RepositoryResult<()> {
        for aggregate in aggregates {
            let aggregate = aggregate.read().await;
            if let Err(source) = aggregate.assert_valid() {
                warn!(
                    aggregate = aggregate.aggregate_type(),
                    id = %aggregate.id(),
                    error = %source,
                    "aggregate invariant violated, commit aborted"
                );
                return Err(RepositoryError::InvariantViolation {
                    aggregate: aggregate.aggregate_type(),
                    source,
                });
            }
        }

        Ok(())
    }
}

/// 取出聚合上最早的待派发事件；写锁在返回前释放
async fn take_next_event(
    aggregate: &SharedEntity<dyn Aggregate>,
) -> Option<Box<dyn DomainEvent>> {
    let mut guard = aggregate.write().await;
    guard.domain_events_mut().take_next()
}

async fn has_pending_events(aggregates: &[SharedEntity<dyn Aggregate>]) -> bool {
    for aggregate in aggregates {
        if !aggregate.read().await.domain_events().is_empty() {
            return true;
        }
    }
    false
}

#[async_trait]
impl Repository for UnitOfWork {
    async fn add<T>(&self, entity: EntityRef<T>) -> RepositoryResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let strategy = self.strategy_for(&TypeKey::of::<T>())?;
        debug!(
            entity_type = type_name::<T>(),
            strategy = strategy.strategy_type(),
            "adding entity"
        );
        strategy.add(entity.erase()).await?;
        Ok(())
    }

    async fn load<T>(&self, id: EntityIdentity) -> RepositoryResult<Option<EntityRef<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let entity_type = TypeKey::of::<T>();
        let strategy = self.strategy_for(&entity_type)?;

        let Some(found) = strategy.load(&entity_type, id).await? else {
            return Ok(None);
        };

        let entity = found.downcast::<EntityRef<T>>().map_err(|_| {
            DomainError::TypeMismatch {
                expected: type_name::<EntityRef<T>>().to_string(),
                found: strategy.strategy_type().to_string(),
            }
        })?;
        Ok(Some(*entity))
    }

    async fn remove<T>(&self, id: EntityIdentity) -> RepositoryResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let strategy = self.strategy_for(&TypeKey::of::<T>())?;

        let Some(entity) = self.load::<T>(id).await? else {
            debug!(entity_type = type_name::<T>(), %id, "nothing to remove");
            return Ok(());
        };

        strategy.remove(entity.erase()).await?;
        Ok(())
    }

    async fn commit(&self) -> RepositoryResult<()> {
        let tracked = self.storage.tracked_entities().await;
        let aggregates: Vec<SharedEntity<dyn Aggregate>> = tracked
            .iter()
            .filter_map(|t| t.as_aggregate().cloned())
            .collect();
        debug!(
            tracked = tracked.len(),
            aggregates = aggregates.len(),
            "commit requested"
        );

        self.dispatch_pending(&aggregates).await?;
        debug!("domain events dispatched");

        self.assert_invariants(&aggregates).await?;
        debug!("aggregate invariants validated");

        self.storage.save_changes().await?;
        debug!(tracked = tracked.len(), "changes persisted");
        Ok(())
    }
}
