//! 存储适配器（StorageAdapter）
//!
//! 对底层存储及其变更跟踪器的抽象：工作单元在提交时读取被跟踪的实体
//! （以便派发聚合上的领域事件并校验不变量），随后要求存储在单个事务中持久化全部变更。
//!
use async_trait::async_trait;
use ddd_domain::aggregate::Aggregate;
use ddd_domain::entity::{EntityRef, ErasedEntity, SharedEntity};
use ddd_domain::error::DomainResult;
use std::fmt;

/// 被存储跟踪的实体；若为聚合则附带聚合视图
#[derive(Clone)]
pub struct TrackedEntity {
    entity: ErasedEntity,
    aggregate: Option<SharedEntity<dyn Aggregate>>,
}

impl TrackedEntity {
    /// 跟踪一个聚合
    pub fn aggregate<A: Aggregate>(entity: &EntityRef<A>) -> Self {
        let aggregate: SharedEntity<dyn Aggregate> = entity.shared();
        Self {
            entity: entity.erase(),
            aggregate: Some(aggregate),
        }
    }

    /// 跟踪一个普通实体（非聚合）
    pub fn entity<E: Send + Sync + 'static>(entity: &EntityRef<E>) -> Self {
        Self {
            entity: entity.erase(),
            aggregate: None,
        }
    }

    pub fn as_aggregate(&self) -> Option<&SharedEntity<dyn Aggregate>> {
        self.aggregate.as_ref()
    }

    pub fn erased(&self) -> &ErasedEntity {
        &self.entity
    }

    pub fn is_aggregate(&self) -> bool {
        self.aggregate.is_some()
    }
}

impl fmt::Debug for TrackedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedEntity")
            .field("type_name", &self.entity.type_name())
            .field("aggregate", &self.is_aggregate())
            .finish()
    }
}

#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// 当前被跟踪的实体（按跟踪顺序）
    async fn tracked_entities(&self) -> Vec<TrackedEntity>;

    /// 在单个事务中持久化全部被跟踪的变更
    async fn save_changes(&self) -> DomainResult<()>;
}
