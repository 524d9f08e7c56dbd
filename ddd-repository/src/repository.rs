//! 仓储（Repository）
//!
//! 面向业务代码的持久化入口。`T` 是实体的具体类型或其任一已注册的别名
//! （例如 `Order` 与 `dyn OrderRoot`），仓储按 `T` 解析持久化策略并委托执行。
//! `add`/`remove` 只登记变更，`commit` 才会派发事件、校验不变量并持久化。
//!
use crate::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use ddd_domain::entity::EntityRef;
use ddd_domain::value_object::EntityIdentity;
use std::any::type_name;

/// 仓储接口
///
/// 带有泛型方法，通常以具体实现类型（`Arc<UnitOfWork>`）注入使用。
#[async_trait]
pub trait Repository: Send + Sync {
    /// 添加实体（不提交）
    async fn add<T>(&self, entity: EntityRef<T>) -> RepositoryResult<()>
    where
        T: ?Sized + Send + Sync + 'static;

    /// 按标识加载实体，不存在时返回 `None`
    async fn load<T>(&self, id: EntityIdentity) -> RepositoryResult<Option<EntityRef<T>>>
    where
        T: ?Sized + Send + Sync + 'static;

    /// 按标识加载实体，不存在时返回 `EntityNotFound`
    async fn load_required<T>(&self, id: EntityIdentity) -> RepositoryResult<EntityRef<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.load::<T>(id)
            .await?
            .ok_or(RepositoryError::EntityNotFound {
                entity_type: type_name::<T>(),
                id,
            })
    }

    /// 按标识移除实体（不提交）；实体不存在时什么也不做
    async fn remove<T>(&self, id: EntityIdentity) -> RepositoryResult<()>
    where
        T: ?Sized + Send + Sync + 'static;

    /// 派发领域事件、校验不变量并在单个事务中持久化全部变更
    async fn commit(&self) -> RepositoryResult<()>;
}
