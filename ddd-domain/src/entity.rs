//! 实体（Entity）与共享实体句柄
//!
//! 实体以 `EntityIdentity` 标识。仓储与工作单元之间以 `EntityRef<T>` 传递实体：
//! 它持有 `Arc<RwLock<T>>`，其中 `T` 可以是具体类型（`Order`），也可以是该类型
//! 暴露的接口别名（`dyn OrderRoot`）。无论通过哪个别名访问，底层都是同一个分配，
//! 并且可以随时向下转换回具体类型。
//!
use crate::value_object::EntityIdentity;
use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// 具备唯一标识的实体抽象
pub trait Entity: Send + Sync {
    /// 获取实体标识
    fn id(&self) -> EntityIdentity;
}

/// 共享、可并发读写的实体存储单元
pub type SharedEntity<T> = Arc<RwLock<T>>;

/// 实体句柄：某个实体在别名 `T` 下的视图
///
/// # 示例
///
/// ```
/// use ddd_domain::entity::{EntityRef, SharedEntity};
///
/// trait Named: Send + Sync {
///     fn name(&self) -> &str;
/// }
///
/// struct Widget(String);
///
/// impl Named for Widget {
///     fn name(&self) -> &str {
///         &self.0
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let widget = EntityRef::new(Widget("w".into()));
/// let named = widget.clone().project(|w| w as SharedEntity<dyn Named>);
/// assert_eq!(named.read().await.name(), "w");
/// assert!(named.ptr_eq(&widget));
/// assert!(named.downcast::<Widget>().is_some());
/// # }
/// ```
pub struct EntityRef<T: ?Sized> {
    value: SharedEntity<T>,
    origin: Arc<dyn Any + Send + Sync>,
    concrete: &'static str,
}

impl<E> EntityRef<E>
where
    E: Send + Sync + 'static,
{
    /// 以具体实体值创建句柄
    pub fn new(entity: E) -> Self {
        let value = Arc::new(RwLock::new(entity));
        let origin: Arc<dyn Any + Send + Sync> = value.clone();
        Self {
            value,
            origin,
            concrete: type_name::<E>(),
        }
    }
}

impl<T: ?Sized> EntityRef<T> {
    /// 读锁
    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        self.value.read().await
    }

    /// 写锁
    pub async fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.value.write().await
    }

    /// 取出当前别名下的共享单元
    pub fn shared(&self) -> SharedEntity<T> {
        self.value.clone()
    }

    /// 以另一个别名查看同一实体
    ///
    /// `f` 必须返回同一个分配（通常是一次 unsize 转换，例如
    /// `|order| order as SharedEntity<dyn OrderRoot>`）。
    pub fn project<U: ?Sized>(
        self,
        f: impl FnOnce(SharedEntity<T>) -> SharedEntity<U>,
    ) -> EntityRef<U> {
        EntityRef {
            value: f(self.value),
            origin: self.origin,
            concrete: self.concrete,
        }
    }

    /// 向下转换为具体类型；类型不符时返回 `None`
    pub fn downcast<E>(&self) -> Option<EntityRef<E>>
    where
        E: Send + Sync + 'static,
    {
        self.erase().downcast::<E>()
    }

    /// 擦除别名，仅保留具体分配
    pub fn erase(&self) -> ErasedEntity {
        ErasedEntity {
            origin: self.origin.clone(),
            type_name: self.concrete,
        }
    }

    /// 具体实体类型名
    pub fn type_name(&self) -> &'static str {
        self.concrete
    }

    /// 两个句柄是否指向同一实体（忽略别名）
    pub fn ptr_eq<U: ?Sized>(&self, other: &EntityRef<U>) -> bool {
        Arc::ptr_eq(&self.origin, &other.origin)
    }
}

impl<T: ?Sized> Clone for EntityRef<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            origin: self.origin.clone(),
            concrete: self.concrete,
        }
    }
}

impl<T: ?Sized> fmt::Debug for EntityRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("alias", &type_name::<T>())
            .field("concrete", &self.concrete)
            .finish()
    }
}

/// 类型擦除后的实体句柄，用于跨越对象安全边界
#[derive(Clone)]
pub struct ErasedEntity {
    origin: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ErasedEntity {
    /// 还原为具体类型的句柄
    pub fn downcast<E>(&self) -> Option<EntityRef<E>>
    where
        E: Send + Sync + 'static,
    {
        let value = self.origin.clone().downcast::<RwLock<E>>().ok()?;
        Some(EntityRef {
            value,
            origin: self.origin.clone(),
            concrete: self.type_name,
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn ptr_eq(&self, other: &ErasedEntity) -> bool {
        Arc::ptr_eq(&self.origin, &other.origin)
    }
}

impl fmt::Debug for ErasedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedEntity")
            .field("type_name", &self.type_name)
            .finish()
    }
}
