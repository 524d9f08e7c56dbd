//! 持久化策略（Persistence Strategy）
//!
//! 每个具体实体类型对应一个 `EntityStrategy`，负责该实体的添加、加载与移除。
//! 一个策略可以通过 `EntityTypes` 暴露多个类型别名（具体类型本身、它实现的接口 trait
//! object 等），仓储按别名找到策略后统一通过对象安全的 `PersistenceStrategy` 调用。
//!
use crate::factory::TypeKey;
use async_trait::async_trait;
use ddd_domain::entity::{EntityRef, ErasedEntity, SharedEntity};
use ddd_domain::error::{DomainError, DomainResult};
use ddd_domain::value_object::EntityIdentity;
use std::any::{Any, type_name};

/// 针对具体实体类型的持久化策略
///
/// # 示例
///
/// ```ignore
/// #[async_trait]
/// impl EntityStrategy for OrderStrategy {
///     type Entity = Order;
///
///     fn entity_types(&self) -> EntityTypes<Order> {
///         EntityTypes::<Order>::new()
///             .concrete()
///             .alias(|order| order as SharedEntity<dyn OrderRoot>)
///     }
///     // add / load / remove ...
/// }
/// ```
#[async_trait]
pub trait EntityStrategy: Send + Sync + 'static {
    /// 该策略负责的具体实体类型
    type Entity: Send + Sync + 'static;

    /// 该策略暴露的类型别名
    fn entity_types(&self) -> EntityTypes<Self::Entity>;

    /// 添加实体（不提交）
    async fn add(&self, entity: EntityRef<Self::Entity>) -> DomainResult<()>;

    /// 按标识加载实体，不存在时返回 `None`
    async fn load(&self, id: EntityIdentity) -> DomainResult<Option<EntityRef<Self::Entity>>>;

    /// 移除实体（不提交）
    async fn remove(&self, entity: EntityRef<Self::Entity>) -> DomainResult<()>;
}

type Projection<E> = Box<dyn Fn(EntityRef<E>) -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// 策略暴露的类型别名集合
///
/// 每个别名附带一个投影：把具体实体句柄 `EntityRef<E>` 转为别名视图 `EntityRef<U>`，
/// 二者共享同一个分配。
pub struct EntityTypes<E> {
    aliases: Vec<(TypeKey, Projection<E>)>,
}

impl<E> Default for EntityTypes<E> {
    fn default() -> Self {
        Self {
            aliases: Vec::new(),
        }
    }
}

impl<E> EntityTypes<E>
where
    E: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// 以具体类型本身作为别名
    pub fn concrete(self) -> Self {
        self.alias::<E>(|entity| entity)
    }

    /// 追加一个别名，`upcast` 通常是一次 unsize 转换
    pub fn alias<U>(mut self, upcast: fn(SharedEntity<E>) -> SharedEntity<U>) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
    {
        let projection: Projection<E> =
            Box::new(move |entity: EntityRef<E>| -> Box<dyn Any + Send + Sync> {
                Box::new(entity.project(upcast))
            });
        self.aliases.push((TypeKey::of::<U>(), projection));
        self
    }

    pub fn keys(&self) -> Vec<TypeKey> {
        self.aliases.iter().map(|(key, _)| *key).collect()
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.aliases.iter().any(|(k, _)| k == key)
    }

    /// 投影到别名 `key`；别名不存在时返回 `None`
    pub fn project(
        &self,
        key: &TypeKey,
        entity: EntityRef<E>,
    ) -> Option<Box<dyn Any + Send + Sync>> {
        self.aliases
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, projection)| projection(entity))
    }
}

/// 类型擦除后的持久化策略，由注册表按别名解析得到
#[async_trait]
pub trait PersistenceStrategy: Send + Sync {
    /// 策略实现类型名
    fn strategy_type(&self) -> &'static str;

    fn entity_types(&self) -> Vec<TypeKey>;

    async fn add(&self, entity: ErasedEntity) -> DomainResult<()>;

    /// 加载实体并投影为别名 `entity_type`，返回值为 `Box<EntityRef<Alias>>`
    async fn load(
        &self,
        entity_type: &TypeKey,
        id: EntityIdentity,
    ) -> DomainResult<Option<Box<dyn Any + Send + Sync>>>;

    async fn remove(&self, entity: ErasedEntity) -> DomainResult<()>;
}

pub(crate) struct StrategyAdapter<S> {
    inner: S,
}

impl<S: EntityStrategy> StrategyAdapter<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self { inner }
    }

    fn concrete(entity: &ErasedEntity) -> DomainResult<EntityRef<S::Entity>> {
        entity
            .downcast::<S::Entity>()
            .ok_or_else(|| DomainError::TypeMismatch {
                expected: type_name::<S::Entity>().to_string(),
                found: entity.type_name().to_string(),
            })
    }
}

#[async_trait]
impl<S: EntityStrategy> PersistenceStrategy for StrategyAdapter<S> {
    fn strategy_type(&self) -> &'static str {
        type_name::<S>()
    }

    fn entity_types(&self) -> Vec<TypeKey> {
        self.inner.entity_types().keys()
    }

    async fn add(&self, entity: ErasedEntity) -> DomainResult<()> {
        let entity = Self::concrete(&entity)?;
        self.inner.add(entity).await
    }

    async fn load(
        &self,
        entity_type: &TypeKey,
        id: EntityIdentity,
    ) -> DomainResult<Option<Box<dyn Any + Send + Sync>>> {
        let Some(entity) = self.inner.load(id).await? else {
            return Ok(None);
        };

        self.inner
            .entity_types()
            .project(entity_type, entity)
            .map(Some)
            .ok_or_else(|| DomainError::TypeMismatch {
                expected: entity_type.name().to_string(),
                found: type_name::<S::Entity>().to_string(),
            })
    }

    async fn remove(&self, entity: ErasedEntity) -> DomainResult<()> {
        let entity = Self::concrete(&entity)?;
        self.inner.remove(entity).await
    }
}
