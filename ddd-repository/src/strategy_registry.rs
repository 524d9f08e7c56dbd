//! 策略注册表（StrategyRegistry）
//!
//! 启动时声明一组候选策略（`StrategyCandidate`），`scan` 通过对象工厂逐个构造候选，
//! 读取其暴露的类型别名，建立“别名 -> 策略实现”的映射。映射一经建立不再变化；
//! `resolve` 每次都通过工厂构造新的策略实例，不做缓存。
//!
use crate::error::{RepositoryError, RepositoryResult};
use crate::factory::{ObjectFactory, TypeKey};
use crate::strategy::{EntityStrategy, PersistenceStrategy, StrategyAdapter};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::collections::HashMap;
use tracing::{debug, info};

type Bind = fn(Box<dyn Any + Send + Sync>) -> Option<Box<dyn PersistenceStrategy>>;

fn bind<S: EntityStrategy>(
    instance: Box<dyn Any + Send + Sync>,
) -> Option<Box<dyn PersistenceStrategy>> {
    let strategy = instance.downcast::<S>().ok()?;
    Some(Box::new(StrategyAdapter::new(*strategy)))
}

/// 候选策略：策略实现类型的键与绑定函数
#[derive(Clone, Copy, Debug)]
pub struct StrategyCandidate {
    key: TypeKey,
    bind: Bind,
}

impl StrategyCandidate {
    pub fn of<S: EntityStrategy>() -> Self {
        Self {
            key: TypeKey::of::<S>(),
            bind: bind::<S>,
        }
    }

    pub fn strategy_type(&self) -> &'static str {
        self.key.name()
    }

    fn construct(
        &self,
        factory: &dyn ObjectFactory,
    ) -> RepositoryResult<Box<dyn PersistenceStrategy>> {
        let instance = factory.create(&self.key).ok_or_else(|| {
            RepositoryError::StrategyConstruction {
                strategy: self.key.name(),
                reason: "object factory returned no instance".to_string(),
            }
        })?;

        (self.bind)(instance).ok_or_else(|| RepositoryError::StrategyConstruction {
            strategy: self.key.name(),
            reason: "object factory returned an instance of another type".to_string(),
        })
    }
}

/// 别名到策略实现的注册表
pub struct StrategyRegistry {
    candidates: Vec<StrategyCandidate>,
    by_type: OnceCell<HashMap<TypeKey, StrategyCandidate>>,
}

impl StrategyRegistry {
    pub fn new(candidates: Vec<StrategyCandidate>) -> Self {
        Self {
            candidates,
            by_type: OnceCell::new(),
        }
    }

    /// 扫描候选并填充注册表；已填充时直接返回
    ///
    /// 构造失败或别名重复时返回错误，注册表保持未填充状态。
    pub fn scan(&self, factory: &dyn ObjectFactory) -> RepositoryResult<()> {
        self.by_type
            .get_or_try_init(|| self.populate(factory))
            .map(|_| ())
    }

    pub fn is_populated(&self) -> bool {
        self.by_type.get().is_some()
    }

    /// 为类型别名 `entity_type` 构造一个新的策略实例
    pub fn resolve(
        &self,
        factory: &dyn ObjectFactory,
        entity_type: &TypeKey,
    ) -> RepositoryResult<Box<dyn PersistenceStrategy>> {
        let candidate = self
            .by_type
            .get()
            .and_then(|by_type| by_type.get(entity_type))
            .ok_or(RepositoryError::StrategyNotFound {
                entity_type: entity_type.name(),
            })?;

        candidate.construct(factory)
    }

    /// 已注册的类型别名；未扫描时为空
    pub fn registered_types(&self) -> Vec<TypeKey> {
        self.by_type
            .get()
            .map(|by_type| by_type.keys().copied().collect())
            .unwrap_or_default()
    }

    fn populate(
        &self,
        factory: &dyn ObjectFactory,
    ) -> RepositoryResult<HashMap<TypeKey, StrategyCandidate>> {
        let mut by_type: HashMap<TypeKey, StrategyCandidate> = HashMap::new();

        for candidate in &self.candidates {
            let strategy = candidate.construct(factory)?;

            for entity_type in strategy.entity_types() {
                if let Some(existing) = by_type.get(&entity_type) {
                    return Err(RepositoryError::DuplicateStrategyAlias {
                        entity_type: entity_type.name(),
                        existing: existing.strategy_type(),
                        duplicate: candidate.strategy_type(),
                    });
                }

                debug!(
                    entity_type = entity_type.name(),
                    strategy = candidate.strategy_type(),
                    "registered persistence strategy"
                );
                by_type.insert(entity_type, *candidate);
            }
        }

        info!(
            strategies = self.candidates.len(),
            entity_types = by_type.len(),
            "strategy registry populated"
        );
        Ok(by_type)
    }
}

impl FromIterator<StrategyCandidate> for StrategyRegistry {
    fn from_iter<I: IntoIterator<Item = StrategyCandidate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
