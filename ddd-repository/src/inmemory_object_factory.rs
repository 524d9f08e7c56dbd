use crate::factory::{ObjectFactory, TypeKey};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

type Constructor = Arc<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// 基于内存的 ObjectFactory 实现
/// - 通过 TypeId 注册不同类型对应的构造函数
/// - 每次 `create` 都调用构造函数产生新实例
pub struct InMemoryObjectFactory {
    constructors: DashMap<TypeId, Constructor>,
}

impl Default for InMemoryObjectFactory {
    fn default() -> Self {
        Self {
            constructors: DashMap::new(),
        }
    }
}

impl InMemoryObjectFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册类型 `T` 的构造函数，重复注册时覆盖
    pub fn register<T, F>(&self, constructor: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let f: Constructor =
            Arc::new(move || -> Box<dyn Any + Send + Sync> { Box::new(constructor()) });
        self.constructors.insert(TypeId::of::<T>(), f);
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.constructors.contains_key(&key.id())
    }
}

impl ObjectFactory for InMemoryObjectFactory {
    fn create(&self, key: &TypeKey) -> Option<Box<dyn Any + Send + Sync>> {
        // 先克隆出构造函数再调用，避免构造过程中持有 DashMap 分片锁
        let f = self.constructors.get(&key.id()).map(|c| c.clone())?;
        Some(f())
    }
}
