use std::any::Any;
use std::fmt;

/// 领域事件载荷需要满足的通用能力边界
///
/// 通常通过 `#[domain_event]` 宏实现。
pub trait DomainEvent: Any + fmt::Debug + Send + Sync {
    /// 事件类型（默认即类型名，可通过宏参数覆盖）
    fn event_type(&self) -> &'static str;

    /// 以 `Any` 视图访问事件，用于按具体类型匹配处理器
    fn as_any(&self) -> &dyn Any;
}

impl<'a> dyn DomainEvent + 'a {
    /// 尝试将事件视为具体类型 `E`
    pub fn downcast_ref<E: DomainEvent>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }

    /// 是否为具体类型 `E`
    pub fn is<E: DomainEvent>(&self) -> bool {
        self.as_any().is::<E>()
    }
}
