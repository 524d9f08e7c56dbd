//! 聚合（Aggregate）抽象
//!
//! 聚合是拥有待派发领域事件列表的实体：
//! - 业务操作通过 `record_event` 追加事件；
//! - 工作单元在提交时逐个取出事件并派发，派发全部完成后调用 `assert_valid` 校验不变量；
//! - 校验失败时，本次提交不会持久化。
//!
use crate::domain_event::{DomainEvent, DomainEvents};
use crate::entity::Entity;
use crate::error::DomainResult;
use std::any::type_name;

/// 持有待派发事件的能力，通常由 `#[aggregate]` 宏实现
pub trait HasDomainEvents {
    fn domain_events(&self) -> &DomainEvents;

    fn domain_events_mut(&mut self) -> &mut DomainEvents;

    /// 记录一个领域事件，提交时派发
    fn record_event<E: DomainEvent>(&mut self, event: E)
    where
        Self: Sized,
    {
        self.domain_events_mut().record(event);
    }

    /// 移除第一个满足条件的待派发事件
    fn remove_event(
        &mut self,
        predicate: impl Fn(&dyn DomainEvent) -> bool,
    ) -> Option<Box<dyn DomainEvent>>
    where
        Self: Sized,
    {
        self.domain_events_mut().remove(predicate)
    }

    /// 清空待派发事件（常用于测试隔离副作用）
    fn clear_events(&mut self) {
        self.domain_events_mut().clear();
    }
}

/// 聚合根接口
pub trait Aggregate: Entity + HasDomainEvents + Send + Sync + 'static {
    /// 校验结构性不变量；返回错误时提交中止且不会持久化
    fn assert_valid(&self) -> DomainResult<()>;

    /// 聚合类型名（日志与错误信息使用）
    fn aggregate_type(&self) -> &'static str {
        type_name::<Self>()
    }
}
