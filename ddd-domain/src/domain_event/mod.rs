//! 领域事件（Domain Event）与待派发事件集合
//!
//! 事件以其具体运行时类型（`TypeId`）标识，用于在处理器注册表中做精确匹配；
//! `event_type()` 提供稳定的可读名称，主要用于日志。聚合通过 `DomainEvents`
//! 按记录顺序保存尚未派发的事件，由工作单元在提交时逐个取出并派发。

mod domain_event_trait;
mod domain_events;

pub use domain_event_trait::DomainEvent;
pub use domain_events::DomainEvents;
