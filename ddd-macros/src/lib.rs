//! 领域对象的属性宏
//!
//! - `#[entity]`：补齐 `id` 字段并实现 `Entity`
//! - `#[aggregate]`：在 `#[entity]` 基础上补齐 `domain_events` 字段并实现 `HasDomainEvents`，
//!   不变量校验（`Aggregate::assert_valid`）仍需手写
//! - `#[domain_event]`：派生常用 trait 并实现 `DomainEvent`
//!
mod domain_event;
mod entity;
mod utils;

use entity::EntityKind;
use proc_macro::TokenStream;

/// 实体宏
/// - 确保字段 `id: EntityIdentity` 位于最前
/// - 自动实现 `::ddd_domain::entity::Entity`
/// - 支持参数：`#[entity(debug = false)]` 关闭 Debug 派生
#[proc_macro_attribute]
pub fn entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item, EntityKind::Entity)
}

/// 聚合宏
/// - 同 `#[entity]`，并在末尾补齐字段 `domain_events: DomainEvents`
/// - 自动实现 `::ddd_domain::aggregate::HasDomainEvents`
#[proc_macro_attribute]
pub fn aggregate(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item, EntityKind::Aggregate)
}

/// 领域事件宏
/// - 结构体事件类型名默认为类型名，枚举为 `Enum.Variant`
/// - 支持参数：`#[domain_event(event_type = "...")]`，枚举变体支持 `#[event(event_type = "...")]`
#[proc_macro_attribute]
pub fn domain_event(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_event::expand(attr, item)
}
