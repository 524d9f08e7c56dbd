//! DDD 领域层基础库（ddd-domain）
//!
//! 提供以 DDD 为中心的通用抽象与构件：
//! - 实体（`entity`）与跨别名共享的实体句柄 `EntityRef`
//! - 聚合（`aggregate`）与待派发的领域事件（`domain_event`）
//! - 值对象（`value_object`），包括实体标识 `EntityIdentity`
//! - 领域层统一错误类型（`error`）
//!
//! 本 crate 不关心存储与事件处理器的具体实现，仓储与工作单元位于 `ddd-repository`。
//!
//! 典型用法：
//! 1. 使用 `#[aggregate]` 定义聚合并实现 `Aggregate::assert_valid`；
//! 2. 使用 `#[domain_event]` 定义事件，在业务方法中 `record_event`；
//! 3. 通过仓储添加/加载聚合，提交时事件被派发、不变量被校验后再持久化。
//!
pub mod aggregate;
pub mod domain_event;
pub mod entity;
pub mod error;
pub mod value_object;

// 允许在本 crate 内部通过 ::ddd_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::ddd_domain 路径。
extern crate self as ddd_domain;
