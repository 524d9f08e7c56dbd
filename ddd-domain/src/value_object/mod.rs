//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的对象，用于封装不可变的概念性值与校验逻辑。
//! 所有值对象均通过校验构造（`new`）创建，非法值以 `DomainError::InvalidState` 拒绝，
//! 反序列化同样经过相同的校验。
//!
mod entity_identity;
mod integer;
mod interval;
mod non_empty_string;

pub use entity_identity::EntityIdentity;
pub use integer::{NonNegativeInteger, PositiveInteger};
pub use interval::Interval;
pub use non_empty_string::NonEmptyString;

/// 值对象抽象
pub trait ValueObject {
    /// 业务校验失败时的错误类型
    type Error;

    /// 校验当前值是否满足约束
    fn validate(&self) -> Result<(), Self::Error>;
}
