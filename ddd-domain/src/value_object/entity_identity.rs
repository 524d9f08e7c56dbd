use super::ValueObject;
use crate::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// 实体标识（非空 UUID）
///
/// 128 位值语义标识，永远不会是 nil UUID。
///
/// # 示例
///
/// ```
/// use ddd_domain::value_object::EntityIdentity;
/// use uuid::Uuid;
///
/// let id = EntityIdentity::random();
/// let parsed: EntityIdentity = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
///
/// assert!(EntityIdentity::new(Uuid::nil()).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Uuid", into = "Uuid")]
pub struct EntityIdentity(Uuid);

impl EntityIdentity {
    /// 从 UUID 创建标识，nil UUID 会被拒绝
    pub fn new(value: Uuid) -> DomainResult<Self> {
        if value.is_nil() {
            return Err(DomainError::invalid_state("entity identity cannot be empty"));
        }

        Ok(Self(value))
    }

    /// 生成随机标识（UUID v4）
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// 解析字符串形式的标识
    pub fn parse(value: &str) -> DomainResult<Self> {
        let uuid = Uuid::parse_str(value).map_err(|e| DomainError::Parse {
            reason: format!("value `{value}` cannot be parsed into an entity identity: {e}"),
        })?;

        Self::new(uuid)
    }

    /// 获取内部 UUID
    pub const fn value(&self) -> Uuid {
        self.0
    }
}

impl ValueObject for EntityIdentity {
    type Error = DomainError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.0.is_nil() {
            return Err(DomainError::invalid_state("entity identity cannot be empty"));
        }
        Ok(())
    }
}

impl FromStr for EntityIdentity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Uuid> for EntityIdentity {
    type Error = DomainError;

    fn try_from(value: Uuid) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityIdentity> for Uuid {
    fn from(id: EntityIdentity) -> Self {
        id.0
    }
}

impl fmt::Display for EntityIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
