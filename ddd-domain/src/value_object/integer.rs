use super::ValueObject;
use crate::error::{DomainError, DomainResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// 正整数（> 0）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PositiveInteger(i64);

impl PositiveInteger {
    pub fn new(value: i64) -> DomainResult<Self> {
        if value < 1 {
            return Err(DomainError::invalid_state("value must be greater than zero"));
        }
        Ok(Self(value))
    }

    /// 在闭区间 `[min, max]` 内随机取值，常用于测试数据
    ///
    /// 要求 `1 <= min <= max`。
    pub fn random(min: i64, max: i64) -> DomainResult<Self> {
        if min < 1 || max < min {
            return Err(DomainError::invalid_value(format!(
                "invalid range [{min}, {max}]: min must be at least 1 and max must not be less than min"
            )));
        }
        Ok(Self(rand::thread_rng().gen_range(min..=max)))
    }

    pub const fn value(&self) -> i64 {
        self.0
    }
}

/// 非负整数（>= 0）
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct NonNegativeInteger(i64);

impl NonNegativeInteger {
    pub fn new(value: i64) -> DomainResult<Self> {
        if value < 0 {
            return Err(DomainError::invalid_state(
                "value must be greater than or equal to zero",
            ));
        }
        Ok(Self(value))
    }

    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl ValueObject for PositiveInteger {
    type Error = DomainError;

    fn validate(&self) -> Result<(), Self::Error> {
        Self::new(self.0).map(|_| ())
    }
}

impl ValueObject for NonNegativeInteger {
    type Error = DomainError;

    fn validate(&self) -> Result<(), Self::Error> {
        Self::new(self.0).map(|_| ())
    }
}

impl TryFrom<i64> for PositiveInteger {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for NonNegativeInteger {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PositiveInteger> for i64 {
    fn from(value: PositiveInteger) -> Self {
        value.0
    }
}

impl From<NonNegativeInteger> for i64 {
    fn from(value: NonNegativeInteger) -> Self {
        value.0
    }
}

impl From<PositiveInteger> for NonNegativeInteger {
    fn from(value: PositiveInteger) -> Self {
        Self(value.0)
    }
}

impl FromStr for PositiveInteger {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim().parse::<i64>()?)
    }
}

impl FromStr for NonNegativeInteger {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim().parse::<i64>()?)
    }
}

impl fmt::Display for PositiveInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for NonNegativeInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
