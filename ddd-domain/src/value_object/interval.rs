use super::ValueObject;
use crate::error::{DomainError, DomainResult};

/// 闭区间 `[start, end]`，保证 `end >= start`
///
/// # 示例
///
/// ```
/// use ddd_domain::value_object::Interval;
///
/// let a = Interval::new(1, 5).unwrap();
/// let b = Interval::new(5, 9).unwrap();
/// assert!(a.overlaps_inclusive_with(&b));
/// assert!(!a.overlaps_exclusive_with(&b));
///
/// assert!(Interval::new(3, 2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval<T> {
    start: T,
    end: T,
}

impl<T: Ord> Interval<T> {
    pub fn new(start: T, end: T) -> DomainResult<Self> {
        if end < start {
            return Err(DomainError::invalid_state(
                "end must be greater than or equal to start",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> &T {
        &self.start
    }

    pub fn end(&self) -> &T {
        &self.end
    }

    /// 是否包含给定值（含端点）
    pub fn contains(&self, value: &T) -> bool {
        &self.start <= value && value <= &self.end
    }

    /// 含端点的重叠：两区间至少共享一个值（包括端点）
    pub fn overlaps_inclusive_with(&self, other: &Self) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    /// 不含端点的重叠：两区间共享端点以外的值
    pub fn overlaps_exclusive_with(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// 映射端点到新类型，映射结果仍需满足 `end >= start`
    pub fn map<U: Ord>(self, mut f: impl FnMut(T) -> U) -> DomainResult<Interval<U>> {
        let start = f(self.start);
        let end = f(self.end);
        Interval::new(start, end)
    }
}

impl<T: Ord> ValueObject for Interval<T> {
    type Error = DomainError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.end < self.start {
            return Err(DomainError::invalid_state(
                "end must be greater than or equal to start",
            ));
        }
        Ok(())
    }
}
