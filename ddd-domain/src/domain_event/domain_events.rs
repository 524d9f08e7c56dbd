use super::DomainEvent;
use std::collections::VecDeque;
use std::fmt;

/// 聚合上尚未派发的领域事件，按记录顺序排列
///
/// 事件只会被追加或取出；一旦通过 `take_next` 取出即不再属于该集合。
#[derive(Default)]
pub struct DomainEvents {
    pending: VecDeque<Box<dyn DomainEvent>>,
}

impl DomainEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个事件
    pub fn record<E: DomainEvent>(&mut self, event: E) {
        self.pending.push_back(Box::new(event));
    }

    /// 取出最早记录的事件
    pub fn take_next(&mut self) -> Option<Box<dyn DomainEvent>> {
        self.pending.pop_front()
    }

    /// 移除第一个满足条件的事件并返回
    pub fn remove(
        &mut self,
        predicate: impl Fn(&dyn DomainEvent) -> bool,
    ) -> Option<Box<dyn DomainEvent>> {
        let index = self.pending.iter().position(|e| predicate(e.as_ref()))?;
        self.pending.remove(index)
    }

    /// 清空全部待派发事件
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn DomainEvent> {
        self.pending.iter().map(|e| e.as_ref())
    }
}

impl fmt::Debug for DomainEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.pending.iter().map(|e| e.event_type()))
            .finish()
    }
}
