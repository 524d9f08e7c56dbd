//! 内存版存储适配器（InMemoryStorage）
//!
//! 一个最小的变更跟踪器 + 存储：
//! - `add` 将新实体跟踪为 Added；`find` 优先返回已跟踪实体，否则从已持久化数据中加载并跟踪；
//! - `remove` 将已持久化实体标记为 Deleted（未持久化的 Added 实体直接丢弃）；
//! - `save_changes` 在一次加锁内应用全部变更。
//!
//! 典型用途：测试环境、示例与本地开发。
use crate::storage::{StorageAdapter, TrackedEntity};
use async_trait::async_trait;
use ddd_domain::entity::EntityRef;
use ddd_domain::error::{DomainError, DomainResult};
use ddd_domain::value_object::EntityIdentity;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// 被跟踪实体的状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryState {
    Added,
    Unchanged,
    Deleted,
}

struct Entry {
    id: EntityIdentity,
    state: EntryState,
    tracked: TrackedEntity,
}

#[derive(Default)]
struct State {
    entries: Vec<Entry>,
    stored: HashMap<EntityIdentity, TrackedEntity>,
}

/// 简单的内存存储实现
#[derive(Default)]
pub struct InMemoryStorage {
    state: Mutex<State>,
    saves: AtomicUsize,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入已持久化数据（不经过跟踪器）
    pub async fn seed(&self, id: EntityIdentity, tracked: TrackedEntity) {
        self.state.lock().await.stored.insert(id, tracked);
    }

    /// 跟踪一个新实体；同一标识已被跟踪或已持久化时报错
    pub async fn add(&self, id: EntityIdentity, tracked: TrackedEntity) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        if state.stored.contains_key(&id) || state.entries.iter().any(|e| e.id == id) {
            return Err(DomainError::Repository {
                reason: format!("entity {id} is already tracked"),
            });
        }

        state.entries.push(Entry {
            id,
            state: EntryState::Added,
            tracked,
        });
        Ok(())
    }

    /// 按标识查找实体，已持久化但未跟踪的实体会被跟踪为 Unchanged
    ///
    /// 已标记删除或类型不符时返回 `None`。
    pub async fn find<E>(&self, id: EntityIdentity) -> Option<EntityRef<E>>
    where
        E: Send + Sync + 'static,
    {
        let mut state = self.state.lock().await;

        if let Some(entry) = state.entries.iter().find(|e| e.id == id) {
            if entry.state == EntryState::Deleted {
                return None;
            }
            return entry.tracked.erased().downcast::<E>();
        }

        let tracked = state.stored.get(&id)?.clone();
        let entity = tracked.erased().downcast::<E>()?;
        state.entries.push(Entry {
            id,
            state: EntryState::Unchanged,
            tracked,
        });
        Some(entity)
    }

    /// 移除实体，返回是否找到
    pub async fn remove(&self, id: EntityIdentity) -> bool {
        let mut state = self.state.lock().await;
        let Some(index) = state.entries.iter().position(|e| e.id == id) else {
            return false;
        };

        match state.entries[index].state {
            EntryState::Added => {
                state.entries.remove(index);
                true
            }
            EntryState::Unchanged => {
                state.entries[index].state = EntryState::Deleted;
                true
            }
            EntryState::Deleted => false,
        }
    }

    /// 实体当前的跟踪状态
    pub async fn entry_state(&self, id: EntityIdentity) -> Option<EntryState> {
        let state = self.state.lock().await;
        state.entries.iter().find(|e| e.id == id).map(|e| e.state)
    }

    /// 是否已持久化
    pub async fn is_stored(&self, id: EntityIdentity) -> bool {
        self.state.lock().await.stored.contains_key(&id)
    }

    pub async fn stored_len(&self) -> usize {
        self.state.lock().await.stored.len()
    }

    /// `save_changes` 成功执行的次数
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageAdapter for InMemoryStorage {
    async fn tracked_entities(&self) -> Vec<TrackedEntity> {
        let state = self.state.lock().await;
        state.entries.iter().map(|e| e.tracked.clone()).collect()
    }

    async fn save_changes(&self) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let State { entries, stored } = &mut *state;

        let (mut added, mut deleted) = (0usize, 0usize);
        entries.retain_mut(|entry| match entry.state {
            EntryState::Added => {
                stored.insert(entry.id, entry.tracked.clone());
                entry.state = EntryState::Unchanged;
                added += 1;
                true
            }
            EntryState::Deleted => {
                stored.remove(&entry.id);
                deleted += 1;
                false
            }
            EntryState::Unchanged => true,
        });

        self.saves.fetch_add(1, Ordering::SeqCst);
        debug!(added, deleted, stored = stored.len(), "in-memory changes saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note {
        text: String,
    }

    fn note(text: &str) -> (EntityIdentity, EntityRef<Note>) {
        (
            EntityIdentity::random(),
            EntityRef::new(Note {
                text: text.to_string(),
            }),
        )
    }

    #[tokio::test]
    async fn add_then_save_persists() {
        let storage = InMemoryStorage::new();
        let (id, n) = note("a");
        storage.add(id, TrackedEntity::entity(&n)).await.unwrap();
        assert_eq!(storage.entry_state(id).await, Some(EntryState::Added));
        assert!(!storage.is_stored(id).await);

        storage.save_changes().await.unwrap();
        assert!(storage.is_stored(id).await);
        assert_eq!(storage.entry_state(id).await, Some(EntryState::Unchanged));
        assert_eq!(storage.save_count(), 1);

        // 重复添加同一标识
        assert!(matches!(
            storage.add(id, TrackedEntity::entity(&n)).await,
            Err(DomainError::Repository { .. })
        ));
    }

    #[tokio::test]
    async fn find_tracks_seeded_entities() {
        let storage = InMemoryStorage::new();
        let (id, n) = note("seeded");
        storage.seed(id, TrackedEntity::entity(&n)).await;
        assert!(storage.tracked_entities().await.is_empty());

        let found = storage.find::<Note>(id).await.unwrap();
        assert_eq!(found.read().await.text, "seeded");
        assert!(found.ptr_eq(&n));
        assert_eq!(storage.tracked_entities().await.len(), 1);

        // 再次查找返回同一跟踪实体，不重复跟踪
        storage.find::<Note>(id).await.unwrap();
        assert_eq!(storage.tracked_entities().await.len(), 1);

        assert!(storage.find::<String>(id).await.is_none());
        assert!(storage.find::<Note>(EntityIdentity::random()).await.is_none());
    }

    #[tokio::test]
    async fn remove_marks_deleted_until_saved() {
        let storage = InMemoryStorage::new();
        let (id, n) = note("x");
        storage.seed(id, TrackedEntity::entity(&n)).await;
        storage.find::<Note>(id).await.unwrap();

        assert!(storage.remove(id).await);
        assert_eq!(storage.entry_state(id).await, Some(EntryState::Deleted));
        assert!(storage.find::<Note>(id).await.is_none());
        assert!(!storage.remove(id).await);

        storage.save_changes().await.unwrap();
        assert!(!storage.is_stored(id).await);
        assert_eq!(storage.entry_state(id).await, None);
        assert_eq!(storage.stored_len().await, 0);
    }

    #[tokio::test]
    async fn removing_an_unsaved_entity_discards_it() {
        let storage = InMemoryStorage::new();
        let (id, n) = note("draft");
        storage.add(id, TrackedEntity::entity(&n)).await.unwrap();

        assert!(storage.remove(id).await);
        assert_eq!(storage.entry_state(id).await, None);
        assert!(!storage.remove(EntityIdentity::random()).await);

        storage.save_changes().await.unwrap();
        assert_eq!(storage.stored_len().await, 0);
    }
}
