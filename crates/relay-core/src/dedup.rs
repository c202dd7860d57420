//! Seen-item bookkeeping.
//!
//! The remote API has no "since" filter, so every poll re-fetches everything.
//! The store remembers which tasks and comments have already been announced
//! so each produces at most one notification per process lifetime. Sets are
//! append-only.
//!
//! Items with several recipients are marked seen only once all of them were
//! notified. Until then the recipients already reached are kept as partial
//! deliveries so a retry skips them. A partial entry is dropped only when
//! its item is marked seen; an item deleted upstream after a partial
//! delivery keeps its entry for the rest of the process. Like the seen sets,
//! growth is bounded by the number of items ever polled.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use relay_models::{Mention, TaskKey};

/// Dedup identity of a notifiable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Task(TaskKey),
    Comment(u64),
}

#[derive(Debug, Default)]
struct SeenSets {
    tasks: HashSet<TaskKey>,
    comments: HashSet<u64>,
    /// Recipients reached for items not yet seen; cleared on mark.
    partial: HashMap<ItemKey, HashSet<Mention>>,
}

/// In-memory seen sets, safe to share between tasks.
#[derive(Debug, Default)]
pub struct DedupStore {
    inner: Mutex<SeenSets>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sets(&self) -> MutexGuard<'_, SeenSets> {
        // Every mutation is a single insert/remove, so a poisoned guard still holds consistent data.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn has_seen_task(&self, key: &TaskKey) -> bool {
        self.sets().tasks.contains(key)
    }

    pub fn mark_task_seen(&self, key: TaskKey) {
        let mut sets = self.sets();
        sets.tasks.insert(key);
        sets.partial.remove(&ItemKey::Task(key));
    }

    pub fn has_seen_comment(&self, id: u64) -> bool {
        self.sets().comments.contains(&id)
    }

    pub fn mark_comment_seen(&self, id: u64) {
        let mut sets = self.sets();
        sets.comments.insert(id);
        sets.partial.remove(&ItemKey::Comment(id));
    }

    /// Recipients already notified about an item that is not yet seen.
    pub fn delivered_to(&self, item: &ItemKey) -> HashSet<Mention> {
        self.sets().partial.get(item).cloned().unwrap_or_default()
    }

    /// Records a successful send for an item that still has pending recipients.
    pub fn record_delivery(&self, item: ItemKey, mention: Mention) {
        self.sets().partial.entry(item).or_default().insert(mention);
    }

    /// (seen tasks, seen comments)
    pub fn counts(&self) -> (usize, usize) {
        let sets = self.sets();
        (sets.tasks.len(), sets.comments.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_keys_are_per_project() {
        let store = DedupStore::new();
        store.mark_task_seen(TaskKey::new(1, 42));

        assert!(store.has_seen_task(&TaskKey::new(1, 42)));
        assert!(!store.has_seen_task(&TaskKey::new(2, 42)));
        assert_eq!(store.counts(), (1, 0));
    }

    #[test]
    fn test_comments() {
        let store = DedupStore::new();
        assert!(!store.has_seen_comment(7));
        store.mark_comment_seen(7);
        store.mark_comment_seen(7);
        assert!(store.has_seen_comment(7));
        assert_eq!(store.counts(), (0, 1));
    }

    #[test]
    fn test_partial_deliveries_cleared_when_seen() {
        let store = DedupStore::new();
        let item = ItemKey::Comment(5);
        let alice = Mention::parse("@alice").unwrap();

        store.record_delivery(item, alice.clone());
        assert!(store.delivered_to(&item).contains(&alice));
        assert!(!store.has_seen_comment(5));

        store.mark_comment_seen(5);
        assert!(store.delivered_to(&item).is_empty());
    }
}
