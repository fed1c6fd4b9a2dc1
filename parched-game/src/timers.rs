//! One-shot deferred actions scheduled relative to the emitting tick.
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};

use crate::host::EntityId;

/// Work the thirst behavior postpones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredAction {
    Vomit,
    RemoveStat { category: String, code: String },
    ResetIntoxication,
}

/// Handle returned by [`TimerQueue::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Timer wheel for one simulation side.
///
/// Timers fire once, in due order, at or after their due time. Despawned
/// entities take their pending timers with them.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    due: BTreeMap<(u64, TimerId), (EntityId, DeferredAction)>,
    due_by_id: HashMap<TimerId, u64>,
    by_entity: HashMap<EntityId, SmallVec<[TimerId; 4]>>,
}

impl TimerQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(
        &mut self,
        entity: EntityId,
        now_ms: u64,
        delay_ms: u64,
        action: DeferredAction,
    ) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let due_at = now_ms.saturating_add(delay_ms);
        self.due.insert((due_at, id), (entity, action));
        self.due_by_id.insert(id, due_at);
        self.by_entity.entry(entity).or_default().push(id);
        id
    }

    /// Cancel every pending timer owned by `entity`.
    pub fn cancel_entity(&mut self, entity: EntityId) -> usize {
        let Some(ids) = self.by_entity.remove(&entity) else {
            return 0;
        };
        let mut cancelled = 0;
        for id in ids {
            if let Some(due_at) = self.due_by_id.remove(&id) {
                self.due.remove(&(due_at, id));
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Remove and return every timer due at or before `now_ms`, earliest first.
    pub fn pop_due(&mut self, now_ms: u64) -> Vec<(EntityId, DeferredAction)> {
        let mut fired = Vec::new();
        while let Some(entry) = self.due.first_entry() {
            let (due_at, id) = *entry.key();
            if due_at > now_ms {
                break;
            }
            let (entity, action) = entry.remove();
            self.due_by_id.remove(&id);
            self.forget(entity, id);
            fired.push((entity, action));
        }
        fired
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.due.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }

    #[must_use]
    pub fn pending_for(&self, entity: EntityId) -> usize {
        self.by_entity.get(&entity).map_or(0, SmallVec::len)
    }

    fn forget(&mut self, entity: EntityId, id: TimerId) {
        if let Some(ids) = self.by_entity.get_mut(&entity) {
            ids.retain(|pending| *pending != id);
            if ids.is_empty() {
                self.by_entity.remove(&entity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: EntityId = EntityId(1);
    const B: EntityId = EntityId(2);

    #[test]
    fn fires_once_in_due_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(A, 0, 5000, DeferredAction::ResetIntoxication);
        timers.schedule(B, 0, 2000, DeferredAction::Vomit);
        assert!(timers.pop_due(1999).is_empty());
        assert_eq!(timers.pop_due(2000), vec![(B, DeferredAction::Vomit)]);
        assert!(timers.pop_due(4000).is_empty());
        assert_eq!(
            timers.pop_due(10_000),
            vec![(A, DeferredAction::ResetIntoxication)]
        );
        assert!(timers.is_empty());
        assert!(timers.pop_due(u64::MAX).is_empty());
    }

    #[test]
    fn cancel_entity_drops_only_its_timers() {
        let mut timers = TimerQueue::new();
        timers.schedule(A, 0, 10, DeferredAction::Vomit);
        timers.schedule(A, 0, 20, DeferredAction::ResetIntoxication);
        timers.schedule(B, 0, 30, DeferredAction::Vomit);
        assert_eq!(timers.pending_for(A), 2);
        assert_eq!(timers.cancel_entity(A), 2);
        assert_eq!(timers.cancel_entity(A), 0);
        assert_eq!(timers.pop_due(100), vec![(B, DeferredAction::Vomit)]);
    }

    #[test]
    fn cancelling_after_fire_is_a_no_op() {
        let mut timers = TimerQueue::new();
        timers.schedule(A, 100, 0, DeferredAction::Vomit);
        assert_eq!(timers.pop_due(100).len(), 1);
        assert_eq!(timers.pending_for(A), 0);
        assert_eq!(timers.cancel_entity(A), 0);
        assert!(timers.is_empty());
    }
}
