//! Recency List Module
//!
//! Intrusive doubly-linked list of entries ordered from most- to
//! least-recently used, stored in an arena.
//!
//! Slots live in a `Vec` and link to each other by index. Slot 0 is the head
//! sentinel and slot 1 the tail sentinel; neither ever holds an entry. The
//! live sequence is everything strictly between them:
//!
//! ```text
//!   head <-> [MRU] <-> ... <-> [LRU] <-> tail
//!    ^                                    |
//!    +------------------------------------+   (tail.next = head)
//! ```
//!
//! Freed slots are recycled through a free list, so a stable [`EntryId`] is
//! only meaningful while its entry is live.
//!
//! Every mutating operation assumes the caller holds exclusive access.

use crate::cache::CacheEntry;

const HEAD: usize = 0;
const TAIL: usize = 1;

// == Entry Id ==
/// Position of an entry in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

#[derive(Debug)]
struct Slot<K, V> {
    entry: Option<CacheEntry<K, V>>,
    prev: usize,
    next: usize,
}

// == Recency List ==
/// Arena-backed recency list bounded by two sentinels.
#[derive(Debug)]
pub struct RecencyList<K, V> {
    slots: Vec<Slot<K, V>>,
    free: Vec<usize>,
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    // == Constructor ==
    /// Creates an empty list with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.saturating_add(2));
        slots.push(Slot {
            entry: None,
            prev: TAIL,
            next: TAIL,
        });
        slots.push(Slot {
            entry: None,
            prev: HEAD,
            next: HEAD,
        });
        Self {
            slots,
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Lookup ==
    /// Returns the entry at `id`, or None for sentinels and freed slots.
    pub fn get(&self, id: EntryId) -> Option<&CacheEntry<K, V>> {
        self.slots.get(id.0).and_then(|slot| slot.entry.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: EntryId) -> Option<&mut CacheEntry<K, V>> {
        self.slots.get_mut(id.0).and_then(|slot| slot.entry.as_mut())
    }

    /// True if `id` currently names a live entry.
    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    // == Victim Candidate ==
    /// Least recently used entry: the one just before the tail sentinel.
    pub fn victim_candidate(&self) -> Option<EntryId> {
        let last = self.slots[TAIL].prev;
        (last != HEAD).then_some(EntryId(last))
    }

    // == Push Front ==
    /// Stores `entry` in a free slot and links it right after the head.
    pub(crate) fn push_front(&mut self, entry: CacheEntry<K, V>) -> EntryId {
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx].entry = Some(entry);
                idx
            }
            None => {
                self.slots.push(Slot {
                    entry: Some(entry),
                    prev: HEAD,
                    next: HEAD,
                });
                self.slots.len() - 1
            }
        };
        let id = EntryId(idx);
        self.insert_front(id);
        self.len += 1;
        id
    }

    // == Remove ==
    /// Unlinks the entry at `id`, frees its slot and returns the entry.
    pub(crate) fn remove(&mut self, id: EntryId) -> Option<CacheEntry<K, V>> {
        if !self.contains(id) {
            return None;
        }
        self.unlink(id);
        self.free.push(id.0);
        self.len -= 1;
        self.slots[id.0].entry.take()
    }

    // == Promote ==
    /// Moves a live entry to the most-recently-used position.
    pub(crate) fn promote(&mut self, id: EntryId) {
        debug_assert!(self.contains(id), "promoting a dead slot");
        if self.slots[HEAD].next == id.0 {
            return;
        }
        self.unlink(id);
        self.insert_front(id);
    }

    // == Unlink ==
    /// Detaches `id` by relinking its neighbours. The slot's own links are
    /// stale until it is reinserted.
    fn unlink(&mut self, id: EntryId) {
        debug_assert!(id.0 != HEAD && id.0 != TAIL, "unlinking a sentinel");
        let Slot { prev, next, .. } = self.slots[id.0];
        self.slots[prev].next = next;
        self.slots[next].prev = prev;
    }

    // == Insert Front ==
    fn insert_front(&mut self, id: EntryId) {
        let first = self.slots[HEAD].next;
        self.slots[id.0].prev = HEAD;
        self.slots[id.0].next = first;
        self.slots[first].prev = id.0;
        self.slots[HEAD].next = id.0;
    }

    // == Iteration ==
    /// Live entries from most to least recently used. Reversible.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            front: self.slots[HEAD].next,
            back: self.slots[TAIL].prev,
            remaining: self.len,
        }
    }

    // == Consistency Check ==
    /// Walks the list in both directions and checks that each walk visits
    /// exactly `len` live slots with symmetric links.
    pub fn is_consistent(&self) -> bool {
        let forward = self.walk(HEAD, |slot| slot.next, TAIL);
        let backward = self.walk(TAIL, |slot| slot.prev, HEAD);
        let live = self.slots.iter().filter(|slot| slot.entry.is_some()).count();
        forward == Some(self.len) && backward == Some(self.len) && live == self.len
    }

    fn walk(&self, from: usize, step: impl Fn(&Slot<K, V>) -> usize, to: usize) -> Option<usize> {
        let mut count = 0;
        let mut current = from;
        loop {
            let next = step(&self.slots[current]);
            let back = if from == HEAD {
                self.slots[next].prev
            } else {
                self.slots[next].next
            };
            if back != current {
                return None;
            }
            if next == to {
                return Some(count);
            }
            if self.slots[next].entry.is_none() || count > self.len {
                return None;
            }
            count += 1;
            current = next;
        }
    }
}

// == Iterator ==
/// Iterator over live entries in recency order.
pub struct Iter<'a, K, V> {
    list: &'a RecencyList<K, V>,
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (EntryId, &'a CacheEntry<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.front;
        let slot = &self.list.slots[idx];
        self.front = slot.next;
        self.remaining -= 1;
        slot.entry.as_ref().map(|entry| (EntryId(idx), entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.back;
        let slot = &self.list.slots[idx];
        self.back = slot.prev;
        self.remaining -= 1;
        slot.entry.as_ref().map(|entry| (EntryId(idx), entry))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
