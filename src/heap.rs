//! Indexed Weighted Priority Queue
//!
//! An array-backed binary min-heap ordered by an integer weight, with a
//! reverse lookup from key to the item's current slot. Every swap updates both
//! the item's stored index and the lookup map, so any item can be re-weighted
//! and re-heapified in O(log n) by key or by index without scanning.
//!
//! ```text
//!   slots: {"b" → 0, "c" → 1, "a" → 2}
//!
//!   items: [ ("b", w=3, i=0) | ("c", w=4, i=1) | ("a", w=5, i=2) ]
//!                 ▲ root: minimum weight
//! ```
//!
//! This is the ordering substrate of [`LfuCache`](crate::LfuCache), where the
//! weight is the access count and the root is the eviction victim.
//!
//! # Performance Characteristics
//!
//! | Operation | Cost |
//! |-----------|------|
//! | `push` / `pop` / `remove` | O(log n) |
//! | `fix` / `update_weight` / `increment` | O(log n) |
//! | `peek` / `get` / `index_of` | O(1) |
//!
//! # Examples
//!
//! ```
//! use localcache::heap::PriorityQueue;
//!
//! let mut queue = PriorityQueue::new();
//! queue.push("aa", "aaa", 2);
//! queue.push("bb", "bbb", 3);
//! queue.push("cc", "ccc", 4);
//!
//! // Raise the weight of "aa" in place, then restore heap order.
//! let index = queue.index_of(&"aa").unwrap();
//! queue.item_mut(index).unwrap().weight = 5;
//! queue.fix(index);
//!
//! let order: Vec<u64> = std::iter::from_fn(|| queue.pop()).map(|i| i.weight).collect();
//! assert_eq!(order, vec![3, 4, 5]);
//! ```

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// One queued item: key, payload, weight and its current heap slot.
#[derive(Clone, PartialEq, Eq)]
pub struct WeightedItem<K, V> {
    key: K,
    /// Payload carried with the key.
    pub value: V,
    /// Ordering weight; smaller weights surface first.
    ///
    /// After mutating it through [`PriorityQueue::item_mut`], call
    /// [`PriorityQueue::fix`] with the item's index.
    pub weight: u64,
    index: usize,
}

impl<K, V> WeightedItem<K, V> {
    /// The item's key.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Current slot in the heap array. Only meaningful while the item is
    /// queued; a popped item keeps the slot it was removed from.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Consumes the item, returning `(key, value, weight)`.
    pub fn into_parts(self) -> (K, V, u64) {
        (self.key, self.value, self.weight)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for WeightedItem<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedItem")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("weight", &self.weight)
            .field("index", &self.index)
            .finish()
    }
}

/// Min-heap by weight with O(log n) update by key identity.
pub struct PriorityQueue<K, V, S = DefaultHashBuilder> {
    items: Vec<WeightedItem<K, V>>,
    slots: HashMap<K, usize, S>,
}

impl<K: Hash + Eq + Clone, V> PriorityQueue<K, V> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty queue with room for `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            slots: HashMap::with_capacity_and_hasher(capacity, DefaultHashBuilder::default()),
        }
    }
}

impl<K: Hash + Eq + Clone, V> Default for PriorityQueue<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher> PriorityQueue<K, V, S> {
    /// Creates an empty queue with a custom hash builder for the key lookup.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            items: Vec::new(),
            slots: HashMap::with_hasher(hash_builder),
        }
    }

    /// Number of queued items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Queues `key` with `value` and `weight`, returning its final slot.
    ///
    /// If `key` is already queued its value and weight are replaced and the
    /// item is re-heapified in place.
    pub fn push(&mut self, key: K, value: V, weight: u64) -> usize {
        if let Some(&index) = self.slots.get(&key) {
            let item = &mut self.items[index];
            item.value = value;
            item.weight = weight;
            return self.fix(index);
        }
        let index = self.items.len();
        self.slots.insert(key.clone(), index);
        self.items.push(WeightedItem {
            key,
            value,
            weight,
            index,
        });
        self.sift_up(index)
    }

    /// Removes and returns the minimum-weight item.
    pub fn pop(&mut self) -> Option<WeightedItem<K, V>> {
        if self.items.is_empty() {
            return None;
        }
        self.remove_at(0)
    }

    /// The minimum-weight item, without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&WeightedItem<K, V>> {
        self.items.first()
    }

    /// Restores heap order after the weight at `index` changed externally.
    ///
    /// Returns the item's new slot; out-of-range indices are ignored and
    /// returned unchanged.
    pub fn fix(&mut self, index: usize) -> usize {
        if index >= self.items.len() {
            return index;
        }
        let moved = self.sift_down(index);
        if moved == index {
            self.sift_up(index)
        } else {
            moved
        }
    }

    /// Current slot of `key`, if queued.
    #[inline]
    pub fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.slots.get(key).copied()
    }

    /// The queued item for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&WeightedItem<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index_of(key).map(|index| &self.items[index])
    }

    /// Mutable access to the item at `index`.
    ///
    /// Changing `weight` breaks heap order until [`fix`](Self::fix) is called
    /// with the same index.
    #[inline]
    pub fn item_mut(&mut self, index: usize) -> Option<&mut WeightedItem<K, V>> {
        self.items.get_mut(index)
    }

    /// Sets the weight of `key` and re-heapifies; returns `false` if absent.
    pub fn update_weight<Q>(&mut self, key: &Q, weight: u64) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.index_of(key) {
            Some(index) => {
                self.items[index].weight = weight;
                self.fix(index);
                true
            }
            None => false,
        }
    }

    /// Adds one to the weight of `key`, returning the new weight.
    pub fn increment<Q>(&mut self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.index_of(key)?;
        let weight = self.items[index].weight.saturating_add(1);
        self.items[index].weight = weight;
        self.fix(index);
        Some(weight)
    }

    /// Removes `key` from the queue.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<WeightedItem<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.index_of(key)?;
        self.remove_at(index)
    }

    /// Drops every item.
    pub fn clear(&mut self) {
        self.items.clear();
        self.slots.clear();
    }

    /// Iterates over queued items in heap-array order (not sorted).
    pub fn iter(&self) -> impl Iterator<Item = &WeightedItem<K, V>> {
        self.items.iter()
    }

    fn remove_at(&mut self, index: usize) -> Option<WeightedItem<K, V>> {
        let last = self.items.len().checked_sub(1)?;
        if index > last {
            return None;
        }
        if index != last {
            self.swap(index, last);
        }
        let item = self.items.pop()?;
        self.slots.remove(&item.key);
        if index < self.items.len() {
            self.fix(index);
        }
        Some(item)
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.items.swap(i, j);
        self.items[i].index = i;
        self.items[j].index = j;
        if let Some(slot) = self.slots.get_mut(&self.items[i].key) {
            *slot = i;
        }
        if let Some(slot) = self.slots.get_mut(&self.items[j].key) {
            *slot = j;
        }
    }

    fn sift_up(&mut self, mut child: usize) -> usize {
        while child > 0 {
            let parent = (child - 1) / 2;
            if self.items[child].weight >= self.items[parent].weight {
                break;
            }
            self.swap(parent, child);
            child = parent;
        }
        child
    }

    fn sift_down(&mut self, mut parent: usize) -> usize {
        let len = self.items.len();
        loop {
            let left = 2 * parent + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let smallest = if right < len && self.items[right].weight < self.items[left].weight {
                right
            } else {
                left
            };
            if self.items[smallest].weight >= self.items[parent].weight {
                break;
            }
            self.swap(parent, smallest);
            parent = smallest;
        }
        parent
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for PriorityQueue<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("len", &self.items.len())
            .field("items", &self.items)
            .finish()
    }
}
