//! Ordered map on a treap.
//!
//! Every entry gets a random priority when it is created, and the tree is
//! kept in heap order on those priorities, so its height is logarithmic in
//! expectation whatever the insertion order.
//!
//! Entries are addressed by [`Handle`]s, which play the part of
//! iterators: [`TreapMap::begin`], [`TreapMap::next`] and
//! [`TreapMap::prev`] walk them in key order, and [`TreapMap::end`] is the
//! position one past the last entry. A handle stays valid until its own
//! entry is erased, even while other entries come and go. [`TreapMap::clear`]
//! and [`Clone::clone_from`] invalidate every handle into the map. Using a
//! handle whose entry is gone, or one taken from another map, panics.
//!
//! ```
//! use treap_map::TreapMap;
//!
//! let mut map = TreapMap::new();
//! for ch in ('a'..='z').step_by(2) {
//!     map.insert(ch, ch as u32);
//! }
//! assert_eq!(map.key(map.lower_bound(&'a')), &'a');
//! assert_eq!(map.key(map.upper_bound(&'a')), &'c');
//! assert!(map.upper_bound(&'y').is_end());
//!
//! let it = map.find(&'k');
//! assert_eq!(map.key(map.next(it)), &'m');
//! map.erase(it);
//! assert_eq!(map.len(), 12);
//! ```

use std::{
    fmt, mem,
    sync::atomic::{self, AtomicU64},
};

use log::trace;
use map_policy::{MapPolicy, Natural};
use priority_gen::PriorityGen;
use rand::RngCore;

use crate::node::{Arena, Edge};

mod clone;
mod debug;
mod iter;
mod node;
#[cfg(test)]
mod tests;

pub use debug::Violation;
pub use iter::{Iter, Keys, Values};

pub struct TreapMap<K, V, P: MapPolicy<K, V> = Natural, R = PriorityGen> {
    owner: u64,
    arena: Arena<K, V>,
    len: usize,
    policy: P,
    rng: R,
}

/// Position of an entry, or the end position.
///
/// Two handles taken from the same map are equal iff they denote the same
/// entry, or are both the end.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Handle {
    node: Option<NodeId>,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
struct NodeId {
    owner: u64,
    index: usize,
    generation: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InsertResult {
    pub handle: Handle,
    pub inserted: bool,
}

/// A fresh tag for the handles of one map.
fn next_owner() -> u64 {
    static OWNER: AtomicU64 = AtomicU64::new(0);
    OWNER.fetch_add(1, atomic::Ordering::Relaxed)
}

impl Handle {
    pub const END: Self = Self { node: None };
    pub fn is_end(self) -> bool { self.node.is_none() }
}

impl<K: Ord, V> TreapMap<K, V> {
    pub fn new() -> Self { Self::with_policy(Natural) }
    pub fn with_seed(seed: u64) -> Self {
        Self::with_policy_and_rng(Natural, PriorityGen::new(seed))
    }
}

impl<K: Ord, V> Default for TreapMap<K, V> {
    fn default() -> Self { Self::new() }
}

impl<K, V, P: MapPolicy<K, V>> TreapMap<K, V, P> {
    pub fn with_policy(policy: P) -> Self {
        Self::with_policy_and_rng(policy, PriorityGen::default())
    }
}

impl<K, V, P: MapPolicy<K, V>, R> TreapMap<K, V, P, R> {
    pub fn with_policy_and_rng(policy: P, rng: R) -> Self {
        Self { owner: next_owner(), arena: Arena::new(), len: 0, policy, rng }
    }

    pub fn len(&self) -> usize { self.len }
    pub fn is_empty(&self) -> bool { self.len == 0 }
    pub fn policy(&self) -> &P { &self.policy }

    pub fn clear(&mut self) {
        if let Some(root) = self.arena.root.take() {
            let policy = &self.policy;
            let released = self.arena.release_subtree(root, |node| {
                policy.drop_key(node.key);
                policy.drop_value(node.value);
            });
            trace!("cleared {released} entries");
        }
        self.len = 0;
    }

    pub fn swap(&mut self, other: &mut Self) { mem::swap(self, other) }

    fn handle(&self, i: Option<usize>) -> Handle {
        let node = i.map(|index| NodeId {
            owner: self.owner,
            index,
            generation: self.arena.generation(index),
        });
        Handle { node }
    }

    fn resolve(&self, handle: Handle) -> Option<usize> {
        let id = handle.node?;
        assert_eq!(
            id.owner, self.owner,
            "stale handle: it was taken from another map"
        );
        assert!(
            self.arena.is_live(id.index, id.generation),
            "stale handle: its entry is no longer in this map"
        );
        Some(id.index)
    }

    fn resolve_entry(&self, handle: Handle) -> usize {
        match self.resolve(handle) {
            Some(i) => i,
            None => panic!("dereferenced the end handle"),
        }
    }

    pub fn find(&self, key: &K) -> Handle {
        self.handle(self.arena.find(key, &self.policy))
    }

    /// Same as [`find`](Self::find), consuming the probe key.
    pub fn find_owned(&self, key: K) -> Handle {
        let res = self.find(&key);
        self.policy.drop_key(key);
        res
    }

    /// The first entry whose key is not less than `key`.
    pub fn lower_bound(&self, key: &K) -> Handle {
        self.handle(self.arena.bound(key, false, &self.policy))
    }

    /// The first entry whose key is greater than `key`.
    pub fn upper_bound(&self, key: &K) -> Handle {
        self.handle(self.arena.bound(key, true, &self.policy))
    }

    pub fn contains_key(&self, key: &K) -> bool { !self.find(key).is_end() }

    pub fn get_value(&self, key: &K) -> Option<&V> {
        let i = self.arena.find(key, &self.policy)?;
        Some(&self.arena.node(i).value)
    }

    pub fn begin(&self) -> Handle { self.handle(self.arena.leftmost()) }
    pub fn end(&self) -> Handle { Handle::END }

    /// # Panics
    /// Panics if `handle` is the end.
    pub fn next(&self, handle: Handle) -> Handle {
        let Some(i) = self.resolve(handle) else {
            panic!("`next` of the end handle");
        };
        self.handle(self.arena.successor(i))
    }

    /// `prev(end)` is the last entry.
    ///
    /// # Panics
    /// Panics if `handle` is the first entry, or is the end of an empty
    /// map.
    pub fn prev(&self, handle: Handle) -> Handle {
        let res = match self.resolve(handle) {
            Some(i) => self.arena.predecessor(i),
            None => self.arena.rightmost(),
        };
        assert!(res.is_some(), "`prev` of the first position");
        self.handle(res)
    }

    pub fn key(&self, handle: Handle) -> &K {
        &self.arena.node(self.resolve_entry(handle)).key
    }
    pub fn value(&self, handle: Handle) -> &V {
        &self.arena.node(self.resolve_entry(handle)).value
    }
    pub fn value_mut(&mut self, handle: Handle) -> &mut V {
        let i = self.resolve_entry(handle);
        &mut self.arena.node_mut(i).value
    }

    /// `None` for the end handle.
    pub fn get(&self, handle: Handle) -> Option<(&K, &V)> {
        let node = self.arena.node(self.resolve(handle)?);
        Some((&node.key, &node.value))
    }

    pub fn first(&self) -> Option<(&K, &V)> { self.get(self.begin()) }
    pub fn last(&self) -> Option<(&K, &V)> {
        let node = self.arena.node(self.arena.rightmost()?);
        Some((&node.key, &node.value))
    }

    /// Removes the entry and hands it back instead of releasing it.
    ///
    /// # Panics
    /// Panics if `handle` is the end or stale.
    pub fn take(&mut self, handle: Handle) -> (K, V) {
        let i = self.resolve_entry(handle);
        let node = self.arena.unlink(i);
        self.len -= 1;
        (node.key, node.value)
    }

    /// Removes the entry, releasing its key and value through the policy.
    ///
    /// # Panics
    /// Panics if `handle` is the end or stale.
    pub fn erase(&mut self, handle: Handle) {
        let (key, value) = self.take(handle);
        self.policy.drop_key(key);
        self.policy.drop_value(value);
    }

    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let handle = self.find(key);
        if handle.is_end() { None } else { Some(self.take(handle)) }
    }
}

impl<K, V, P: MapPolicy<K, V>, R: RngCore> TreapMap<K, V, P, R> {
    fn insert_inner(
        &mut self,
        key: K,
        value: V,
        overwrite: bool,
    ) -> InsertResult {
        let (i, inserted) = self.arena.insert(
            Edge::Root,
            key,
            value,
            overwrite,
            &self.policy,
            &mut self.rng,
        );
        if inserted {
            self.len += 1;
        }
        InsertResult { handle: self.handle(Some(i)), inserted }
    }

    /// Inserts unless `key` is present. If it is, both `key` and `value`
    /// are released and the stored value is kept.
    pub fn insert(&mut self, key: K, value: V) -> InsertResult {
        self.insert_inner(key, value, false)
    }

    /// Inserts, or replaces the stored value if `key` is present. The
    /// replaced value and the redundant key are released.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> InsertResult {
        self.insert_inner(key, value, true)
    }

    /// The entry for `key`, inserted with `fallback` if absent.
    pub fn find_or_insert(&mut self, key: K, fallback: V) -> Handle {
        let found = self.find(&key);
        if found.is_end() {
            let res = self.insert_inner(key, fallback, false);
            debug_assert!(res.inserted);
            res.handle
        } else {
            self.policy.drop_key(key);
            self.policy.drop_value(fallback);
            found
        }
    }
}

impl<K, V, P: MapPolicy<K, V>, R> Drop for TreapMap<K, V, P, R> {
    fn drop(&mut self) {
        let policy = &self.policy;
        for node in self.arena.drain() {
            policy.drop_key(node.key);
            policy.drop_value(node.value);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, P: MapPolicy<K, V>, R> fmt::Debug
    for TreapMap<K, V, P, R>
{
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_map().entries(self.iter()).finish()
    }
}

#[test]
fn insert_and_overwrite() {
    let mut map = TreapMap::new();
    assert!(map.is_empty());

    let res = map.insert("nihao".to_owned(), "ma".to_owned());
    assert!(res.inserted);
    let it1 = res.handle;
    assert_eq!(map.key(it1), "nihao");
    assert_eq!(map.value(it1), "ma");
    assert_eq!(map.len(), 1);

    let res = map.insert("haha".to_owned(), "hehe".to_owned());
    assert!(res.inserted);
    let it2 = res.handle;
    assert_eq!(map.len(), 2);

    let res = map.insert("haha".to_owned(), "what".to_owned());
    assert!(!res.inserted);
    assert_eq!(res.handle, it2);
    assert_eq!(map.value(it2), "hehe");
    assert_eq!(map.len(), 2);

    assert_eq!(map.begin(), it2);
    assert_eq!(map.prev(map.end()), it1);
    assert_eq!(map.next(it2), it1);
    assert!(map.next(it1).is_end());

    let res = map.insert_or_assign("haha".to_owned(), "what".to_owned());
    assert!(!res.inserted);
    assert_eq!(res.handle, it2);
    assert_eq!(map.value(it2), "what");
    assert_eq!(map.len(), 2);

    map.erase(it1);
    map.erase(it2);
    assert!(map.is_empty());
    assert!(map.begin().is_end());
}

#[test]
fn hundred_keys() {
    let key = |i: usize| format!("key {i:02}");
    let value = |i: usize| format!("value {i:02}");

    let mut map = TreapMap::new();
    for i in 0..100 {
        map.insert(key(i), value(i));
    }
    assert_eq!(map.len(), 100);

    let mut it = map.begin();
    let mut count = 0;
    while !it.is_end() {
        assert_eq!(map.key(it), &key(count));
        assert_eq!(map.value(it), &value(count));
        map.value_mut(it).push_str(" what");
        it = map.next(it);
        count += 1;
    }
    assert_eq!(count, 100);

    for i in 0..100 {
        let it = map.find(&key(i));
        assert_eq!(map.value(it), &format!("value {i:02} what"));
        assert_eq!(map.find_owned(key(i)), it);
    }

    for i in 50..100 {
        let it = map.find_owned(key(i));
        map.erase(it);
    }
    assert_eq!(map.len(), 50);
    assert!(map.find(&key(50)).is_end());

    for i in 0..50 {
        map.find_or_insert(key(i), "unused".to_owned());
    }
    assert_eq!(map.len(), 50);
    for i in 50..100 {
        let it = map.find_or_insert(key(i), value(i));
        assert_eq!(map.value(it), &value(i));
    }
    assert_eq!(map.len(), 100);
    assert_eq!(map.value(map.find(&key(7))), "value 07 what");
    assert_eq!(map.check_invariants(), Ok(()));
}

#[test]
fn bounds() {
    let mut map = TreapMap::new();
    for ch in ('a'..='z').step_by(2) {
        map.insert(ch, ch);
    }
    for ch in ('a'..='z').step_by(2) {
        assert_eq!(map.value(map.lower_bound(&ch)), &ch);
        let upper = map.upper_bound(&ch);
        if ch == 'y' {
            assert!(upper.is_end());
        } else {
            assert_eq!(map.value(upper), &((ch as u8 + 2) as char));
        }
    }
    assert_eq!(map.key(map.lower_bound(&'b')), &'c');
    assert_eq!(map.key(map.upper_bound(&'b')), &'c');
    assert_eq!(map.key(map.lower_bound(&'\0')), &'a');
    assert!(map.lower_bound(&'z').is_end());
}

#[test]
fn reverse_walk() {
    let mut map = TreapMap::with_seed(1);
    for i in (0..20).rev() {
        map.insert(i, i * i);
    }
    let mut it = map.end();
    let mut keys = vec![];
    for _ in 0..map.len() {
        it = map.prev(it);
        keys.push(*map.key(it));
    }
    assert_eq!(it, map.begin());
    assert!(keys.iter().copied().eq((0..20).rev()));
    assert_eq!(map.first(), Some((&0, &0)));
    assert_eq!(map.last(), Some((&19, &361)));
}

#[test]
fn handles_survive_unrelated_updates() {
    let mut map = TreapMap::new();
    let handles: Vec<_> = (0..64).map(|i| map.insert(i, i).handle).collect();
    for i in (0..64).step_by(2) {
        map.erase(handles[i]);
    }
    for i in 64..128 {
        map.insert(i, i);
    }
    for i in (1..64).step_by(2) {
        assert_eq!(map.get(handles[i]), Some((&i, &i)));
    }
}

#[test]
fn take_and_remove() {
    let mut map = TreapMap::new();
    map.insert(1, "one".to_owned());
    map.insert(2, "two".to_owned());
    let it = map.find(&1);
    assert_eq!(map.take(it), (1, "one".to_owned()));
    assert_eq!(map.remove(&2), Some((2, "two".to_owned())));
    assert_eq!(map.remove(&2), None);
    assert!(map.is_empty());
    assert_eq!(map.get(map.begin()), None);
}

#[test]
fn swap_and_clear() {
    let mut fst = TreapMap::new();
    let mut snd = TreapMap::new();
    for i in 0..10 {
        fst.insert(i, ());
    }
    let it = fst.find(&3);
    fst.swap(&mut snd);
    assert!(fst.is_empty());
    assert_eq!(snd.len(), 10);
    assert_eq!(snd.key(it), &3);

    snd.clear();
    assert!(snd.is_empty());
    assert!(snd.begin().is_end());
    snd.insert(5, ());
    assert_eq!(snd.len(), 1);
    assert_eq!(snd.check_invariants(), Ok(()));
}

#[test]
fn debug_fmt() {
    let mut map = TreapMap::new();
    map.insert(2, "b");
    map.insert(1, "a");
    assert_eq!(format!("{map:?}"), r#"{1: "a", 2: "b"}"#);
}

#[test]
#[should_panic = "stale handle"]
fn erased_handle() {
    let mut map = TreapMap::new();
    let it = map.insert(0, 0).handle;
    map.erase(it);
    map.erase(it);
}

#[test]
#[should_panic = "stale handle"]
fn handle_of_another_map() {
    let mut fst = TreapMap::new();
    let mut snd = TreapMap::new();
    let it = fst.insert(1, "one").handle;
    snd.insert(2, "two");
    snd.erase(it);
}

#[test]
#[should_panic = "stale handle"]
fn handle_of_the_clone_source() {
    let mut map = TreapMap::new();
    let it = map.insert(1, "one").handle;
    let copy = map.clone();
    copy.value(it);
}

#[test]
fn handles_move_with_swap() {
    let mut fst = TreapMap::new();
    let mut snd = TreapMap::new();
    let it = fst.insert(1, "one").handle;
    snd.insert(2, "two");
    fst.swap(&mut snd);
    assert_eq!(snd.get(it), Some((&1, &"one")));
    assert_eq!(fst.first(), Some((&2, &"two")));
}

#[test]
#[should_panic = "end handle"]
fn deref_end() {
    let map = TreapMap::<i32, i32>::new();
    map.key(map.end());
}

#[test]
#[should_panic = "`next` of the end handle"]
fn next_of_end() {
    let mut map = TreapMap::new();
    map.insert(0, 0);
    map.next(map.end());
}

#[test]
#[should_panic = "first position"]
fn prev_of_begin() {
    let mut map = TreapMap::new();
    map.insert(0, 0);
    map.prev(map.begin());
}

#[test]
#[should_panic = "first position"]
fn prev_of_empty_end() {
    let map = TreapMap::<i32, i32>::new();
    map.prev(map.end());
}
