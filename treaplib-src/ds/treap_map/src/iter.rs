use std::iter::FusedIterator;

use map_policy::MapPolicy;

use crate::{node::Arena, TreapMap};

/// In-order iterator over the entries of a [`TreapMap`].
pub struct Iter<'a, K, V> {
    arena: &'a Arena<K, V>,
    front: Option<usize>,
    back: Option<usize>,
    len: usize,
}

pub struct Keys<'a, K, V>(Iter<'a, K, V>);
pub struct Values<'a, K, V>(Iter<'a, K, V>);

impl<K, V, P: MapPolicy<K, V>, R> TreapMap<K, V, P, R> {
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            arena: &self.arena,
            front: self.arena.leftmost(),
            back: self.arena.rightmost(),
            len: self.len,
        }
    }
    pub fn keys(&self) -> Keys<'_, K, V> { Keys(self.iter()) }
    pub fn values(&self) -> Values<'_, K, V> { Values(self.iter()) }
}

impl<'a, K, V, P: MapPolicy<K, V>, R> IntoIterator
    for &'a TreapMap<K, V, P, R>
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let i = self.front?;
        self.len -= 1;
        self.front = self.arena.successor(i);
        let node = self.arena.node(i);
        Some((&node.key, &node.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) { (self.len, Some(self.len)) }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let i = self.back?;
        self.len -= 1;
        self.back = self.arena.predecessor(i);
        let node = self.arena.node(i);
        Some((&node.key, &node.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self { Self { ..*self } }
}

macro_rules! impl_projection {
    ( $($name:ident => $item:ident, $proj:tt;)* ) => { $(
        impl<'a, K, V> Iterator for $name<'a, K, V> {
            type Item = &'a $item;
            fn next(&mut self) -> Option<Self::Item> {
                self.0.next().map(|e| e.$proj)
            }
            fn size_hint(&self) -> (usize, Option<usize>) {
                self.0.size_hint()
            }
        }
        impl<'a, K, V> DoubleEndedIterator for $name<'a, K, V> {
            fn next_back(&mut self) -> Option<Self::Item> {
                self.0.next_back().map(|e| e.$proj)
            }
        }
        impl<K, V> ExactSizeIterator for $name<'_, K, V> {}
        impl<K, V> FusedIterator for $name<'_, K, V> {}
    )* };
}

impl_projection! {
    Keys => K, 0;
    Values => V, 1;
}

#[test]
fn double_ended() {
    let mut map = TreapMap::new();
    for i in [5, 3, 8, 1, 4, 7, 9, 2, 6] {
        map.insert(i, -i);
    }
    let mut iter = map.iter();
    assert_eq!(iter.len(), 9);
    assert_eq!(iter.next(), Some((&1, &-1)));
    assert_eq!(iter.next_back(), Some((&9, &-9)));
    assert_eq!(iter.next_back(), Some((&8, &-8)));
    assert_eq!(iter.len(), 6);
    let rest: Vec<_> = iter.map(|(&k, _)| k).collect();
    assert_eq!(rest, [2, 3, 4, 5, 6, 7]);

    assert!(map.keys().copied().eq(1..=9));
    assert!(map.values().rev().copied().eq(-9..=-1));
    assert_eq!((&map).into_iter().count(), 9);
}

#[test]
fn meet_in_the_middle() {
    let mut map = TreapMap::new();
    for i in 0..4 {
        map.insert(i, ());
    }
    let mut iter = map.keys();
    assert_eq!(iter.next(), Some(&0));
    assert_eq!(iter.next_back(), Some(&3));
    assert_eq!(iter.next(), Some(&1));
    assert_eq!(iter.next_back(), Some(&2));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.next_back(), None);
}
