use std::{cmp::Ordering, mem};

use log::trace;
use map_policy::{ClonePolicy, KeyOrder, MapPolicy};
use rand::RngCore;

pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) left: Option<usize>,
    pub(crate) right: Option<usize>,
    // Traversal only; the edge from the parent is the owning one.
    pub(crate) parent: Option<usize>,
    pub(crate) priority: u64,
}

struct Slot<K, V> {
    generation: u32,
    node: Option<Node<K, V>>,
}

/// Nodes of one tree. A live node never changes slots.
pub(crate) struct Arena<K, V> {
    slots: Vec<Slot<K, V>>,
    vacant: Vec<usize>,
    pub(crate) root: Option<usize>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Side {
    Left,
    Right,
}

/// The link that owns a node: the root pointer, or a side of the parent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Edge {
    Root,
    Left(usize),
    Right(usize),
}

#[derive(Debug, Default)]
pub(crate) struct MirrorStats {
    pub(crate) reused: usize,
    pub(crate) allocated: usize,
    pub(crate) released: usize,
}

impl Side {
    fn below(self, parent: usize) -> Edge {
        match self {
            Side::Left => Edge::Left(parent),
            Side::Right => Edge::Right(parent),
        }
    }
}

impl Edge {
    fn parent(self) -> Option<usize> {
        match self {
            Edge::Root => None,
            Edge::Left(i) | Edge::Right(i) => Some(i),
        }
    }
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V, parent: Option<usize>, priority: u64) -> Self {
        Self { key, value, left: None, right: None, parent, priority }
    }
    fn child(&self, side: Side) -> Option<usize> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
    fn child_mut(&mut self, side: Side) -> &mut Option<usize> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

impl<K, V> Arena<K, V> {
    pub(crate) fn new() -> Self {
        Self { slots: vec![], vacant: vec![], root: None }
    }

    pub(crate) fn node(&self, i: usize) -> &Node<K, V> {
        match &self.slots[i].node {
            Some(node) => node,
            None => unreachable!("link to vacant slot {i}"),
        }
    }
    pub(crate) fn node_mut(&mut self, i: usize) -> &mut Node<K, V> {
        match &mut self.slots[i].node {
            Some(node) => node,
            None => unreachable!("link to vacant slot {i}"),
        }
    }

    pub(crate) fn generation(&self, i: usize) -> u32 {
        self.slots[i].generation
    }
    pub(crate) fn is_live(&self, i: usize, generation: u32) -> bool {
        self.slots
            .get(i)
            .map_or(false, |s| s.generation == generation && s.node.is_some())
    }

    fn alloc(&mut self, node: Node<K, V>) -> usize {
        if let Some(i) = self.vacant.pop() {
            self.slots[i].node = Some(node);
            return i;
        }
        if self.slots.len() == self.slots.capacity() {
            trace!("arena grows past {} slots", self.slots.len());
        }
        self.slots.push(Slot { generation: 0, node: Some(node) });
        self.slots.len() - 1
    }

    fn release(&mut self, i: usize) -> Node<K, V> {
        let slot = &mut self.slots[i];
        let Some(node) = slot.node.take() else {
            unreachable!("double release of slot {i}");
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push(i);
        node
    }

    /// Releases the subtree under `i` (which must already be detached)
    /// and hands every node to `f`. Returns the number of nodes.
    pub(crate) fn release_subtree(
        &mut self,
        i: usize,
        mut f: impl FnMut(Node<K, V>),
    ) -> usize {
        let mut stack = vec![i];
        let mut count = 0;
        while let Some(i) = stack.pop() {
            let node = self.release(i);
            stack.extend(node.left);
            stack.extend(node.right);
            f(node);
            count += 1;
        }
        count
    }

    /// Takes every node out, in no particular order.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Node<K, V>> + '_ {
        self.root = None;
        self.vacant.clear();
        self.slots.drain(..).filter_map(|slot| slot.node)
    }

    pub(crate) fn child(&self, i: usize, side: Side) -> Option<usize> {
        self.node(i).child(side)
    }

    fn link(&self, edge: Edge) -> Option<usize> {
        match edge {
            Edge::Root => self.root,
            Edge::Left(p) => self.node(p).left,
            Edge::Right(p) => self.node(p).right,
        }
    }

    /// Points `edge` at `child` and fixes the back-reference of `child`.
    fn relink(&mut self, edge: Edge, child: Option<usize>) {
        match edge {
            Edge::Root => self.root = child,
            Edge::Left(p) => self.node_mut(p).left = child,
            Edge::Right(p) => self.node_mut(p).right = child,
        }
        if let Some(c) = child {
            self.node_mut(c).parent = edge.parent();
        }
    }

    fn edge_of(&self, i: usize) -> Edge {
        match self.node(i).parent {
            None => Edge::Root,
            Some(p) if self.node(p).left == Some(i) => Edge::Left(p),
            Some(p) => {
                debug_assert_eq!(self.node(p).right, Some(i));
                Edge::Right(p)
            }
        }
    }

    /// Lifts the `side` child of the node at `edge` into its place.
    /// `Side::Left` is a right turn and `Side::Right` a left turn.
    /// Returns the lifted node.
    fn rotate_up(&mut self, edge: Edge, side: Side) -> usize {
        let Some(p) = self.link(edge) else {
            unreachable!("rotation at an empty edge");
        };
        let Some(c) = self.child(p, side) else {
            unreachable!("rotation without a child to lift");
        };
        let other = match side {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        };
        let inner = self.child(c, other);
        *self.node_mut(p).child_mut(side) = inner;
        if let Some(x) = inner {
            self.node_mut(x).parent = Some(p);
        }
        *self.node_mut(c).child_mut(other) = Some(p);
        self.node_mut(p).parent = Some(c);
        self.relink(edge, Some(c));
        c
    }

    /// Inserts below `edge`. Returns the node holding `key` and whether
    /// it was newly created. The supplied key and value are consumed
    /// either way.
    pub(crate) fn insert<P, R>(
        &mut self,
        edge: Edge,
        key: K,
        value: V,
        overwrite: bool,
        policy: &P,
        rng: &mut R,
    ) -> (usize, bool)
    where
        P: MapPolicy<K, V>,
        R: RngCore,
    {
        let Some(cur) = self.link(edge) else {
            let node = Node::new(key, value, edge.parent(), rng.next_u64());
            let i = self.alloc(node);
            self.relink(edge, Some(i));
            return (i, true);
        };

        let side = match policy.compare(&self.node(cur).key, &key) {
            Ordering::Equal => {
                policy.drop_key(key);
                if overwrite {
                    let stored = &mut self.node_mut(cur).value;
                    policy.drop_value(mem::replace(stored, value));
                } else {
                    policy.drop_value(value);
                }
                return (cur, false);
            }
            Ordering::Greater => Side::Left,
            Ordering::Less => Side::Right,
        };

        let (found, inserted) =
            self.insert(side.below(cur), key, value, overwrite, policy, rng);
        if inserted {
            // Only the freshly drawn priority can break the heap order,
            // and it sits at most one level below `cur` by now.
            let Some(child) = self.child(cur, side) else {
                unreachable!("inserted subtree is empty");
            };
            if self.node(child).priority < self.node(cur).priority {
                self.rotate_up(edge, side);
            }
        }
        (found, inserted)
    }

    /// Detaches node `i` by rotating it down until it has at most one
    /// child, then splicing that child into its place.
    pub(crate) fn unlink(&mut self, i: usize) -> Node<K, V> {
        let mut edge = self.edge_of(i);
        loop {
            let (left, right) = {
                let node = self.node(i);
                (node.left, node.right)
            };
            match (left, right) {
                (None, only) | (only, None) => {
                    self.relink(edge, only);
                    return self.release(i);
                }
                (Some(l), Some(r)) => {
                    edge = if self.node(l).priority < self.node(r).priority {
                        Edge::Right(self.rotate_up(edge, Side::Left))
                    } else {
                        Edge::Left(self.rotate_up(edge, Side::Right))
                    };
                }
            }
        }
    }

    pub(crate) fn find<P: KeyOrder<K>>(
        &self,
        key: &K,
        policy: &P,
    ) -> Option<usize> {
        let mut cur = self.root;
        while let Some(i) = cur {
            cur = match policy.compare(&self.node(i).key, key) {
                Ordering::Equal => return Some(i),
                Ordering::Greater => self.node(i).left,
                Ordering::Less => self.node(i).right,
            };
        }
        None
    }

    /// The first node whose key is `>= key`, or `> key` if `strict`.
    pub(crate) fn bound<P: KeyOrder<K>>(
        &self,
        key: &K,
        strict: bool,
        policy: &P,
    ) -> Option<usize> {
        let mut cur = self.root;
        let mut res = None;
        while let Some(i) = cur {
            let ord = policy.compare(&self.node(i).key, key);
            let hit = match ord {
                Ordering::Greater => true,
                Ordering::Equal => !strict,
                Ordering::Less => false,
            };
            if hit {
                res = Some(i);
                cur = self.node(i).left;
            } else {
                cur = self.node(i).right;
            }
        }
        res
    }

    fn extreme(&self, mut i: usize, side: Side) -> usize {
        while let Some(c) = self.child(i, side) {
            i = c;
        }
        i
    }
    pub(crate) fn leftmost(&self) -> Option<usize> {
        self.root.map(|i| self.extreme(i, Side::Left))
    }
    pub(crate) fn rightmost(&self) -> Option<usize> {
        self.root.map(|i| self.extreme(i, Side::Right))
    }

    /// In-order neighbor of `i` towards `side`.
    fn step(&self, i: usize, side: Side) -> Option<usize> {
        let other = match side {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        };
        if let Some(c) = self.child(i, side) {
            return Some(self.extreme(c, other));
        }
        let mut cur = i;
        while let Some(p) = self.node(cur).parent {
            if self.child(p, side) != Some(cur) {
                return Some(p);
            }
            cur = p;
        }
        None
    }
    pub(crate) fn successor(&self, i: usize) -> Option<usize> {
        self.step(i, Side::Right)
    }
    pub(crate) fn predecessor(&self, i: usize) -> Option<usize> {
        self.step(i, Side::Left)
    }

    /// Makes the subtree below `edge` a copy of `src`'s subtree at `s`,
    /// reusing nodes already present at the same positions.
    pub(crate) fn mirror<P: ClonePolicy<K, V>>(
        &mut self,
        edge: Edge,
        src: &Self,
        s: usize,
        policy: &P,
        stats: &mut MirrorStats,
    ) {
        let from = src.node(s);
        let d = match self.link(edge) {
            Some(d) => {
                let node = self.node_mut(d);
                policy.clone_key_from(&mut node.key, &from.key);
                policy.clone_value_from(&mut node.value, &from.value);
                node.priority = from.priority;
                let slot = &mut self.slots[d];
                slot.generation = slot.generation.wrapping_add(1);
                stats.reused += 1;
                d
            }
            None => {
                let node = Node::new(
                    policy.clone_key(&from.key),
                    policy.clone_value(&from.value),
                    edge.parent(),
                    from.priority,
                );
                let d = self.alloc(node);
                self.relink(edge, Some(d));
                stats.allocated += 1;
                d
            }
        };

        for side in [Side::Left, Side::Right] {
            if let Some(sc) = src.child(s, side) {
                self.mirror(side.below(d), src, sc, policy, stats);
            } else if let Some(dc) = self.child(d, side) {
                *self.node_mut(d).child_mut(side) = None;
                stats.released += self.release_subtree(dc, |node| {
                    policy.drop_key(node.key);
                    policy.drop_value(node.value);
                });
            }
        }
    }
}
