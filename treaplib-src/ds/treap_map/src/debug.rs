use std::{cmp::Ordering, fmt};

use map_policy::MapPolicy;

use crate::TreapMap;

/// A broken structural invariant. Entries are named by their rank in
/// key order as the tree currently links them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Violation {
    /// The key at `rank` is not greater than the one before it.
    Order { rank: usize },
    /// The entry at `rank` has a smaller priority than its parent.
    Heap { rank: usize },
    /// The back-reference of the entry at `rank` does not name the node
    /// that links to it.
    Parent { rank: usize },
    /// The recorded length disagrees with the number of linked entries.
    Len { recorded: usize, counted: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Order { rank } => {
                write!(fmt, "keys out of order at rank {rank}")
            }
            Violation::Heap { rank } => {
                write!(fmt, "priority above its parent's at rank {rank}")
            }
            Violation::Parent { rank } => {
                write!(fmt, "inconsistent parent link at rank {rank}")
            }
            Violation::Len { recorded, counted } => write!(
                fmt,
                "length is recorded as {recorded} \
                 but {counted} entries are linked"
            ),
        }
    }
}

impl std::error::Error for Violation {}

impl<K, V, P: MapPolicy<K, V>, R> TreapMap<K, V, P, R> {
    /// Walks the whole tree and reports the first broken invariant.
    pub fn check_invariants(&self) -> Result<(), Violation> {
        let arena = &self.arena;
        let mut stack = vec![];
        let mut cur = arena.root.map(|i| (i, None));
        let mut prev: Option<usize> = None;
        let mut rank = 0;
        loop {
            while let Some((i, parent)) = cur {
                stack.push((i, parent));
                cur = arena.node(i).left.map(|c| (c, Some(i)));
            }
            let Some((i, parent)) = stack.pop() else { break };

            let node = arena.node(i);
            if node.parent != parent {
                return Err(Violation::Parent { rank });
            }
            if let Some(p) = parent {
                if node.priority < arena.node(p).priority {
                    return Err(Violation::Heap { rank });
                }
            }
            if let Some(j) = prev {
                let ord = self.policy.compare(&arena.node(j).key, &node.key);
                if ord != Ordering::Less {
                    return Err(Violation::Order { rank });
                }
            }

            prev = Some(i);
            rank += 1;
            cur = node.right.map(|c| (c, Some(i)));
        }

        if rank != self.len {
            return Err(Violation::Len { recorded: self.len, counted: rank });
        }
        Ok(())
    }

    /// The number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        let mut res = 0;
        let mut stack: Vec<_> =
            self.arena.root.map(|i| (i, 1)).into_iter().collect();
        while let Some((i, depth)) = stack.pop() {
            res = res.max(depth);
            let node = self.arena.node(i);
            stack.extend(node.left.map(|c| (c, depth + 1)));
            stack.extend(node.right.map(|c| (c, depth + 1)));
        }
        res
    }
}

impl<K: fmt::Debug, V: fmt::Debug, P: MapPolicy<K, V>, R>
    TreapMap<K, V, P, R>
{
    /// Draws the tree sideways, larger keys on top, one entry per line
    /// along with its priority.
    pub fn dump(&self) -> String {
        #[derive(Clone, Copy, Eq, PartialEq)]
        enum Kind {
            Root,
            Upper,
            Lower,
        }
        use Kind::*;

        fn dfs<K: fmt::Debug, V: fmt::Debug>(
            arena: &crate::node::Arena<K, V>,
            i: usize,
            prefix: &str,
            kind: Kind,
            out: &mut String,
        ) {
            let node = arena.node(i);
            let (above, below) = match kind {
                Root => ("", ""),
                Upper => ("    ", "│   "),
                Lower => ("│   ", "    "),
            };
            if let Some(r) = node.right {
                dfs(arena, r, &(prefix.to_owned() + above), Upper, out);
            }
            let branch = match kind {
                Root => "",
                Upper => "┌── ",
                Lower => "└── ",
            };
            *out += &format!(
                "{prefix}{branch}{:?}: {:?} ({})\n",
                node.key, node.value, node.priority
            );
            if let Some(l) = node.left {
                dfs(arena, l, &(prefix.to_owned() + below), Lower, out);
            }
        }

        let mut out = String::new();
        if let Some(root) = self.arena.root {
            dfs(&self.arena, root, "", Root, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(map: &TreapMap<i32, i32>, key: i32) -> usize {
        match map.find(&key).node {
            Some(id) => id.index,
            None => panic!("{key} is absent"),
        }
    }

    fn sample() -> TreapMap<i32, i32> {
        let mut map = TreapMap::new();
        for i in 0..10 {
            map.insert(i, -i);
        }
        assert_eq!(map.check_invariants(), Ok(()));
        map
    }

    #[test]
    fn detect_order() {
        let mut map = sample();
        let i = index_of(&map, 3);
        map.arena.node_mut(i).key = 100;
        assert_eq!(map.check_invariants(), Err(Violation::Order { rank: 4 }));
    }

    #[test]
    fn detect_heap() {
        let mut map = sample();
        let Some(root) = map.arena.root else { unreachable!() };
        map.arena.node_mut(root).priority = u64::MAX;
        assert!(matches!(map.check_invariants(), Err(Violation::Heap { .. })));
    }

    #[test]
    fn detect_parent() {
        let mut map = sample();
        let Some(root) = map.arena.root else { unreachable!() };
        let node = map.arena.node(root);
        let Some(child) = node.left.or(node.right) else { unreachable!() };
        map.arena.node_mut(child).parent = None;
        assert!(matches!(
            map.check_invariants(),
            Err(Violation::Parent { .. })
        ));
    }

    #[test]
    fn detect_len() {
        let mut map = sample();
        map.len = 3;
        let err = map.check_invariants().unwrap_err();
        assert_eq!(err, Violation::Len { recorded: 3, counted: 10 });
        assert_eq!(
            err.to_string(),
            "length is recorded as 3 but 10 entries are linked"
        );
    }

    #[test]
    fn height_bounds() {
        let mut map = TreapMap::new();
        assert_eq!(map.height(), 0);
        map.insert(0, 0);
        assert_eq!(map.height(), 1);
        for i in 1..1000 {
            map.insert(i, i);
        }
        let h = map.height();
        assert!((10..=40).contains(&h), "height {h}");
    }

    #[test]
    fn dump_lines() {
        let map = sample();
        let out = map.dump();
        eprint!("{out}");
        let keys: Vec<i32> = out
            .lines()
            .map(|line| {
                let entry =
                    line.trim_start_matches(['│', '┌', '└', '─', ' ']);
                let (key, _) = entry.split_once(':').unwrap();
                key.parse().unwrap()
            })
            .collect();
        assert!(keys.iter().copied().eq((0..10).rev()));
        let unindented =
            out.lines().filter(|l| l.starts_with(|c: char| c.is_ascii_digit()));
        assert_eq!(unindented.count(), 1);
        assert_eq!(TreapMap::<i32, i32>::new().dump(), "");
    }
}
