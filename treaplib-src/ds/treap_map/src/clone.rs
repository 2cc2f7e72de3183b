use log::trace;
use map_policy::ClonePolicy;

use crate::{
    node::{Arena, Edge, MirrorStats},
    TreapMap,
};

/// Priorities are copied rather than drawn again, so a clone has exactly
/// the shape of its source.
impl<K, V, P, R> Clone for TreapMap<K, V, P, R>
where
    P: ClonePolicy<K, V> + Clone,
    R: Clone,
{
    fn clone(&self) -> Self {
        let mut res = Self {
            owner: crate::next_owner(),
            arena: Arena::new(),
            len: 0,
            policy: self.policy.clone(),
            rng: self.rng.clone(),
        };
        res.clone_from(self);
        res
    }

    /// Reuses the nodes of `self` that sit where `source` has nodes, so
    /// refreshing a copy of a slowly-changing map allocates little. Every
    /// handle into `self` is invalidated. The priority source of `self` is
    /// kept.
    fn clone_from(&mut self, source: &Self) {
        self.policy.clone_from(&source.policy);
        let mut stats = MirrorStats::default();
        match source.arena.root {
            Some(root) => self.arena.mirror(
                Edge::Root,
                &source.arena,
                root,
                &self.policy,
                &mut stats,
            ),
            None => {
                if let Some(root) = self.arena.root.take() {
                    let policy = &self.policy;
                    stats.released += self.arena.release_subtree(root, |node| {
                        policy.drop_key(node.key);
                        policy.drop_value(node.value);
                    });
                }
            }
        }
        self.len = source.len;
        trace!(
            "clone_from: {} reused, {} allocated, {} released",
            stats.reused,
            stats.allocated,
            stats.released
        );
    }
}
