//! Ordered association list over a sorted `Vec`. Linear-time updates;
//! meant as a reference for the tree maps.

pub struct SortedAssoc<K, V>(Vec<(K, V)>);

impl<K: Ord, V> SortedAssoc<K, V> {
    pub fn new() -> Self { Self(vec![]) }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn len(&self) -> usize { self.0.len() }

    fn search(&self, key: &K) -> Result<usize, usize> {
        self.0.binary_search_by(|(k, _)| k.cmp(key))
    }

    /// Returns `true` if `key` was absent. An existing value is kept.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        match self.search(&key) {
            Ok(_) => false,
            Err(i) => {
                self.0.insert(i, (key, value));
                true
            }
        }
    }

    /// Returns `true` if `key` was absent. An existing value is replaced.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> bool {
        match self.search(&key) {
            Ok(i) => {
                self.0[i].1 = value;
                false
            }
            Err(i) => {
                self.0.insert(i, (key, value));
                true
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.search(key).ok().map(|i| &self.0[i].1)
    }

    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        self.search(key).ok().map(|i| self.0.remove(i))
    }

    pub fn lower_bound(&self, key: &K) -> Option<(&K, &V)> {
        let i = self.0.partition_point(|(k, _)| k < key);
        self.0.get(i).map(|(k, v)| (k, v))
    }

    pub fn upper_bound(&self, key: &K) -> Option<(&K, &V)> {
        let i = self.0.partition_point(|(k, _)| k <= key);
        self.0.get(i).map(|(k, v)| (k, v))
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.0.first().map(|(k, v)| (k, v))
    }
    pub fn last(&self) -> Option<(&K, &V)> {
        self.0.last().map(|(k, v)| (k, v))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &V)> + '_ {
        self.0.iter().map(|(k, v)| (k, v))
    }
}

impl<K: Ord, V> Default for SortedAssoc<K, V> {
    fn default() -> Self { Self::new() }
}

#[test]
fn sanity_check() {
    let mut alist = SortedAssoc::new();
    assert!(alist.is_empty());

    assert!(alist.insert(3, "three"));
    assert!(alist.insert(1, "one"));
    assert!(!alist.insert(3, "xxx"));
    assert_eq!(alist.get(&3), Some(&"three"));
    assert_eq!(alist.len(), 2);

    assert!(!alist.insert_or_assign(3, "drei"));
    assert_eq!(alist.get(&3), Some(&"drei"));
    assert!(alist.insert_or_assign(5, "five"));

    assert_eq!(alist.lower_bound(&1), Some((&1, &"one")));
    assert_eq!(alist.lower_bound(&2), Some((&3, &"drei")));
    assert_eq!(alist.upper_bound(&3), Some((&5, &"five")));
    assert_eq!(alist.upper_bound(&5), None);
    assert_eq!(alist.first(), Some((&1, &"one")));
    assert_eq!(alist.last(), Some((&5, &"five")));

    assert_eq!(alist.remove(&3), Some((3, "drei")));
    assert_eq!(alist.remove(&3), None);
    let keys: Vec<_> = alist.iter().map(|(&k, _)| k).collect();
    assert_eq!(keys, [1, 5]);
}
