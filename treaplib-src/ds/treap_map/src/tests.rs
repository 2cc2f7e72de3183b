use std::{cell::Cell, cmp::Ordering};

use map_policy::{def_policy, CompareBy, KeyOrder, Release, Reverse};
use rand::{Error, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use randgen::{Distinct, Gen, Queries, Query};
use sorted_assoc::SortedAssoc;

use crate::TreapMap;

fn run_queries<R: RngCore>(
    map: &mut TreapMap<i32, u32, map_policy::Natural, R>,
    q: &[Query],
) {
    let mut naive = SortedAssoc::new();
    for (t, &query) in q.iter().enumerate() {
        match query {
            Query::Insert(k, v) => {
                let res = map.insert(k, v);
                assert_eq!(res.inserted, naive.insert(k, v));
                assert_eq!(map.key(res.handle), &k);
                assert_eq!(Some(map.value(res.handle)), naive.get(&k));
            }
            Query::Assign(k, v) => {
                let res = map.insert_or_assign(k, v);
                assert_eq!(res.inserted, naive.insert_or_assign(k, v));
                assert_eq!(map.value(res.handle), &v);
            }
            Query::Erase(k) => {
                let it = map.find(&k);
                match naive.remove(&k) {
                    Some(_) => map.erase(it),
                    None => assert!(it.is_end()),
                }
                assert!(map.find(&k).is_end());
            }
            Query::Find(k) => {
                assert_eq!(map.get_value(&k), naive.get(&k));
            }
            Query::LowerBound(k) => {
                let it = map.lower_bound(&k);
                assert_eq!(map.get(it), naive.lower_bound(&k));
            }
            Query::UpperBound(k) => {
                let it = map.upper_bound(&k);
                assert_eq!(map.get(it), naive.upper_bound(&k));
            }
        }
        assert_eq!(map.len(), naive.len());
        if t % 256 == 0 {
            assert!(map.iter().eq(naive.iter()));
            assert_eq!(map.check_invariants(), Ok(()));
        }
    }
    assert!(map.iter().eq(naive.iter()));
    assert!(map.iter().rev().eq(naive.iter().rev()));
    assert_eq!(map.first(), naive.first());
    assert_eq!(map.last(), naive.last());
    assert_eq!(map.check_invariants(), Ok(()));
}

#[test]
fn test_vs_naive() {
    let mut rng = ChaCha20Rng::from_seed([0; 32]);
    for keys in [0..10, -100..100, 0..5000] {
        let q = Queries { keys, len: 20000 }.generate(&mut rng);
        run_queries(&mut TreapMap::new(), &q);
    }
}

#[test]
fn test_vs_naive_chacha_priorities() {
    let mut rng = ChaCha20Rng::from_seed([1; 32]);
    for keys in [0..10, -100..100, 0..5000] {
        let q = Queries { keys, len: 20000 }.generate(&mut rng);
        let priorities = ChaCha20Rng::seed_from_u64(rng.next_u64());
        let mut map =
            TreapMap::with_policy_and_rng(map_policy::Natural, priorities);
        run_queries(&mut map, &q);
    }
}

#[test]
fn handle_walk_matches_iter() {
    let mut rng = ChaCha20Rng::from_seed([2; 32]);
    let keys = Distinct { bound: -1000..1000, len: 500 }.generate(&mut rng);
    let mut map = TreapMap::with_seed(42);
    for &k in &keys {
        map.insert(k, k as u32);
    }
    for &k in keys.iter().step_by(3) {
        map.erase(map.find(&k));
    }

    let mut it = map.begin();
    let mut forward = vec![];
    while it != map.end() {
        forward.push(*map.key(it));
        it = map.next(it);
    }
    assert_eq!(forward.len(), map.len());
    assert!(forward.windows(2).all(|w| w[0] < w[1]));
    assert!(forward.iter().eq(map.keys()));

    let mut backward = vec![];
    let mut it = map.end();
    while it != map.begin() {
        it = map.prev(it);
        backward.push(*map.key(it));
    }
    backward.reverse();
    assert_eq!(forward, backward);
}

/// Draws the same priority every time.
struct Constant(u64);

impl RngCore for Constant {
    fn next_u32(&mut self) -> u32 { self.0 as u32 }
    fn next_u64(&mut self) -> u64 { self.0 }
    fn fill_bytes(&mut self, dest: &mut [u8]) { dest.fill(0) }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[test]
fn erase_ties_promote_right() {
    // no rotation on insert, so the shape follows the insertion order
    let mut map =
        TreapMap::with_policy_and_rng(map_policy::Natural, Constant(7));
    for k in [5, 2, 8, 1, 3, 7, 9] {
        map.insert(k, ());
    }
    let expected = [
        "    ┌── 9: () (7)",
        "┌── 8: () (7)",
        "│   └── 7: () (7)",
        "5: () (7)",
        "│   ┌── 3: () (7)",
        "└── 2: () (7)",
        "    └── 1: () (7)",
    ];
    assert!(map.dump().lines().eq(expected));

    // both children tie, so the right one is lifted each time
    map.erase(map.find(&5));
    assert_eq!(map.check_invariants(), Ok(()));
    let expected = [
        "┌── 9: () (7)",
        "8: () (7)",
        "└── 7: () (7)",
        "    │   ┌── 3: () (7)",
        "    └── 2: () (7)",
        "        └── 1: () (7)",
    ];
    assert!(map.dump().lines().eq(expected));

    map.erase(map.find(&2));
    assert_eq!(map.check_invariants(), Ok(()));
    let expected = [
        "┌── 9: () (7)",
        "8: () (7)",
        "└── 7: () (7)",
        "    └── 3: () (7)",
        "        └── 1: () (7)",
    ];
    assert!(map.dump().lines().eq(expected));
}

#[test]
fn height_is_logarithmic() {
    let n = 10_000;
    let bound = 4 * (n as f64).log2().ceil() as usize;

    let mut asc = TreapMap::new();
    let mut desc = TreapMap::new();
    for i in 0..n {
        asc.insert(i, ());
        desc.insert(n - i, ());
    }
    assert!(asc.height() <= bound, "{} > {bound}", asc.height());
    assert!(desc.height() <= bound, "{} > {bound}", desc.height());

    let mut map = TreapMap::with_policy_and_rng(
        map_policy::Natural,
        ChaCha20Rng::from_seed([3; 32]),
    );
    for i in 0..n {
        map.insert(i, ());
    }
    assert!(map.height() <= bound, "{} > {bound}", map.height());
}

#[test]
fn scenario_hundred_strings() {
    let key = |i: usize| format!("key {i:02}");
    let value = |i: usize| format!("value {i:02}");

    let mut map = TreapMap::new();
    for i in 0..100 {
        assert!(map.insert(key(i), value(i)).inserted);
    }
    let expected = (0..100).map(|i| (key(i), value(i)));
    assert!(map.iter().map(|(k, v)| (k.clone(), v.clone())).eq(expected));

    for i in 50..100 {
        map.erase(map.find(&key(i)));
    }
    assert_eq!(map.len(), 50);
    for i in 50..100 {
        map.insert(key(i), value(i));
    }
    assert_eq!(map.len(), 100);
    assert_eq!(map.check_invariants(), Ok(()));
}

#[test]
fn scenario_letter_bounds() {
    let mut map = TreapMap::new();
    for ch in ('a'..='y').step_by(2) {
        map.insert(ch, ());
    }
    assert_eq!(map.key(map.lower_bound(&'a')), &'a');
    assert_eq!(map.key(map.upper_bound(&'a')), &'c');
    assert_eq!(map.upper_bound(&'y'), map.end());
}

#[test]
fn scenario_duplicate_insert() {
    let mut map = TreapMap::new();
    let fst = map.insert("haha", "hehe");
    let snd = map.insert("haha", "what");
    assert!(fst.inserted);
    assert!(!snd.inserted);
    assert_eq!(fst.handle, snd.handle);
    assert_eq!(map.value(snd.handle), &"hehe");
    assert_eq!(map.len(), 1);
}

#[test]
fn reverse_order() {
    let mut map = TreapMap::with_policy(Reverse);
    for i in 0..20 {
        map.insert(i, i * 2);
    }
    assert!(map.keys().copied().eq((0..20).rev()));
    // "not less" in the policy's order
    assert_eq!(map.key(map.lower_bound(&10)), &10);
    assert_eq!(map.key(map.upper_bound(&10)), &9);
    assert!(map.upper_bound(&0).is_end());
    assert_eq!(map.check_invariants(), Ok(()));
}

#[test]
fn closure_order() {
    let by_abs = CompareBy(|x: &i32, y: &i32| {
        x.abs().cmp(&y.abs()).then_with(|| x.cmp(y))
    });
    let mut map = TreapMap::with_policy(by_abs);
    for i in -5..=5 {
        map.insert(i, ());
    }
    let keys: Vec<_> = map.keys().copied().collect();
    assert_eq!(keys, [0, -1, 1, -2, 2, -3, 3, -4, 4, -5, 5]);

    let copy = map.clone();
    assert!(copy.keys().eq(map.keys()));
}

#[test]
fn macro_order() {
    def_policy! {
        CaseInsensitive = (String, |x: &String, y: &String| {
            x.to_lowercase().cmp(&y.to_lowercase())
        }),
    }

    let mut map = TreapMap::with_policy(CaseInsensitive::new());
    assert!(map.insert("Hello".to_owned(), 1).inserted);
    assert!(!map.insert("HELLO".to_owned(), 2).inserted);
    assert!(map.insert("world".to_owned(), 3).inserted);
    assert_eq!(map.get_value(&"hello".to_owned()), Some(&1));

    let it = map.insert_or_assign("WORLD".to_owned(), 4).handle;
    assert_eq!(map.key(it), "world");
    assert_eq!(map.value(it), &4);
}

struct Tally<'a> {
    keys: &'a Cell<usize>,
    values: &'a Cell<usize>,
}

impl KeyOrder<u32> for Tally<'_> {
    fn compare(&self, lhs: &u32, rhs: &u32) -> Ordering { lhs.cmp(rhs) }
}

impl Release<u32, u32> for Tally<'_> {
    fn drop_key(&self, _: u32) { self.keys.set(self.keys.get() + 1) }
    fn drop_value(&self, _: u32) { self.values.set(self.values.get() + 1) }
}

#[test]
fn consumed_operands_are_released() {
    let keys = Cell::new(0);
    let values = Cell::new(0);
    let tally = || (keys.get(), values.get());

    let policy = || Tally { keys: &keys, values: &values };
    let mut map = TreapMap::with_policy(policy());
    for i in 0..10 {
        map.insert(i, i);
    }
    assert_eq!(tally(), (0, 0));

    map.insert(3, 0);
    assert_eq!(tally(), (1, 1));
    map.insert_or_assign(3, 30);
    assert_eq!(tally(), (2, 2));
    assert_eq!(map.get_value(&3), Some(&30));

    map.find_owned(4);
    assert_eq!(tally(), (3, 2));
    map.find_owned(100);
    assert_eq!(tally(), (4, 2));

    map.find_or_insert(5, 0);
    assert_eq!(tally(), (5, 3));
    map.find_or_insert(10, 10);
    assert_eq!(tally(), (5, 3));

    map.erase(map.find(&0));
    assert_eq!(tally(), (6, 4));
    assert_eq!(map.take(map.find(&1)), (1, 1));
    assert_eq!(map.remove(&2), Some((2, 2)));
    assert_eq!(tally(), (6, 4));

    // 3..=10
    assert_eq!(map.len(), 8);
    let mut other = TreapMap::with_policy(policy());
    other.insert(0, 0);
    other.swap(&mut map);
    other.clear();
    assert_eq!(tally(), (14, 12));
    drop(other);
    assert_eq!(tally(), (14, 12));
    drop(map);
    assert_eq!(tally(), (15, 13));
}
