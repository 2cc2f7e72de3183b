use std::ops::Range;

use rand::{
    distributions::{Distribution, Uniform},
    seq::SliceRandom,
    Rng,
};

pub trait Gen {
    type Output;
    fn generate<R: Rng>(&self, rng: &mut R) -> Self::Output;
}

/// `len` distinct values from `bound`, in random order.
pub struct Distinct<B> {
    pub bound: B,
    pub len: usize,
}

/// A random workload for an ordered map keyed by `i32`.
pub struct Queries {
    pub keys: Range<i32>,
    pub len: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Query {
    Insert(i32, u32),
    Assign(i32, u32),
    Erase(i32),
    Find(i32),
    LowerBound(i32),
    UpperBound(i32),
}

impl Gen for Range<i32> {
    type Output = i32;
    fn generate<R: Rng>(&self, rng: &mut R) -> Self::Output {
        let between = Uniform::from(self.clone());
        between.sample(rng)
    }
}

impl Gen for Distinct<Range<i32>> {
    type Output = Vec<i32>;
    fn generate<R: Rng>(&self, rng: &mut R) -> Self::Output {
        let Self { bound: Range { start, end }, len } = self;
        assert!(*len <= (end - start) as usize);
        let mut all: Vec<_> = (*start..*end).collect();
        let (res, _) = all.partial_shuffle(rng, *len);
        res.to_vec()
    }
}

impl Gen for Queries {
    type Output = Vec<Query>;
    fn generate<R: Rng>(&self, rng: &mut R) -> Self::Output {
        // inserts outweigh erases so that the map grows over time
        (0..self.len)
            .map(|_| {
                let key = self.keys.generate(rng);
                match rng.gen_range(0..10) {
                    0..=3 => Query::Insert(key, rng.gen()),
                    4 => Query::Assign(key, rng.gen()),
                    5 | 6 => Query::Erase(key),
                    7 => Query::Find(key),
                    8 => Query::LowerBound(key),
                    _ => Query::UpperBound(key),
                }
            })
            .collect()
    }
}
