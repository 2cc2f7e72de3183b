//! Priority source for randomized search trees.
//!
//! Only uniformity is needed, so this is a cheap xorshift-like mixer
//! rather than a statistically strong generator. Any other
//! [`RngCore`] can be used where a [`PriorityGen`] is expected.

use rand::{Error, RngCore, SeedableRng};

pub const DEFAULT_SEED: u64 = 123213;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriorityGen {
    seed: u64,
}

impl PriorityGen {
    pub fn new(seed: u64) -> Self { Self { seed } }

    pub fn next_priority(&mut self) -> u64 {
        let mut x = self.seed;
        x ^= (x << 2).wrapping_mul(1321);
        x ^= (x >> 5).wrapping_mul(2133);
        x = x.wrapping_add(13223);
        self.seed = x;
        x
    }
}

impl Default for PriorityGen {
    fn default() -> Self { Self::new(DEFAULT_SEED) }
}

impl RngCore for PriorityGen {
    fn next_u32(&mut self) -> u32 { (self.next_priority() >> 32) as u32 }
    fn next_u64(&mut self) -> u64 { self.next_priority() }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_priority().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for PriorityGen {
    type Seed = [u8; 8];
    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }
    fn seed_from_u64(state: u64) -> Self { Self::new(state) }
}

#[test]
fn known_sequence() {
    let mut rng = PriorityGen::new(0);
    let actual: Vec<_> = (0..5).map(|_| rng.next_u64()).collect();
    assert_eq!(
        actual,
        [
            13223,
            4592652336,
            1593731246273306,
            1838085070662687258,
            15983595100666082226,
        ]
    );
}

#[test]
fn deterministic() {
    let mut fst = PriorityGen::default();
    let mut snd = PriorityGen::seed_from_u64(DEFAULT_SEED);
    assert!((0..1000).all(|_| fst.next_u64() == snd.next_u64()));

    let mut thd = PriorityGen::from_seed(7_u64.to_le_bytes());
    let mut fth = PriorityGen::new(7);
    assert!((0..1000).all(|_| thd.next_u64() == fth.next_u64()));
}

#[test]
fn fill_bytes_tail() {
    let mut rng = PriorityGen::new(0);
    let mut buf = [0_u8; 11];
    rng.fill_bytes(&mut buf);
    assert_eq!(buf[..8], 13223_u64.to_le_bytes());
    assert_eq!(buf[8..], 4592652336_u64.to_le_bytes()[..3]);
}

#[test]
fn roughly_uniform() {
    // top 4 bits over many draws
    let mut rng = PriorityGen::default();
    let n = 1 << 16;
    let mut count = [0_usize; 16];
    for _ in 0..n {
        count[(rng.next_u64() >> 60) as usize] += 1;
    }
    for &c in &count {
        assert!(c >= n / 16 * 80 / 100, "{count:?}");
        assert!(c <= n / 16 * 120 / 100, "{count:?}");
    }
}
