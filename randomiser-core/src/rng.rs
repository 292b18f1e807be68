use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Constant mixed into the primary seed to derive the act-shuffle stream.
/// XOR is its own inverse, so the primary seed can always be recovered.
pub const ACT_STREAM_XOR: u32 = 0xDEAD_BEEF;

/// A resolved run seed. Stored as the signed 32-bit value users see in
/// spoiler output and file names.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Seed(pub i32);

impl Seed {
    pub fn value(self) -> i32 {
        self.0
    }

    /// Seed for the act permutation stream. Independent of the primary
    /// stream so toggling act shuffle never moves a skill.
    pub fn act_stream(self) -> Seed {
        Seed((self.0 as u32 ^ ACT_STREAM_XOR) as i32)
    }

    /// Integer input wraps into 32 bits the same way the text path does.
    pub fn from_integer(value: i64) -> Seed {
        Seed(value as i32)
    }

    /// Text seeds: integer-looking text is taken as the integer, anything
    /// else is hashed.
    pub fn from_text(text: &str) -> Seed {
        let trimmed = text.trim();
        match trimmed.parse::<i64>() {
            Ok(n) => Seed::from_integer(n),
            Err(_) => Seed(hash_text(trimmed)),
        }
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order-dependent, non-cryptographic string hash (`h = h * 31 + c` over
/// UTF-16 code units, wrapping in 32 bits).
pub fn hash_text(text: &str) -> i32 {
    let mut hash: i32 = 0;
    for unit in text.encode_utf16() {
        hash = (hash << 5).wrapping_sub(hash).wrapping_add(unit as i32);
    }
    hash
}

/// Mulberry32: small, fast, deterministic on every platform.
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: Seed) -> Self {
        Self {
            state: seed.0 as u32,
        }
    }

    fn step(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let s = self.state;
        let mut t = (s ^ (s >> 15)).wrapping_mul(1 | s);
        t = t.wrapping_add((t ^ (t >> 7)).wrapping_mul(61 | t)) ^ t;
        t ^ (t >> 14)
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.step() as f64 / 4_294_967_296.0
    }

    /// Uniform integer in `min..=max`.
    pub fn rand_int(&mut self, min: usize, max: usize) -> usize {
        debug_assert!(min <= max);
        let span = (max - min + 1) as f64;
        min + (self.next_f64() * span).floor() as usize
    }

    /// Fisher–Yates, top index down. Shuffles in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        if items.len() < 2 {
            return;
        }
        for i in (1..items.len()).rev() {
            let j = (self.next_f64() * (i + 1) as f64).floor() as usize;
            items.swap(i, j);
        }
    }

    /// Shuffled copy, leaving the input untouched.
    pub fn shuffled<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut out = items.to_vec();
        self.shuffle(&mut out);
        out
    }
}

impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.step() as u64;
        let lo = self.step() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
