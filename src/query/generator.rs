use crate::query::corpus::Corpus;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// The ways a query term can be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermStrategy {
    /// Random letters of the requested length
    Letters,
    /// A window cut from a random name
    NameFragment,
    /// A window cut from a random common word
    WordFragment,
}

/// Strategies in rotation order
const ROTATION: [TermStrategy; 3] = [
    TermStrategy::Letters,
    TermStrategy::NameFragment,
    TermStrategy::WordFragment,
];

/// Produces pseudo-random search terms
///
/// Consecutive calls rotate through the strategies so no single one biases
/// the results. The rotation counter and the RNG are the only state.
pub struct QueryTermGenerator {
    corpus: Corpus,
    rng: StdRng,
    index: usize,
}

impl QueryTermGenerator {
    /// Creates a generator seeded from the operating system
    pub fn new(corpus: Corpus) -> Self {
        Self::with_rng(corpus, StdRng::from_os_rng())
    }

    /// Creates a deterministic generator
    pub fn with_seed(corpus: Corpus, seed: u64) -> Self {
        Self::with_rng(corpus, StdRng::seed_from_u64(seed))
    }

    fn with_rng(corpus: Corpus, rng: StdRng) -> Self {
        Self {
            corpus,
            rng,
            index: 0,
        }
    }

    /// Advances the rotation and returns the strategy for the next term
    fn next_strategy(&mut self) -> TermStrategy {
        self.index = (self.index + 1) % ROTATION.len();
        ROTATION[self.index]
    }

    /// Generates the next search term
    ///
    /// A `length` of 0 is treated as 1. Fragment strategies return whole
    /// entries that are already short enough.
    pub fn next(&mut self, length: u32) -> String {
        let length = length.max(1) as usize;

        match self.next_strategy() {
            TermStrategy::Letters => self.random_letters(length),
            TermStrategy::NameFragment => self.fragment_of(Source::Names, length),
            TermStrategy::WordFragment => self.fragment_of(Source::Words, length),
        }
    }

    fn random_letters(&mut self, length: usize) -> String {
        (0..length)
            .map(|_| ALPHABET[self.rng.random_range(0..ALPHABET.len())] as char)
            .collect()
    }

    fn fragment_of(&mut self, source: Source, length: usize) -> String {
        let list = match source {
            Source::Names => &self.corpus.names,
            Source::Words => &self.corpus.words,
        };

        let Some(entry) = list.choose(&mut self.rng) else {
            return self.random_letters(length);
        };

        fragment(entry, length, &mut self.rng)
    }
}

#[derive(Clone, Copy)]
enum Source {
    Names,
    Words,
}

/// Cuts a random window of `length` chars out of `entry`
fn fragment<R: Rng + ?Sized>(entry: &str, length: usize, rng: &mut R) -> String {
    let chars: Vec<char> = entry.chars().collect();
    if chars.len() <= length {
        return entry.to_string();
    }

    let start = rng.random_range(0..=chars.len() - length);
    chars[start..start + length].iter().collect()
}
