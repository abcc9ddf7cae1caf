//! Word lists used for fragment-based query terms

use crate::config::CorpusConfig;
use crate::Result;
use std::path::Path;

const BUILTIN_NAMES: &[&str] = &[
    "aaliyah", "abigail", "adrian", "aiden", "alejandro", "alexander", "amara", "amelia",
    "anders", "angelo", "annika", "antonio", "aria", "arjun", "astrid", "beatrice", "benedict",
    "bianca", "camila", "carmen", "cassius", "cecilia", "chiara", "dante", "delphine", "dmitri",
    "eleanor", "elias", "emeka", "esperanza", "fatima", "felix", "francesca", "gabriel",
    "giovanni", "greta", "harriet", "hiroshi", "ingrid", "isadora", "jasper", "josephine",
    "kaito", "katarina", "leandro", "leonora", "lucinda", "magnus", "marguerite", "matteo",
    "mireille", "nadia", "natalia", "nikolai", "octavia", "oluwaseun", "ophelia", "priya",
    "raphael", "rosalind", "sebastian", "seraphina", "sigrid", "soren", "tatiana", "theodore",
    "valentina", "wilhelmina", "ximena", "yusuf", "zara", "zoltan",
];

const BUILTIN_WORDS: &[&str] = &[
    "about", "afternoon", "against", "always", "animal", "answer", "beautiful", "because",
    "between", "brother", "building", "century", "children", "country", "dancing", "daylight",
    "different", "dreaming", "electric", "evening", "everything", "example", "family", "feeling",
    "flower", "forever", "freedom", "garden", "golden", "government", "happiness", "heavenly",
    "history", "holiday", "important", "island", "journey", "kingdom", "language", "letters",
    "library", "lightning", "machine", "midnight", "morning", "mountain", "national", "nothing",
    "number", "ocean", "outside", "paradise", "people", "picture", "problem", "question",
    "rainbow", "remember", "river", "running", "season", "shadow", "silver", "something",
    "station", "stranger", "summer", "sunshine", "system", "thunder", "together", "tonight",
    "travel", "trouble", "under", "universe", "village", "wandering", "weather", "window",
    "winter", "without", "wonderful", "yesterday", "yellow", "young",
];

/// Name and word lists that query fragments are cut from
#[derive(Debug, Clone)]
pub struct Corpus {
    pub names: Vec<String>,
    pub words: Vec<String>,
}

impl Corpus {
    /// The lists compiled into the binary
    pub fn builtin() -> Self {
        Self {
            names: BUILTIN_NAMES.iter().map(|s| s.to_string()).collect(),
            words: BUILTIN_WORDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Loads the configured lists, falling back to the built-in ones
    ///
    /// # Arguments
    ///
    /// * `config` - Corpus configuration with optional list paths
    ///
    /// # Returns
    ///
    /// * `Ok(Corpus)` - Lists loaded (or built-in lists for unset paths)
    /// * `Err(DiscoveryError::Io)` - A configured file could not be read
    pub fn load(config: &CorpusConfig) -> Result<Self> {
        let mut corpus = Self::builtin();

        if let Some(path) = &config.names_path {
            corpus.names = read_word_list(Path::new(path))?;
            tracing::info!("Loaded {} names from {}", corpus.names.len(), path);
        }

        if let Some(path) = &config.words_path {
            corpus.words = read_word_list(Path::new(path))?;
            tracing::info!("Loaded {} words from {}", corpus.words.len(), path);
        }

        Ok(corpus)
    }
}

/// Reads a newline-separated list, skipping blank lines
fn read_word_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_word_list(&content))
}

pub fn parse_word_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
