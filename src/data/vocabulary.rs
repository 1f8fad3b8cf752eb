// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Maps every token seen in the training text to a dense index.
//
//   index 0      → reserved (padding), never assigned to a token
//   index 1..=N  → tokens, most frequent first
//
// Tokens are the pieces of a text split on single spaces; case is
// kept and no characters are filtered, since the corpus texts are
// already tokenised by the SNLI parser.
//
// Ties in frequency keep first-occurrence order, so fitting the
// same texts in the same order always gives the same indices.
//
// Built once from the training split and frozen; validation and
// test text is encoded against it and unseen tokens stay unmapped.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index reserved for padding. No token ever maps to it.
pub const PAD_INDEX: u32 = 0;

/// Split a text into vocabulary tokens.
pub fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(' ').filter(|t| !t.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "VocabularyFile", into = "VocabularyFile")]
pub struct Vocabulary {
    /// words[i] has index i + 1
    words: Vec<String>,
    index: HashMap<String, u32>,
}

/// On-disk form: the token list in index order.
#[derive(Serialize, Deserialize)]
struct VocabularyFile {
    words: Vec<String>,
}

impl From<VocabularyFile> for Vocabulary {
    fn from(file: VocabularyFile) -> Self {
        Self::from_words(file.words)
    }
}

impl From<Vocabulary> for VocabularyFile {
    fn from(vocab: Vocabulary) -> Self {
        Self { words: vocab.words }
    }
}

impl Vocabulary {
    /// Fit a vocabulary over `texts`, ranking tokens by frequency.
    pub fn fit<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        // Counts in first-occurrence order
        let mut counts: Vec<(&str, usize)> = Vec::new();
        let mut seen:   HashMap<&str, usize> = HashMap::new();

        for text in texts {
            for token in tokens(text) {
                let slot = *seen.entry(token).or_insert_with(|| {
                    counts.push((token, 0));
                    counts.len() - 1
                });
                counts[slot].1 += 1;
            }
        }

        // sort_by is stable: equal counts keep first-occurrence order
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        Self::from_words(counts.into_iter().map(|(w, _)| w.to_owned()).collect())
    }

    /// Rebuild a vocabulary from its token list (index order).
    pub fn from_words(words: Vec<String>) -> Self {
        let index = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u32 + 1))
            .collect();
        Self { words, index }
    }

    /// Index of a token, None when the token was never seen in training.
    pub fn get(&self, token: &str) -> Option<u32> {
        self.index.get(token).copied()
    }

    /// Token at a given index. Index 0 has no token.
    #[cfg(test)]
    pub fn token(&self, index: u32) -> Option<&str> {
        let slot = (index as usize).checked_sub(1)?;
        self.words.get(slot).map(String::as_str)
    }

    /// Number of distinct tokens.
    pub fn token_count(&self) -> usize {
        self.words.len()
    }

    /// Rows needed in an embedding table: tokens plus the reserved index 0.
    pub fn size(&self) -> usize {
        self.words.len() + 1
    }

    /// (token, index) pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.words.iter().enumerate().map(|(i, w)| (w.as_str(), i as u32 + 1))
    }
}
