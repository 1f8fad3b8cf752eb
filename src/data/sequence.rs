// ============================================================
// Layer 4 — Sequence Encoder
// ============================================================
// Turns a text into a fixed-length row of vocabulary indices.
//
//   1. Split the text into tokens and look each one up.
//      Tokens missing from the vocabulary are dropped, they do
//      not get an "unknown" slot.
//   2. Fit the row to `max_len`:
//        shorter → left-pad with PAD_INDEX (0)
//        longer  → drop tokens from the front, keep the last max_len
//
// Example with max_len = 5:
//   [7, 3, 9]           → [0, 0, 7, 3, 9]
//   [1, 2, 3, 4, 5, 6]  → [2, 3, 4, 5, 6]
//
// Every row has exactly max_len entries, so a split becomes a
// rectangular (examples × max_len) matrix.

use crate::data::vocabulary::{tokens, Vocabulary, PAD_INDEX};

/// Length every sentence is padded or truncated to.
pub const DEFAULT_MAX_LEN: usize = 42;

#[derive(Debug, Clone, Copy)]
pub struct SequenceEncoder<'a> {
    vocab:   &'a Vocabulary,
    max_len: usize,
}

impl<'a> SequenceEncoder<'a> {
    pub fn new(vocab: &'a Vocabulary, max_len: usize) -> Self {
        Self { vocab, max_len }
    }

    /// Known-token indices of a text, in order, without padding.
    pub fn indices(&self, text: &str) -> Vec<u32> {
        tokens(text).filter_map(|t| self.vocab.get(t)).collect()
    }

    /// Encode one text into a row of exactly `max_len` indices.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        let ids  = self.indices(text);
        let keep = ids.len().min(self.max_len);

        let mut row = vec![PAD_INDEX; self.max_len - keep];
        row.extend_from_slice(&ids[ids.len() - keep..]);
        row
    }

    /// Encode many texts into rows of equal length.
    #[cfg(test)]
    pub fn encode_all<'t>(&self, texts: impl IntoIterator<Item = &'t str>) -> Vec<Vec<u32>> {
        texts.into_iter().map(|t| self.encode(t)).collect()
    }
}
