// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to these traits rather than to
// concrete loaders or models, so an in-memory corpus can stand
// in for the JSONL files in tests.

use anyhow::Result;
use crate::domain::example::{Example, Label};

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Any component that yields labelled sentence pairs.
///
/// Implementations:
///   - SnliCorpus → a line-delimited JSON file, re-read on every call
///   - Vec<Example> → an already materialised split
pub trait ExampleSource {
    /// Load every example this source yields, in order.
    fn load_all(&self) -> Result<Vec<Example>>;
}

impl ExampleSource for Vec<Example> {
    fn load_all(&self) -> Result<Vec<Example>> {
        Ok(self.clone())
    }
}

// ─── PairClassifier ───────────────────────────────────────────────────────────
/// A class prediction together with the probability of every class,
/// indexed by `Label::index()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label:         Label,
    pub probabilities: [f32; crate::domain::example::LABEL_COUNT],
}

/// Any component that can classify a premise / hypothesis pair.
pub trait PairClassifier {
    fn classify(&self, premise: &str, hypothesis: &str) -> Result<Prediction>;
}
