// ============================================================
// Layer 3 — Example Domain Type
// ============================================================
// One SNLI record after parsing: a gold label plus the premise
// and hypothesis as space-joined token strings.
//
// The label set is closed. Records whose annotators reached no
// majority carry the gold label "-" and never become an Example.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of output classes of the classifier.
pub const LABEL_COUNT: usize = 3;

/// The three NLI classes with their fixed class indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Contradiction,
    Neutral,
    Entailment,
}

impl Label {
    /// All labels ordered by class index.
    pub const ALL: [Label; LABEL_COUNT] = [Label::Contradiction, Label::Neutral, Label::Entailment];

    /// Gold label string used by the "no majority" records.
    pub const NO_MAJORITY: &'static str = "-";

    /// Parse the `gold_label` field of an SNLI record.
    /// Returns None for "-" and anything else outside the label set.
    pub fn from_gold(gold: &str) -> Option<Self> {
        match gold {
            "contradiction" => Some(Label::Contradiction),
            "neutral"       => Some(Label::Neutral),
            "entailment"    => Some(Label::Entailment),
            _               => None,
        }
    }

    /// Class index: contradiction=0, neutral=1, entailment=2
    pub fn index(self) -> usize {
        match self {
            Label::Contradiction => 0,
            Label::Neutral       => 1,
            Label::Entailment    => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// One-hot row for this label, as consumed by categorical cross-entropy.
    pub fn one_hot(self) -> [f32; LABEL_COUNT] {
        let mut row = [0.0; LABEL_COUNT];
        row[self.index()] = 1.0;
        row
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Contradiction => "contradiction",
            Label::Neutral       => "neutral",
            Label::Entailment    => "entailment",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labelled sentence pair. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub label:      Label,
    pub premise:    String,
    pub hypothesis: String,
}

impl Example {
    pub fn new(label: Label, premise: impl Into<String>, hypothesis: impl Into<String>) -> Self {
        Self {
            label,
            premise:    premise.into(),
            hypothesis: hypothesis.into(),
        }
    }

    /// Word counts of (premise, hypothesis)
    pub fn word_counts(&self) -> (usize, usize) {
        (
            self.premise.split_whitespace().count(),
            self.hypothesis.split_whitespace().count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gold_labels_map_to_fixed_indices() {
        assert_eq!(Label::from_gold("contradiction").map(Label::index), Some(0));
        assert_eq!(Label::from_gold("neutral").map(Label::index), Some(1));
        assert_eq!(Label::from_gold("entailment").map(Label::index), Some(2));
    }

    #[test]
    fn test_no_majority_is_not_a_label() {
        assert_eq!(Label::from_gold(Label::NO_MAJORITY), None);
        assert_eq!(Label::from_gold("Entailment"), None);
    }

    #[test]
    fn test_index_round_trips() {
        for label in Label::ALL {
            assert_eq!(Label::from_index(label.index()), Some(label));
        }
        assert_eq!(Label::from_index(3), None);
    }

    #[test]
    fn test_one_hot_has_single_hot_entry() {
        assert_eq!(Label::Neutral.one_hot(), [0.0, 1.0, 0.0]);
        assert_eq!(Label::Entailment.one_hot().iter().sum::<f32>(), 1.0);
    }
}
