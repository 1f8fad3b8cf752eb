use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::sequence::SequenceEncoder;
use crate::domain::example::{Example, Label};

/// One encoded sentence pair. Both rows are already padded to the
/// encoder's max_len, so items batch without further padding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NliItem {
    pub premise:    Vec<u32>,
    pub hypothesis: Vec<u32>,
    pub label:      Label,
}

impl NliItem {
    pub fn encode(example: &Example, encoder: &SequenceEncoder<'_>) -> Self {
        Self {
            premise:    encoder.encode(&example.premise),
            hypothesis: encoder.encode(&example.hypothesis),
            label:      example.label,
        }
    }
}

pub struct NliDataset {
    items: Vec<NliItem>,
}

impl NliDataset {
    pub fn new(items: Vec<NliItem>) -> Self { Self { items } }

    /// Encode a whole split against a frozen vocabulary.
    pub fn encode(examples: &[Example], encoder: &SequenceEncoder<'_>) -> Self {
        Self::new(examples.iter().map(|e| NliItem::encode(e, encoder)).collect())
    }

    pub fn item_count(&self) -> usize { self.items.len() }

    /// Items in order, `size` at a time (the last chunk may be shorter).
    pub fn batches(&self, size: usize) -> impl Iterator<Item = Vec<NliItem>> + '_ {
        self.items.chunks(size.max(1)).map(<[NliItem]>::to_vec)
    }

    /// How many items carry each label, indexed by `Label::index()`.
    pub fn label_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for item in &self.items {
            counts[item.label.index()] += 1;
        }
        counts
    }
}

impl Dataset<NliItem> for NliDataset {
    fn get(&self, index: usize) -> Option<NliItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
