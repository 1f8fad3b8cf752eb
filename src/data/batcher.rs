// ============================================================
// Layer 4 — NLI Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<NliItem> into
// tensors for one forward pass.
//
//   Input:  N items, each with two rows of max_len indices
//   Output: premise / hypothesis  [N, max_len]  (Int)
//           labels                [N]          (Int, class index)
//           targets               [N, 3]       (Float, one-hot)
//
// Rows are pre-padded by the sequence encoder, so stacking is a
// flatten followed by a reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::NliItem;
use crate::domain::example::LABEL_COUNT;

/// A batch of encoded sentence pairs ready for the model.
#[derive(Debug, Clone)]
pub struct NliBatch<B: Backend> {
    /// Premise indices — shape: [batch_size, max_len]
    pub premise: Tensor<B, 2, Int>,

    /// Hypothesis indices — shape: [batch_size, max_len]
    pub hypothesis: Tensor<B, 2, Int>,

    /// Class index per pair — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,

    /// One-hot labels for categorical cross-entropy — shape: [batch_size, 3]
    pub targets: Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct NliBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> NliBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<NliItem, NliBatch<B>> for NliBatcher<B> {
    fn batch(&self, items: Vec<NliItem>) -> NliBatch<B> {
        let batch_size = items.len();
        let seq_len    = items[0].premise.len();

        let premise_flat: Vec<i32> = items
            .iter()
            .flat_map(|item| item.premise.iter().map(|&x| x as i32))
            .collect();

        let hypothesis_flat: Vec<i32> = items
            .iter()
            .flat_map(|item| item.hypothesis.iter().map(|&x| x as i32))
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|item| item.label.index() as i32)
            .collect();

        let one_hot: Vec<f32> = items
            .iter()
            .flat_map(|item| item.label.one_hot())
            .collect();

        let premise = Tensor::<B, 1, Int>::from_ints(
            premise_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let hypothesis = Tensor::<B, 1, Int>::from_ints(
            hypothesis_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        let targets = Tensor::<B, 1>::from_floats(
            one_hot.as_slice(), &self.device
        ).reshape([batch_size, LABEL_COUNT]);

        NliBatch { premise, hypothesis, labels, targets }
    }
}
