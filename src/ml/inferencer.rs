// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Classifies a single premise / hypothesis pair with the weights
// of a finished run.
//
//   train_config.json ─► rebuild model ◄─ model.mpk
//   vocab.json        ─► SequenceEncoder (same max_len as training)
//
// Inputs may be plain sentences or SNLI binary parses; a parse is
// flattened the same way the corpus loader does it. Tokens are
// split on whitespace, so punctuation only matches the vocabulary
// when written as its own token ("sleeping ." not "sleeping.").

use anyhow::{Context, Result};
use burn::{prelude::*, tensor::activation::softmax};

use crate::data::{parser::sentence_text, sequence::SequenceEncoder, vocabulary::Vocabulary};
use crate::domain::{
    example::{Label, LABEL_COUNT},
    traits::{PairClassifier, Prediction},
};
use crate::infra::checkpoint::RunStore;
use crate::ml::model::NliModel;

pub struct Inferencer<B: Backend> {
    model:   NliModel<B>,
    vocab:   Vocabulary,
    max_len: usize,
    device:  B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: NliModel<B>, vocab: Vocabulary, max_len: usize, device: B::Device) -> Self {
        Self { model, vocab, max_len, device }
    }

    /// Rebuild the model described by the run's config and load its weights.
    pub fn from_run(store: &RunStore, device: B::Device) -> Result<Self> {
        let cfg       = store.load_config()?;
        let vocab     = store.load_vocabulary()?;
        let model_cfg = cfg.model_config(vocab.size());
        let model     = store.load_model(model_cfg.init::<B>(&device), &device)?;
        tracing::info!(
            "Model loaded from '{}' ({} vocabulary tokens, encoder={})",
            store.dir().display(),
            vocab.token_count(),
            cfg.encoder,
        );
        Ok(Self::new(model, vocab, cfg.max_len, device))
    }

    fn encode(&self, sentence: &str) -> Tensor<B, 2, Int> {
        let text = normalize(sentence);
        let ids: Vec<i32> = SequenceEncoder::new(&self.vocab, self.max_len)
            .encode(&text)
            .into_iter()
            .map(|id| id as i32)
            .collect();
        if ids.iter().all(|&id| id == 0) {
            tracing::warn!("No known tokens in '{}'", sentence);
        }
        Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device).reshape([1, self.max_len])
    }
}

impl<B: Backend> PairClassifier for Inferencer<B> {
    fn classify(&self, premise: &str, hypothesis: &str) -> Result<Prediction> {
        let logits = self.model.forward(self.encode(premise), self.encode(hypothesis));
        let probs: Vec<f32> = softmax(logits, 1)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read probabilities: {e:?}"))?;

        let mut probabilities = [0.0f32; LABEL_COUNT];
        probabilities.copy_from_slice(&probs[..LABEL_COUNT]);

        let best = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or_default();
        let label = Label::from_index(best).context("Predicted class out of range")?;

        tracing::debug!("Probabilities {:?} → {}", probabilities, label);
        Ok(Prediction { label, probabilities })
    }
}

/// Space-joined tokens; binary parses are flattened first.
fn normalize(sentence: &str) -> String {
    let trimmed = sentence.trim();
    if trimmed.starts_with('(') {
        sentence_text(trimmed)
    } else {
        trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
