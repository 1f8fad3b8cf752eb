// ============================================================
// Layer 5 — Sentence-Pair Classifier
// ============================================================
// premise ids ─┐                                   ┌─ premise vector ─┐
//              ├─ Embedding → Linear+act → Encoder ┤                  ├─ concat ─┐
// hypothesis ──┘   (one set of weights, run twice) └─ hypothesis vec ─┘          │
//                                                                                 ▼
//            dropout → 3 × [Linear(2h) → act → dropout → (batch norm)] → Linear(3)
//
// The embedding, the token projection and the sentence encoder
// exist once in the module tree and are applied to both inputs;
// there is no way to build this model with per-branch copies.
//
// Loss is categorical cross-entropy against the one-hot targets
// plus an L2 penalty on the kernels of the three hidden layers.

use anyhow::{ensure, Result};
use burn::{
    module::{Ignored, Param},
    nn::{
        BatchNorm, BatchNormConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{log_softmax, softmax},
};

use crate::domain::example::LABEL_COUNT;
use crate::domain::settings::{Activation, DropoutKind, EncoderKind};
use crate::infra::embedding_store::EmbeddingMatrix;
use crate::ml::encoder::{SentenceEncoder, SentenceEncoderConfig};
use crate::ml::layers::{activate, ClassifierDropout};

/// Depth of the fully connected stack on top of the fused sentence vectors.
pub const CLASSIFIER_DEPTH: usize = 3;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct NliModelConfig {
    pub vocab_size:   usize,
    pub encoder:      EncoderKind,
    pub activation:   Activation,
    pub dropout_kind: DropoutKind,
    #[config(default = 300)]
    pub embed_size:   usize,
    #[config(default = 300)]
    pub hidden_size:  usize,
    #[config(default = 1)]
    pub layers:       usize,
    #[config(default = 0.2)]
    pub dropout:      f64,
    #[config(default = 4e-6)]
    pub l2:           f64,
    #[config(default = false)]
    pub batch_norm:   bool,
    /// Only consulted when pretrained vectors are supplied; a randomly
    /// initialised embedding is always trained.
    #[config(default = false)]
    pub train_embed:  bool,
}

impl NliModelConfig {
    /// Model with a randomly initialised, trainable embedding.
    pub fn init<B: Backend>(&self, device: &B::Device) -> NliModel<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embed_size).init(device);
        self.assemble(embedding, device)
    }

    /// Model whose embedding table is the given pretrained matrix,
    /// frozen unless `train_embed` is set.
    pub fn init_with_embeddings<B: Backend>(
        &self,
        matrix: &EmbeddingMatrix,
        device: &B::Device,
    ) -> Result<NliModel<B>> {
        ensure!(
            (matrix.rows(), matrix.dim()) == (self.vocab_size, self.embed_size),
            "Embedding matrix is {}x{} but the model needs {}x{}",
            matrix.rows(), matrix.dim(), self.vocab_size, self.embed_size,
        );
        let weights = Tensor::<B, 1>::from_floats(matrix.values(), device)
            .reshape([matrix.rows(), matrix.dim()]);

        let mut embedding = EmbeddingConfig::new(self.vocab_size, self.embed_size).init(device);
        embedding.weight  = Param::from_tensor(weights);
        let embedding = if self.train_embed { embedding } else { embedding.no_grad() };

        Ok(self.assemble(embedding, device))
    }

    fn assemble<B: Backend>(&self, embedding: Embedding<B>, device: &B::Device) -> NliModel<B> {
        let translate = LinearConfig::new(self.embed_size, self.hidden_size).init(device);

        let encoder_cfg = SentenceEncoderConfig::new(self.encoder, self.hidden_size, self.hidden_size)
            .with_layers(self.layers)
            .with_batch_norm(self.batch_norm)
            .with_dropout(self.dropout);
        let sentence_size = encoder_cfg.output_size();
        let encoder       = encoder_cfg.init(device);

        let branch_norm = || self.batch_norm.then(|| BatchNormConfig::new(sentence_size).init(device));

        let joint_size = 2 * self.hidden_size;
        let mut hidden       = Vec::with_capacity(CLASSIFIER_DEPTH);
        let mut hidden_norms = Vec::new();
        let mut d_input      = 2 * sentence_size;
        for _ in 0..CLASSIFIER_DEPTH {
            hidden.push(LinearConfig::new(d_input, joint_size).init(device));
            if self.batch_norm {
                hidden_norms.push(BatchNormConfig::new(joint_size).init(device));
            }
            d_input = joint_size;
        }

        NliModel {
            embedding,
            translate,
            encoder,
            premise_norm:    branch_norm(),
            hypothesis_norm: branch_norm(),
            hidden,
            hidden_norms,
            output:     LinearConfig::new(joint_size, LABEL_COUNT).init(device),
            dropout:    ClassifierDropout::new(self.dropout_kind, self.dropout),
            activation: Ignored(self.activation),
            l2:         self.l2,
        }
    }
}

#[derive(Module, Debug)]
pub struct NliModel<B: Backend> {
    pub embedding:       Embedding<B>,
    pub translate:       Linear<B>,
    pub encoder:         SentenceEncoder<B>,
    pub premise_norm:    Option<BatchNorm<B, 0>>,
    pub hypothesis_norm: Option<BatchNorm<B, 0>>,
    pub hidden:          Vec<Linear<B>>,
    pub hidden_norms:    Vec<BatchNorm<B, 0>>,
    pub output:          Linear<B>,
    pub dropout:         ClassifierDropout,
    pub activation:      Ignored<Activation>,
    pub l2:              f64,
}

impl<B: Backend> NliModel<B> {
    /// ids: [batch, seq_len] → sentence vectors [batch, sentence_size]
    pub fn encode_sentence(&self, ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let tokens    = self.embedding.forward(ids);
        let projected = activate(*self.activation, self.translate.forward(tokens));
        self.encoder.forward(projected)
    }

    /// premise, hypothesis: [batch, seq_len] → logits [batch, 3]
    pub fn forward(&self, premise: Tensor<B, 2, Int>, hypothesis: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let mut premise    = self.encode_sentence(premise);
        let mut hypothesis = self.encode_sentence(hypothesis);

        if let (Some(p_norm), Some(h_norm)) = (&self.premise_norm, &self.hypothesis_norm) {
            premise    = p_norm.forward(premise);
            hypothesis = h_norm.forward(hypothesis);
        }

        let mut joint = self.dropout.forward(Tensor::cat(vec![premise, hypothesis], 1));
        for (i, layer) in self.hidden.iter().enumerate() {
            joint = self.dropout.forward(activate(*self.activation, layer.forward(joint)));
            if let Some(norm) = self.hidden_norms.get(i) {
                joint = norm.forward(joint);
            }
        }
        self.output.forward(joint)
    }

    /// Class probabilities [batch, 3]
    pub fn probabilities(&self, premise: Tensor<B, 2, Int>, hypothesis: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        softmax(self.forward(premise, hypothesis), 1)
    }

    /// l2 · Σ w² over the hidden classifier kernels; None when l2 is 0.
    pub fn weight_penalty(&self) -> Option<Tensor<B, 1>> {
        if self.l2 == 0.0 {
            return None;
        }
        self.hidden
            .iter()
            .map(|layer| layer.weight.val().powf_scalar(2.0).sum())
            .reduce(|a, b| a + b)
            .map(|total| total.mul_scalar(self.l2))
    }

    /// Returns (loss, logits). Loss includes the weight penalty.
    pub fn forward_loss(
        &self,
        premise:    Tensor<B, 2, Int>,
        hypothesis: Tensor<B, 2, Int>,
        targets:    Tensor<B, 2>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(premise, hypothesis);
        let loss   = categorical_cross_entropy(logits.clone(), targets);
        let loss   = match self.weight_penalty() {
            Some(penalty) => loss + penalty,
            None          => loss,
        };
        (loss, logits)
    }
}

/// Mean over the batch of -Σ target · log softmax(logits)
pub fn categorical_cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    log_softmax(logits, 1)
        .mul(targets)
        .sum_dim(1)
        .mean()
        .neg()
}
