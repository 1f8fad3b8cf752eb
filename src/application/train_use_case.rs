// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run, in order:
//
//   Step 1: Load train / dev / test splits   (Layer 4 - data)
//   Step 2: Fit the vocabulary on train      (Layer 4 - data)
//   Step 3: Encode every split               (Layer 4 - data)
//   Step 4: Load or build the embeddings     (Layer 6 - infra)
//   Step 5: Save config and vocabulary       (Layer 6 - infra)
//   Step 6: Run training + test evaluation   (Layer 5 - ml)
//
// The vocabulary sees only training text, premises first and
// then hypotheses; dev and test are encoded against it.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::{
    dataset::NliDataset,
    loader::SnliCorpus,
    sequence::{SequenceEncoder, DEFAULT_MAX_LEN},
    vocabulary::Vocabulary,
};
use crate::domain::{
    example::Example,
    settings::{Activation, DropoutKind, EncoderKind, OptimizerKind},
    traits::ExampleSource,
};
use crate::infra::{
    checkpoint::RunStore,
    embedding_store::{EmbeddingMatrix, EmbeddingStore, DEFAULT_CACHE_FILE, DEFAULT_VECTORS_FILE},
};
use crate::ml::{
    model::NliModelConfig,
    trainer::{self, Splits, TrainingOutcome},
};

// ─── Experiment Configuration ────────────────────────────────────────────────
// Every setting of a run. Built once from the command line and
// saved next to the run's outputs so `predict` can rebuild the
// exact same model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub train_path:      PathBuf,
    pub dev_path:        PathBuf,
    pub test_path:       PathBuf,
    pub vectors_path:    PathBuf,
    pub embedding_cache: PathBuf,
    pub output_dir:      PathBuf,

    /// Initialise the embedding from pretrained vectors
    pub use_glove:    bool,
    /// Keep updating the pretrained embedding during training
    pub train_embed:  bool,
    pub encoder:      EncoderKind,
    pub layers:       usize,
    pub embed_size:   usize,
    pub hidden_size:  usize,
    pub activation:   Activation,
    pub optimizer:    OptimizerKind,
    pub dropout_kind: DropoutKind,
    pub dropout:      f64,
    pub l2:           f64,
    pub batch_norm:   bool,

    pub batch_size:    usize,
    pub max_epochs:    usize,
    pub max_len:       usize,
    /// Falls back to the optimizer's default when None
    pub learning_rate: Option<f64>,
    /// Early stopping is off when None
    pub patience:      Option<usize>,
    /// Per-split record limit; N reads N + 1 lines
    pub limit:         Option<usize>,
    pub seed:          u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            train_path:      "snli_1.0_train.jsonl".into(),
            dev_path:        "snli_1.0_dev.jsonl".into(),
            test_path:       "snli_1.0_test.jsonl".into(),
            vectors_path:    DEFAULT_VECTORS_FILE.into(),
            embedding_cache: DEFAULT_CACHE_FILE.into(),
            output_dir:      "runs".into(),
            use_glove:       true,
            train_embed:     false,
            encoder:         EncoderKind::Summation,
            layers:          1,
            embed_size:      300,
            hidden_size:     300,
            activation:      Activation::Relu,
            optimizer:       OptimizerKind::Adam,
            dropout_kind:    DropoutKind::Standard,
            dropout:         0.2,
            l2:              4e-6,
            batch_norm:      false,
            batch_size:      512,
            max_epochs:      42,
            max_len:         DEFAULT_MAX_LEN,
            learning_rate:   None,
            patience:        None,
            limit:           None,
            seed:            1337,
        }
    }
}

impl ExperimentConfig {
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate.unwrap_or_else(|| self.optimizer.default_learning_rate())
    }

    /// Model hyperparameters for a vocabulary of `vocab_size` rows.
    pub fn model_config(&self, vocab_size: usize) -> NliModelConfig {
        NliModelConfig::new(vocab_size, self.encoder, self.activation, self.dropout_kind)
            .with_embed_size(self.embed_size)
            .with_hidden_size(self.hidden_size)
            .with_layers(self.layers)
            .with_dropout(self.dropout)
            .with_l2(self.l2)
            .with_batch_norm(self.batch_norm)
            .with_train_embed(self.train_embed)
    }

    fn corpus(&self, path: &Path) -> SnliCorpus {
        SnliCorpus::new(path).with_limit(self.limit)
    }
}

/// Vocabulary over all training premises followed by all training hypotheses.
pub fn fit_vocabulary(train: &[Example]) -> Vocabulary {
    Vocabulary::fit(
        train.iter().map(|e| e.premise.as_str())
            .chain(train.iter().map(|e| e.hypothesis.as_str())),
    )
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: ExperimentConfig,
}

impl TrainUseCase {
    pub fn new(config: ExperimentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Execute the full pipeline on the SNLI files named in the config.
    pub fn execute(&self) -> Result<TrainingOutcome> {
        let cfg = &self.config;
        self.execute_with(
            &cfg.corpus(&cfg.train_path),
            &cfg.corpus(&cfg.dev_path),
            &cfg.corpus(&cfg.test_path),
            |model_cfg, embeddings, splits, store| {
                trainer::run_training(cfg, model_cfg, embeddings, splits, store)
            },
        )
    }

    /// Execute the pipeline on arbitrary sources, handing the prepared
    /// model config, embeddings and splits to `train`.
    pub fn execute_with<F>(
        &self,
        train_source: &dyn ExampleSource,
        dev_source:   &dyn ExampleSource,
        test_source:  &dyn ExampleSource,
        train:        F,
    ) -> Result<TrainingOutcome>
    where
        F: FnOnce(
            &NliModelConfig,
            Option<&EmbeddingMatrix>,
            Splits,
            &RunStore,
        ) -> Result<TrainingOutcome>,
    {
        let cfg = &self.config;

        // ── Step 1: Load splits ──────────────────────────────────────────────
        let train_examples = train_source.load_all()?;
        let dev_examples   = dev_source.load_all()?;
        let test_examples  = test_source.load_all()?;

        // ── Step 2: Vocabulary from training text only ───────────────────────
        let vocab = fit_vocabulary(&train_examples);
        tracing::info!("Vocabulary size: {}", vocab.size());

        // ── Step 3: Encode every split ───────────────────────────────────────
        let encoder = SequenceEncoder::new(&vocab, cfg.max_len);
        let splits  = Splits {
            train: NliDataset::encode(&train_examples, &encoder),
            valid: NliDataset::encode(&dev_examples, &encoder),
            test:  NliDataset::encode(&test_examples, &encoder),
        };
        tracing::info!(
            "Encoded: {} train, {} validation, {} test (train labels c/n/e = {:?})",
            splits.train.item_count(),
            splits.valid.item_count(),
            splits.test.item_count(),
            splits.train.label_counts(),
        );

        // ── Step 4: Pretrained embeddings ────────────────────────────────────
        let embeddings = if cfg.use_glove {
            let store = EmbeddingStore::new(&cfg.vectors_path, &cfg.embedding_cache, cfg.embed_size);
            Some(store.load_or_build(&vocab)?)
        } else {
            tracing::info!("Pretrained vectors disabled, embedding starts random");
            None
        };

        // ── Step 5: Save what inference needs ────────────────────────────────
        let store = RunStore::create(&cfg.output_dir)?;
        store.save_config(cfg)?;
        store.save_vocabulary(&vocab)?;

        // ── Step 6: Train, restore best, evaluate on test ────────────────────
        let model_cfg = cfg.model_config(vocab.size());
        train(&model_cfg, embeddings.as_ref(), splits, &store)
    }
}
