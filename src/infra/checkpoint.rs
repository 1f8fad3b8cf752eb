// ============================================================
// Layer 6 — Checkpoints and Run Store
// ============================================================
// Two places model weights are written to:
//
//   BestCheckpoint  a temporary directory that holds the weights
//                   of the epoch with the lowest validation loss
//                   so far. Removed when the run ends.
//
//   RunStore        the persistent output directory of a run:
//                     runs/
//                       train_config.json   ← ExperimentConfig
//                       vocab.json          ← fitted vocabulary
//                       model.mpk           ← restored best weights
//                       metrics.csv
//                       history_<activation>.json
//
// Weights use Burn's NamedMpkFileRecorder at full precision, so a
// restored checkpoint reproduces the saved parameters bit for bit.
// The config is saved separately because the model architecture
// has to be rebuilt before weights can be loaded into it.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

use crate::application::train_use_case::ExperimentConfig;
use crate::data::vocabulary::Vocabulary;
use crate::ml::model::NliModel;

type WeightsRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

const CONFIG_FILE: &str = "train_config.json";
const VOCAB_FILE:  &str = "vocab.json";
/// File stem; the recorder adds `.mpk`.
const MODEL_STEM:  &str = "model";

/// Weights of the best epoch seen so far, kept in a temp directory.
pub struct BestCheckpoint {
    dir:   TempDir,
    epoch: Option<usize>,
}

impl BestCheckpoint {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("snli-checkpoint-")
            .tempdir()
            .context("Cannot create checkpoint directory")?;
        tracing::debug!("Checkpoint directory: '{}'", dir.path().display());
        Ok(Self { dir, epoch: None })
    }

    fn path(&self) -> PathBuf {
        self.dir.path().join("best")
    }

    /// Overwrite the checkpoint with `model`'s weights.
    pub fn save<B: Backend>(&mut self, model: &NliModel<B>, epoch: usize) -> Result<()> {
        let path = self.path();
        WeightsRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;
        self.epoch = Some(epoch);
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Epoch of the saved weights, None if nothing was saved yet.
    pub fn epoch(&self) -> Option<usize> {
        self.epoch
    }

    /// Load the saved weights into `model`. Returns `model` unchanged
    /// when no checkpoint was ever written.
    pub fn restore<B: Backend>(&self, model: NliModel<B>, device: &B::Device) -> Result<NliModel<B>> {
        let Some(epoch) = self.epoch else {
            return Ok(model);
        };
        let path   = self.path();
        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;
        tracing::info!("Restored weights from epoch {}", epoch);
        Ok(model.load_record(record))
    }
}

/// The persistent output directory of a training run.
#[derive(Debug, Clone)]
pub struct RunStore {
    dir: PathBuf,
}

impl RunStore {
    /// Creates the directory if it does not exist.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create run directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Opens an existing run directory for reading.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            anyhow::bail!(
                "Run directory '{}' not found. Have you run 'train' first?",
                dir.display()
            );
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn history_path(&self, activation: impl std::fmt::Display) -> PathBuf {
        self.dir.join(format!("history_{activation}.json"))
    }

    pub fn save_config(&self, cfg: &ExperimentConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<ExperimentConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid config in '{}'", path.display()))
    }

    pub fn save_vocabulary(&self, vocab: &Vocabulary) -> Result<()> {
        let path = self.dir.join(VOCAB_FILE);
        let json = serde_json::to_string(vocab)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write vocabulary to '{}'", path.display()))?;
        tracing::debug!("Saved {} vocabulary tokens to '{}'", vocab.token_count(), path.display());
        Ok(())
    }

    pub fn load_vocabulary(&self) -> Result<Vocabulary> {
        let path = self.dir.join(VOCAB_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read vocabulary from '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid vocabulary in '{}'", path.display()))
    }

    pub fn save_model<B: Backend>(&self, model: &NliModel<B>) -> Result<()> {
        let path = self.dir.join(MODEL_STEM);
        WeightsRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;
        tracing::info!("Model weights saved to '{}.mpk'", path.display());
        Ok(())
    }

    /// Load the stored weights into a freshly built `model` of the same architecture.
    pub fn load_model<B: Backend>(&self, model: NliModel<B>, device: &B::Device) -> Result<NliModel<B>> {
        let path   = self.dir.join(MODEL_STEM);
        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load model '{}.mpk'. Have you trained the model first?", path.display())
            })?;
        Ok(model.load_record(record))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::{Activation, DropoutKind, EncoderKind};
    use crate::ml::model::NliModelConfig;
    use burn::backend::NdArray;

    type B = NdArray;

    fn model_config() -> NliModelConfig {
        NliModelConfig::new(12, "gru".parse().unwrap(), Activation::Tanh, DropoutKind::Standard)
            .with_embed_size(4)
            .with_hidden_size(5)
            .with_batch_norm(true)
    }

    fn weights(model: &NliModel<B>) -> Vec<f32> {
        let mut all: Vec<f32> = model.translate.weight.val().into_data().to_vec().unwrap();
        all.extend(model.output.weight.val().into_data().to_vec::<f32>().unwrap());
        all.extend(model.embedding.weight.val().into_data().to_vec::<f32>().unwrap());
        all
    }

    #[test]
    fn test_restore_without_save_keeps_model() {
        let device = Default::default();
        let ckpt   = BestCheckpoint::new().unwrap();
        let model  = model_config().init::<B>(&device);
        let before = weights(&model);

        assert_eq!(ckpt.epoch(), None);
        let model = ckpt.restore(model, &device).unwrap();
        assert_eq!(weights(&model), before);
    }

    #[test]
    fn test_restore_returns_saved_weights() {
        let device = Default::default();
        let mut ckpt = BestCheckpoint::new().unwrap();

        let best = model_config().init::<B>(&device);
        ckpt.save(&best, 3).unwrap();

        let later    = model_config().init::<B>(&device);
        assert_ne!(weights(&later), weights(&best));
        let restored = ckpt.restore(later, &device).unwrap();

        assert_eq!(ckpt.epoch(), Some(3));
        assert_eq!(weights(&restored), weights(&best));
    }

    #[test]
    fn test_checkpoint_directory_is_removed_on_drop() {
        let ckpt = BestCheckpoint::new().unwrap();
        let dir  = ckpt.dir.path().to_path_buf();
        assert!(dir.is_dir());
        drop(ckpt);
        assert!(!dir.exists());
    }

    #[test]
    fn test_run_store_round_trips_vocab_and_model() {
        let tmp    = tempfile::tempdir().unwrap();
        let store  = RunStore::create(tmp.path().join("run")).unwrap();
        let device = Default::default();

        let vocab = Vocabulary::fit(["a man sleeps", "a dog"]);
        store.save_vocabulary(&vocab).unwrap();
        assert_eq!(store.load_vocabulary().unwrap(), vocab);

        let model = model_config().init::<B>(&device);
        store.save_model(&model).unwrap();
        let loaded = store.load_model(model_config().init::<B>(&device), &device).unwrap();
        assert_eq!(weights(&loaded), weights(&model));
    }

    #[test]
    fn test_run_store_round_trips_config() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = RunStore::create(tmp.path()).unwrap();
        let cfg   = ExperimentConfig {
            encoder: EncoderKind::Summation,
            max_epochs: 3,
            ..ExperimentConfig::default()
        };
        store.save_config(&cfg).unwrap();
        assert_eq!(store.load_config().unwrap(), cfg);
        assert_eq!(
            store.history_path(Activation::Relu),
            tmp.path().join("history_relu.json")
        );
    }

    #[test]
    fn test_open_missing_run_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(RunStore::open(tmp.path().join("nope")).is_err());
        assert!(RunStore::open(tmp.path()).is_ok());
    }
}
