// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Two records of a training run:
//
//   metrics.csv               one row per epoch, appended as the
//                             run progresses
//   history_<activation>.json the whole run as four parallel
//                             series, written once at the end
//
// Example CSV output:
//   epoch,loss,accuracy,val_loss,val_accuracy
//   1,0.912345,0.571200,0.801234,0.648300
//   2,0.774410,0.667900,0.735912,0.689100
//
// The history file has the shape of a Keras `History.history`
// dict, so existing plotting scripts can read it unchanged:
//   {"loss": [...], "accuracy": [...], "val_loss": [...], "val_accuracy": [...]}

use anyhow::{Context, Result};
use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// Metrics for a single training epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch: usize,

    /// Mean training loss (cross-entropy + L2 penalty)
    pub loss: f64,

    /// Fraction of training examples classified correctly
    pub accuracy: f64,

    /// Mean validation loss, dropout disabled
    pub val_loss: f64,

    pub val_accuracy: f64,
}

impl EpochMetrics {
    pub fn new(
        epoch:        usize,
        loss:         f64,
        accuracy:     f64,
        val_loss:     f64,
        val_accuracy: f64,
    ) -> Self {
        Self { epoch, loss, accuracy, val_loss, val_accuracy }
    }

    /// Returns true if this epoch's val_loss is strictly below the best so far
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Logs epoch metrics to `metrics.csv` in the run directory.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Starts a fresh CSV (header only); a previous run's file is replaced.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        let mut f = File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "epoch,loss,accuracy,val_loss,val_accuracy")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.loss,
            m.accuracy,
            m.val_loss,
            m.val_accuracy,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.loss,
            m.val_loss,
        );

        Ok(())
    }

    #[cfg(test)]
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

/// Per-epoch series for the whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub loss:         Vec<f64>,
    pub accuracy:     Vec<f64>,
    pub val_loss:     Vec<f64>,
    pub val_accuracy: Vec<f64>,
}

impl History {
    pub fn push(&mut self, m: &EpochMetrics) {
        self.loss.push(m.loss);
        self.accuracy.push(m.accuracy);
        self.val_loss.push(m.val_loss);
        self.val_accuracy.push(m.val_accuracy);
    }

    pub fn epochs(&self) -> usize {
        self.loss.len()
    }

    /// 1-based epoch with the lowest val_loss; the first one wins ties.
    /// NaN losses never count, matching `EpochMetrics::is_improvement`.
    pub fn best_epoch(&self) -> Option<usize> {
        let mut best = (None, f64::INFINITY);
        for (i, &v) in self.val_loss.iter().enumerate() {
            if v < best.1 {
                best = (Some(i + 1), v);
            }
        }
        best.0
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write history to '{}'", path.display()))?;
        tracing::info!("History written to '{}'", path.display());
        Ok(())
    }

    #[cfg(test)]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read history from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 0.9, 0.6, 0.8, 0.65);
        assert!(m.is_improvement(1.0));
        assert!(!m.is_improvement(0.8));
        assert!(!m.is_improvement(0.5));
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_epoch() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 1.0, 0.5, 0.9, 0.55)).unwrap();
        logger.log(&EpochMetrics::new(2, 0.8, 0.6, 0.85, 0.6)).unwrap();

        let text  = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,loss,accuracy,val_loss,val_accuracy");
        assert_eq!(lines[2], "2,0.800000,0.600000,0.850000,0.600000");
    }

    #[test]
    fn test_new_logger_replaces_previous_csv() {
        let dir = tempfile::tempdir().unwrap();
        MetricsLogger::new(dir.path()).unwrap()
            .log(&EpochMetrics::new(1, 1.0, 0.5, 0.9, 0.55)).unwrap();

        let logger = MetricsLogger::new(dir.path()).unwrap();
        let text   = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_history_best_epoch() {
        let mut h = History::default();
        assert_eq!(h.best_epoch(), None);
        for (i, v) in [0.9, 0.7, 0.75, 0.7].into_iter().enumerate() {
            h.push(&EpochMetrics::new(i + 1, 1.0, 0.5, v, 0.5));
        }
        assert_eq!(h.epochs(), 4);
        assert_eq!(h.best_epoch(), Some(2));

        let diverged = History { val_loss: vec![f64::NAN, 0.8], ..History::default() };
        assert_eq!(diverged.best_epoch(), Some(2));
    }

    #[test]
    fn test_history_json_uses_keras_keys() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("history_relu.json");
        let mut h = History::default();
        h.push(&EpochMetrics::new(1, 1.0, 0.5, 0.9, 0.55));
        h.save(&path).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        for key in ["loss", "accuracy", "val_loss", "val_accuracy"] {
            assert_eq!(raw[key].as_array().map(Vec::len), Some(1));
        }
        assert_eq!(History::load(&path).unwrap(), h);
    }
}
