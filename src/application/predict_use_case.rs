// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Reloads a finished training run and classifies one sentence
// pair with it. All model work happens behind the
// PairClassifier trait.

use anyhow::Result;
use std::path::Path;

use crate::domain::traits::{PairClassifier, Prediction};
use crate::infra::checkpoint::RunStore;
use crate::ml::{inferencer::Inferencer, trainer::EvalBackend};

pub struct PredictUseCase {
    classifier: Box<dyn PairClassifier>,
}

impl PredictUseCase {
    /// Load the run stored in `run_dir` on the default WGPU device.
    pub fn new(run_dir: impl AsRef<Path>) -> Result<Self> {
        let store  = RunStore::open(run_dir.as_ref())?;
        let device = burn::backend::wgpu::WgpuDevice::default();
        let inferencer = Inferencer::<EvalBackend>::from_run(&store, device)?;
        Ok(Self::with_classifier(Box::new(inferencer)))
    }

    pub fn with_classifier(classifier: Box<dyn PairClassifier>) -> Self {
        Self { classifier }
    }

    pub fn predict(&self, premise: &str, hypothesis: &str) -> Result<Prediction> {
        if premise.trim().is_empty() || hypothesis.trim().is_empty() {
            anyhow::bail!("Premise and hypothesis must both be non-empty");
        }
        self.classifier.classify(premise, hypothesis)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::example::Label;

    /// Predicts entailment whenever the hypothesis is contained in the premise.
    struct Overlap;

    impl PairClassifier for Overlap {
        fn classify(&self, premise: &str, hypothesis: &str) -> Result<Prediction> {
            let label = if premise.contains(hypothesis) { Label::Entailment } else { Label::Neutral };
            let mut probabilities = [0.0; 3];
            probabilities[label.index()] = 1.0;
            Ok(Prediction { label, probabilities })
        }
    }

    #[test]
    fn test_delegates_to_classifier() {
        let use_case = PredictUseCase::with_classifier(Box::new(Overlap));
        let p = use_case.predict("a man sleeps", "man sleeps").unwrap();
        assert_eq!(p.label, Label::Entailment);
        assert_eq!(p.probabilities, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_rejects_empty_sentences() {
        let use_case = PredictUseCase::with_classifier(Box::new(Overlap));
        assert!(use_case.predict("  ", "a dog").is_err());
    }

    #[test]
    fn test_missing_run_directory_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(PredictUseCase::new(tmp.path().join("missing")).is_err());
    }
}
