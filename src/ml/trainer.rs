// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Mini-batch training with validation-based checkpointing.
//
//   for each epoch:
//     shuffle train split (fixed seed) → forward → loss → backward → step
//     evaluate on the validation split with model.valid()
//     val_loss lower than every earlier epoch → overwrite checkpoint
//     optional: stop after `patience` epochs without improvement
//   restore best checkpoint → evaluate test split → save weights
//
// Burn backends:
//   - Training uses TrainBackend (Autodiff<Wgpu>) for gradients
//   - model.valid() returns the model on the inner backend, which
//     disables dropout and puts batch norm in inference mode
//   - Validation and test batchers use the inner backend as well
//   - argmax(1) returns [batch, 1], flattened before .equal()
//
// The optimizer is chosen at runtime but the loop is generic over
// Burn's Optimizer trait, so each choice compiles to its own fit().
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::{batcher::Batcher, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{
        AdaGradConfig, AdamConfig, AdamWConfig, GradientsParams, Optimizer,
        RmsPropConfig, SgdConfig,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::ExperimentConfig;
use crate::data::{
    batcher::{NliBatch, NliBatcher},
    dataset::NliDataset,
};
use crate::domain::settings::OptimizerKind;
use crate::infra::{
    checkpoint::{BestCheckpoint, RunStore},
    embedding_store::EmbeddingMatrix,
    metrics::{EpochMetrics, History, MetricsLogger},
};
use crate::ml::model::{NliModel, NliModelConfig};

pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;
pub type EvalBackend  = burn::backend::Wgpu;

/// Keras' default epsilon, used for the adaptive optimizers.
const OPTIMIZER_EPSILON: f32 = 1e-7;

/// The three encoded splits of a run.
pub struct Splits {
    pub train: NliDataset,
    pub valid: NliDataset,
    pub test:  NliDataset,
}

/// Mean loss and accuracy over one split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss:     f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub history:    History,
    /// Epoch whose weights were restored, None if no epoch ever improved
    pub best_epoch: Option<usize>,
    pub test:       Evaluation,
}

/// Train on the default WGPU device.
pub fn run_training(
    cfg:        &ExperimentConfig,
    model_cfg:  &NliModelConfig,
    embeddings: Option<&EmbeddingMatrix>,
    splits:     Splits,
    store:      &RunStore,
) -> Result<TrainingOutcome> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_and_evaluate::<TrainBackend>(cfg, model_cfg, embeddings, splits, store, &device)
}

/// Build the model, train it, restore the best epoch, evaluate on test
/// and write weights and history into `store`.
pub fn train_and_evaluate<B: AutodiffBackend>(
    cfg:        &ExperimentConfig,
    model_cfg:  &NliModelConfig,
    embeddings: Option<&EmbeddingMatrix>,
    splits:     Splits,
    store:      &RunStore,
    device:     &B::Device,
) -> Result<TrainingOutcome> {
    B::seed(cfg.seed);

    let model: NliModel<B> = match embeddings {
        Some(matrix) => model_cfg.init_with_embeddings(matrix, device)?,
        None         => model_cfg.init(device),
    };
    tracing::info!(
        "Model ready: encoder={}, {} parameters",
        model_cfg.encoder,
        model.num_params(),
    );

    let lr = cfg.learning_rate();
    tracing::info!("Optimizer: {} (lr={})", cfg.optimizer, lr);

    let Splits { train, valid, test } = splits;
    let (model, history, best_epoch) = match cfg.optimizer {
        OptimizerKind::Adam => {
            let optim = AdamConfig::new()
                .with_epsilon(OPTIMIZER_EPSILON)
                .init::<B, NliModel<B>>();
            fit(cfg, model, optim, lr, train, valid, store, device)?
        }
        OptimizerKind::AdamW => {
            let optim = AdamWConfig::new()
                .with_epsilon(OPTIMIZER_EPSILON)
                .with_weight_decay(0.004)
                .init::<B, NliModel<B>>();
            fit(cfg, model, optim, lr, train, valid, store, device)?
        }
        OptimizerKind::RmsProp => {
            let optim = RmsPropConfig::new()
                .with_alpha(0.9)
                .with_epsilon(OPTIMIZER_EPSILON)
                .init::<B, NliModel<B>>();
            fit(cfg, model, optim, lr, train, valid, store, device)?
        }
        OptimizerKind::Sgd => {
            let optim = SgdConfig::new().init::<B, NliModel<B>>();
            fit(cfg, model, optim, lr, train, valid, store, device)?
        }
        OptimizerKind::AdaGrad => {
            let optim = AdaGradConfig::new().init::<B, NliModel<B>>();
            fit(cfg, model, optim, lr, train, valid, store, device)?
        }
    };

    // ── Test phase ───────────────────────────────────────────────────────────
    let model = model.valid();
    let test  = evaluate(&model, test, cfg.batch_size, device);
    println!("Test loss / test accuracy = {:.4} / {:.4}", test.loss, test.accuracy);

    store.save_model(&model)?;
    history.save(store.history_path(cfg.activation))?;

    Ok(TrainingOutcome { history, best_epoch, test })
}

#[allow(clippy::too_many_arguments)]
fn fit<B, O>(
    cfg:       &ExperimentConfig,
    mut model: NliModel<B>,
    mut optim: O,
    lr:        f64,
    train:     NliDataset,
    valid:     NliDataset,
    store:     &RunStore,
    device:    &B::Device,
) -> Result<(NliModel<B>, History, Option<usize>)>
where
    B: AutodiffBackend,
    O: Optimizer<NliModel<B>, B>,
{
    let train_items = train.item_count();
    let train_loader = DataLoaderBuilder::new(NliBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train);

    let mut checkpoint = BestCheckpoint::new()?;
    let metrics_log    = MetricsLogger::new(store.dir())?;
    let mut history    = History::default();
    let mut best_loss  = f64::INFINITY;
    let mut stale      = 0usize;

    for epoch in 1..=cfg.max_epochs {

        // ── Training phase ───────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut correct  = 0usize;

        for batch in train_loader.iter() {
            let NliBatch { premise, hypothesis, labels, targets } = batch;
            let size = labels.dims()[0];

            let (loss, logits) = model.forward_loss(premise, hypothesis, targets);
            loss_sum += loss.clone().into_scalar().elem::<f64>() * size as f64;
            correct  += count_correct(logits, labels);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);
        }

        let (loss, accuracy) = if train_items > 0 {
            (loss_sum / train_items as f64, correct as f64 / train_items as f64)
        } else {
            (f64::NAN, 0.0)
        };

        // ── Validation phase ─────────────────────────────────────────────────
        let val = evaluate_ref(&model.valid(), &valid, cfg.batch_size, device);

        let metrics = EpochMetrics::new(epoch, loss, accuracy, val.loss, val.accuracy);
        println!(
            "Epoch {:>3}/{} - loss: {:.4} - accuracy: {:.4} - val_loss: {:.4} - val_accuracy: {:.4}",
            epoch, cfg.max_epochs, metrics.loss, metrics.accuracy,
            metrics.val_loss, metrics.val_accuracy,
        );
        metrics_log.log(&metrics)?;
        history.push(&metrics);

        if metrics.is_improvement(best_loss) {
            tracing::info!(
                "val_loss improved from {:.5} to {:.5}, saving checkpoint",
                best_loss, metrics.val_loss,
            );
            best_loss = metrics.val_loss;
            stale     = 0;
            checkpoint.save(&model, epoch)?;
        } else {
            stale += 1;
            if cfg.patience.is_some_and(|p| stale >= p) {
                tracing::info!("No improvement for {} epochs, stopping at epoch {}", stale, epoch);
                break;
            }
        }
    }

    if checkpoint.epoch().is_none() {
        tracing::warn!("No checkpoint was written; keeping the final weights");
    }
    let model = checkpoint.restore(model, device)?;

    Ok((model, history, checkpoint.epoch()))
}

/// Mean loss (cross-entropy + weight penalty) and accuracy of `model`
/// over `dataset`, without dropout.
pub fn evaluate<B: Backend>(
    model:      &NliModel<B>,
    dataset:    NliDataset,
    batch_size: usize,
    device:     &B::Device,
) -> Evaluation {
    evaluate_ref(model, &dataset, batch_size, device)
}

fn evaluate_ref<B: Backend>(
    model:      &NliModel<B>,
    dataset:    &NliDataset,
    batch_size: usize,
    device:     &B::Device,
) -> Evaluation {
    let total = dataset.item_count();
    if total == 0 {
        return Evaluation { loss: f64::NAN, accuracy: 0.0 };
    }

    let batcher  = NliBatcher::<B>::new(device.clone());
    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;

    for batch in dataset.batches(batch_size) {
        let NliBatch { premise, hypothesis, labels, targets } = batcher.batch(batch);
        let size = labels.dims()[0];

        let (loss, logits) = model.forward_loss(premise, hypothesis, targets);
        loss_sum += loss.into_scalar().elem::<f64>() * size as f64;
        correct  += count_correct(logits, labels);
    }

    Evaluation {
        loss:     loss_sum / total as f64,
        accuracy: correct as f64 / total as f64,
    }
}

/// Number of rows whose argmax matches the label.
fn count_correct<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> usize {
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    predicted
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}
