// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All work is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   — trains a classifier on the SNLI splits
//   2. `predict` — reloads a run and classifies one sentence pair

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "snli-classifier",
    version,
    about = "Train a sentence-pair classifier on SNLI, then classify premise / hypothesis pairs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. The CLI only routes and prints.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let use_case = TrainUseCase::new(args.into());
    let cfg      = use_case.config();
    tracing::info!(
        "Starting training: encoder={}, activation={}, optimizer={}, batchnorm={}, dropout={}",
        cfg.encoder, cfg.activation, cfg.optimizer, cfg.batch_norm, cfg.dropout_kind,
    );

    let outcome = use_case.execute()?;
    match outcome.best_epoch {
        Some(epoch) => println!("Best epoch: {epoch} of {}", outcome.history.epochs()),
        None        => println!("No epoch improved val_loss; final weights were kept"),
    }
    println!(
        "Test loss: {:.4}, test accuracy: {:.4}",
        outcome.test.loss, outcome.test.accuracy
    );
    println!("Run saved to '{}'", use_case.config().output_dir.display());
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;
    use crate::domain::example::Label;

    let use_case   = PredictUseCase::new(&args.run_dir)?;
    let prediction = use_case.predict(&args.premise, &args.hypothesis)?;

    println!("\nPrediction: {}", prediction.label);
    for label in Label::ALL {
        println!("  {:<13} {:.4}", label.as_str(), prediction.probabilities[label.index()]);
    }
    Ok(())
}
