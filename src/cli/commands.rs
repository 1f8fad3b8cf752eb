// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `predict`, and all
// their flags. Flag names keep the underscore spelling of the
// original experiment scripts (`--max_epochs`, `--add_batchnorm`).
//
// clap's derive macros generate --help, error messages for
// missing args, and the string → value conversions (the setting
// enums parse through their FromStr impls, so an unknown
// activation or optimizer is rejected before anything runs).

use clap::{
    builder::{BoolishValueParser, RangedU64ValueParser},
    ArgAction, Args, Subcommand,
};
use std::path::PathBuf;

use crate::application::train_use_case::ExperimentConfig;
use crate::domain::settings::{Activation, DropoutKind, EncoderKind, OptimizerKind};
use crate::infra::embedding_store::{DEFAULT_CACHE_FILE, DEFAULT_VECTORS_FILE};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a sentence-pair classifier on SNLI
    Train(TrainArgs),

    /// Classify a premise / hypothesis pair with a trained run
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Activation used after the projection and in the classifier:
    /// relu, elu, selu, tanh, sigmoid, gelu, softplus, softsign,
    /// hard_sigmoid, exponential or linear
    #[arg(long, default_value_t = Activation::Relu)]
    pub activation: Activation,

    /// Number of passes through the training data
    #[arg(long = "max_epochs", default_value_t = 42)]
    pub max_epochs: usize,

    /// Batch-normalise sentence vectors and hidden layers
    /// (`--add_batchnorm`, `--add_batchnorm true|false`)
    #[arg(
        long = "add_batchnorm",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
    )]
    pub add_batchnorm: bool,

    /// adam, adamw, rmsprop, sgd or adagrad
    #[arg(long, default_value_t = OptimizerKind::Adam)]
    pub optimizer: OptimizerKind,

    /// dropout or AlphaDropout
    #[arg(long = "dropout_type", default_value_t = DropoutKind::Standard)]
    pub dropout_type: DropoutKind,

    /// Sentence encoder: sum, lstm, gru, bilstm or bigru
    #[arg(long, default_value_t = EncoderKind::Summation)]
    pub encoder: EncoderKind,

    /// Recurrent layers in the sentence encoder
    #[arg(long, default_value_t = 1, value_parser = positive())]
    pub layers: usize,

    /// Keep updating the pretrained embeddings during training
    #[arg(long = "train_embed")]
    pub train_embed: bool,

    /// Start from a random embedding instead of pretrained vectors
    #[arg(long = "no_glove")]
    pub no_glove: bool,

    #[arg(long = "batch_size", default_value_t = 512, value_parser = positive())]
    pub batch_size: usize,

    /// Tokens kept per sentence (left-padded / front-truncated)
    #[arg(long = "max_len", default_value_t = 42, value_parser = positive())]
    pub max_len: usize,

    /// Width of the token projection and recurrent state
    #[arg(long = "hidden_size", default_value_t = 300, value_parser = positive())]
    pub hidden_size: usize,

    /// Must match the vector file when pretrained vectors are used
    #[arg(long = "embed_size", default_value_t = 300, value_parser = positive())]
    pub embed_size: usize,

    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// L2 factor on the hidden classifier kernels
    #[arg(long, default_value_t = 4e-6)]
    pub l2: f64,

    /// Learning rate; defaults to the optimizer's standard value
    #[arg(long)]
    pub lr: Option<f64>,

    /// Stop after this many epochs without a lower val_loss
    #[arg(long)]
    pub patience: Option<usize>,

    /// Read at most limit + 1 lines of each split
    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long, default_value_t = 1337)]
    pub seed: u64,

    #[arg(long = "train_path", default_value = "snli_1.0_train.jsonl")]
    pub train_path: PathBuf,

    #[arg(long = "dev_path", default_value = "snli_1.0_dev.jsonl")]
    pub dev_path: PathBuf,

    #[arg(long = "test_path", default_value = "snli_1.0_test.jsonl")]
    pub test_path: PathBuf,

    /// GloVe-format word-vector file
    #[arg(long = "vectors_path", default_value = DEFAULT_VECTORS_FILE)]
    pub vectors_path: PathBuf,

    /// Where the vocabulary-indexed embedding matrix is cached
    #[arg(long = "embedding_cache", default_value = DEFAULT_CACHE_FILE)]
    pub embedding_cache: PathBuf,

    /// Directory for config, vocabulary, weights, metrics and history
    #[arg(long = "output_dir", default_value = "runs")]
    pub output_dir: PathBuf,
}

/// Sizes and counts that must be at least 1.
fn positive() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::<usize>::new().range(1..)
}

/// Convert CLI TrainArgs into the application-layer ExperimentConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for ExperimentConfig {
    fn from(a: TrainArgs) -> Self {
        ExperimentConfig {
            train_path:      a.train_path,
            dev_path:        a.dev_path,
            test_path:       a.test_path,
            vectors_path:    a.vectors_path,
            embedding_cache: a.embedding_cache,
            output_dir:      a.output_dir,
            use_glove:       !a.no_glove,
            train_embed:     a.train_embed,
            encoder:         a.encoder,
            layers:          a.layers,
            embed_size:      a.embed_size,
            hidden_size:     a.hidden_size,
            activation:      a.activation,
            optimizer:       a.optimizer,
            dropout_kind:    a.dropout_type,
            dropout:         a.dropout,
            l2:              a.l2,
            batch_norm:      a.add_batchnorm,
            batch_size:      a.batch_size,
            max_epochs:      a.max_epochs,
            max_len:         a.max_len,
            learning_rate:   a.lr,
            patience:        a.patience,
            limit:           a.limit,
            seed:            a.seed,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Premise sentence (plain text or binary parse)
    #[arg(long)]
    pub premise: String,

    /// Hypothesis sentence (plain text or binary parse)
    #[arg(long)]
    pub hypothesis: String,

    /// Output directory of the training run
    #[arg(long = "run_dir", default_value = "runs")]
    pub run_dir: PathBuf,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use crate::cli::Cli;
    use super::*;
    use clap::Parser;

    fn train_config(args: &[&str]) -> ExperimentConfig {
        let cli = Cli::try_parse_from(["snli-classifier", "train"].iter().chain(args).copied()).unwrap();
        match cli.command {
            Commands::Train(a) => a.into(),
            other => panic!("expected train, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_match_experiment_defaults() {
        let cfg = train_config(&[]);
        assert_eq!(cfg, ExperimentConfig::default());
        assert_eq!(cfg.train_path, PathBuf::from("snli_1.0_train.jsonl"));
        assert_eq!(cfg.dev_path,   PathBuf::from("snli_1.0_dev.jsonl"));
        assert_eq!(cfg.test_path,  PathBuf::from("snli_1.0_test.jsonl"));
    }

    #[test]
    fn test_original_flag_spellings() {
        let cfg = train_config(&[
            "--activation", "tanh",
            "--max_epochs", "3",
            "--add_batchnorm", "True",
            "--optimizer", "rmsprop",
            "--dropout_type", "AlphaDropout",
        ]);
        assert_eq!(cfg.activation, Activation::Tanh);
        assert_eq!(cfg.max_epochs, 3);
        assert!(cfg.batch_norm);
        assert_eq!(cfg.optimizer, OptimizerKind::RmsProp);
        assert_eq!(cfg.dropout_kind, DropoutKind::Alpha);
    }

    #[test]
    fn test_bare_add_batchnorm_enables_it() {
        assert!(train_config(&["--add_batchnorm"]).batch_norm);
        assert!(!train_config(&["--add_batchnorm", "false"]).batch_norm);
    }

    #[test]
    fn test_encoder_and_embedding_flags() {
        let cfg = train_config(&["--encoder", "bilstm", "--layers", "2", "--no_glove", "--limit", "99"]);
        assert_eq!(cfg.encoder, "bilstm".parse::<EncoderKind>().unwrap());
        assert_eq!(cfg.layers, 2);
        assert!(!cfg.use_glove);
        assert_eq!(cfg.limit, Some(99));
    }

    #[test]
    fn test_unknown_values_are_rejected() {
        assert!(Cli::try_parse_from(["snli-classifier", "train", "--activation", "swish"]).is_err());
        assert!(Cli::try_parse_from(["snli-classifier", "train", "--optimizer", "lbfgs"]).is_err());
    }

    #[test]
    fn test_zero_sizes_are_rejected() {
        for flag in ["--max_len", "--batch_size", "--hidden_size", "--embed_size", "--layers"] {
            let parsed = Cli::try_parse_from(["snli-classifier", "train", flag, "0"]);
            assert!(parsed.is_err(), "{flag} 0 was accepted");
        }
        assert_eq!(train_config(&["--max_len", "1"]).max_len, 1);
    }

    #[test]
    fn test_predict_args() {
        let cli = Cli::try_parse_from([
            "snli-classifier", "predict", "--premise", "A man sleeps .", "--hypothesis", "A man rests .",
        ]).unwrap();
        match cli.command {
            Commands::Predict(a) => {
                assert_eq!(a.premise, "A man sleeps .");
                assert_eq!(a.run_dir, PathBuf::from("runs"));
            }
            other => panic!("expected predict, got {other:?}"),
        }
    }
}
