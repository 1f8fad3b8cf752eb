// ============================================================
// Layer 3 — Experiment Settings
// ============================================================
// The discrete choices an experiment run is made of. Each enum
// parses from the string a user types on the command line
// (clap picks up the FromStr impls) and serialises with serde so
// a finished run can record exactly what it trained.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

// ─── Activation ───────────────────────────────────────────────────────────────
/// Nonlinearity used by the token projection and the classifier stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Elu,
    Selu,
    Tanh,
    Sigmoid,
    Gelu,
    Softplus,
    Softsign,
    #[serde(rename = "hard_sigmoid")]
    HardSigmoid,
    Exponential,
    Linear,
}

impl Activation {
    pub fn name(self) -> &'static str {
        match self {
            Activation::Relu     => "relu",
            Activation::Elu      => "elu",
            Activation::Selu     => "selu",
            Activation::Tanh     => "tanh",
            Activation::Sigmoid  => "sigmoid",
            Activation::Gelu     => "gelu",
            Activation::Softplus    => "softplus",
            Activation::Softsign    => "softsign",
            Activation::HardSigmoid => "hard_sigmoid",
            Activation::Exponential => "exponential",
            Activation::Linear      => "linear",
        }
    }
}

impl FromStr for Activation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relu"     => Ok(Activation::Relu),
            "elu"      => Ok(Activation::Elu),
            "selu"     => Ok(Activation::Selu),
            "tanh"     => Ok(Activation::Tanh),
            "sigmoid"  => Ok(Activation::Sigmoid),
            "gelu"     => Ok(Activation::Gelu),
            "softplus" => Ok(Activation::Softplus),
            "softsign" => Ok(Activation::Softsign),
            "hard_sigmoid" | "hardsigmoid" => Ok(Activation::HardSigmoid),
            "exponential" | "exp" => Ok(Activation::Exponential),
            "linear"   => Ok(Activation::Linear),
            other => Err(format!(
                "unknown activation '{other}' (expected relu, elu, selu, tanh, sigmoid, \
                 gelu, softplus, softsign, hard_sigmoid, exponential or linear)"
            )),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Dropout flavour ──────────────────────────────────────────────────────────
/// Dropout used between the classifier layers.
/// `Alpha` keeps mean and variance of self-normalising (selu) activations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropoutKind {
    Standard,
    Alpha,
}

impl FromStr for DropoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dropout" | "Dropout"                            => Ok(DropoutKind::Standard),
            "AlphaDropout" | "alpha_dropout" | "alpha"       => Ok(DropoutKind::Alpha),
            other => Err(format!("unknown dropout type '{other}' (expected dropout or AlphaDropout)")),
        }
    }
}

impl fmt::Display for DropoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropoutKind::Standard => f.write_str("dropout"),
            DropoutKind::Alpha    => f.write_str("AlphaDropout"),
        }
    }
}

// ─── Optimizer ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    AdamW,
    RmsProp,
    Sgd,
    AdaGrad,
}

impl OptimizerKind {
    /// Learning rate used when the run does not override it.
    pub fn default_learning_rate(self) -> f64 {
        match self {
            OptimizerKind::Adam | OptimizerKind::AdamW | OptimizerKind::RmsProp => 1e-3,
            OptimizerKind::Sgd | OptimizerKind::AdaGrad                         => 1e-2,
        }
    }
}

impl FromStr for OptimizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adam"    => Ok(OptimizerKind::Adam),
            "adamw"   => Ok(OptimizerKind::AdamW),
            "rmsprop" => Ok(OptimizerKind::RmsProp),
            "sgd"     => Ok(OptimizerKind::Sgd),
            "adagrad" => Ok(OptimizerKind::AdaGrad),
            other => Err(format!(
                "unknown optimizer '{other}' (expected adam, adamw, rmsprop, sgd or adagrad)"
            )),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptimizerKind::Adam    => "adam",
            OptimizerKind::AdamW   => "adamw",
            OptimizerKind::RmsProp => "rmsprop",
            OptimizerKind::Sgd     => "sgd",
            OptimizerKind::AdaGrad => "adagrad",
        };
        f.write_str(name)
    }
}

// ─── Sentence encoder ─────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Lstm,
    Gru,
}

/// How a sentence (a sequence of token vectors) is reduced to one vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EncoderKind {
    /// Sum of the projected token vectors
    Summation,
    /// Last state of a (possibly bidirectional) recurrent network
    Recurrent { cell: CellKind, bidirectional: bool },
}

impl EncoderKind {
    /// Width of the sentence vector for a given recurrent hidden size.
    pub fn output_size(self, hidden: usize) -> usize {
        match self {
            EncoderKind::Recurrent { bidirectional: true, .. } => 2 * hidden,
            _                                                  => hidden,
        }
    }
}

impl FromStr for EncoderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let recurrent = |cell, bidirectional| Ok(EncoderKind::Recurrent { cell, bidirectional });
        match s.to_ascii_lowercase().as_str() {
            "sum"    => Ok(EncoderKind::Summation),
            "lstm"   => recurrent(CellKind::Lstm, false),
            "gru"    => recurrent(CellKind::Gru, false),
            "bilstm" => recurrent(CellKind::Lstm, true),
            "bigru"  => recurrent(CellKind::Gru, true),
            other => Err(format!(
                "unknown encoder '{other}' (expected sum, lstm, gru, bilstm or bigru)"
            )),
        }
    }
}

impl fmt::Display for EncoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EncoderKind::Summation => "sum",
            EncoderKind::Recurrent { cell: CellKind::Lstm, bidirectional: false } => "lstm",
            EncoderKind::Recurrent { cell: CellKind::Gru,  bidirectional: false } => "gru",
            EncoderKind::Recurrent { cell: CellKind::Lstm, bidirectional: true  } => "bilstm",
            EncoderKind::Recurrent { cell: CellKind::Gru,  bidirectional: true  } => "bigru",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_parses_case_insensitively() {
        assert_eq!("ReLU".parse::<Activation>(), Ok(Activation::Relu));
        assert_eq!("selu".parse::<Activation>(), Ok(Activation::Selu));
        assert!("swish".parse::<Activation>().is_err());
    }

    #[test]
    fn test_extra_activation_names_round_trip() {
        for name in ["softsign", "hard_sigmoid", "exponential"] {
            let act: Activation = name.parse().unwrap();
            assert_eq!(act.to_string(), name);
            assert_eq!(serde_json::to_string(&act).unwrap(), format!("\"{name}\""));
        }
    }

    #[test]
    fn test_dropout_type_accepts_reference_spelling() {
        assert_eq!("AlphaDropout".parse::<DropoutKind>(), Ok(DropoutKind::Alpha));
        assert_eq!("dropout".parse::<DropoutKind>(), Ok(DropoutKind::Standard));
    }

    #[test]
    fn test_encoder_names_display_back() {
        for name in ["sum", "lstm", "gru", "bilstm", "bigru"] {
            let kind: EncoderKind = name.parse().unwrap();
            assert_eq!(kind.to_string(), name);
        }
    }

    #[test]
    fn test_bidirectional_doubles_output() {
        let bi = EncoderKind::Recurrent { cell: CellKind::Gru, bidirectional: true };
        assert_eq!(bi.output_size(300), 600);
        assert_eq!(EncoderKind::Summation.output_size(300), 300);
    }

    #[test]
    fn test_optimizer_learning_rates() {
        assert_eq!(OptimizerKind::Adam.default_learning_rate(), 1e-3);
        assert_eq!("SGD".parse::<OptimizerKind>().map(|o| o.default_learning_rate()), Ok(1e-2));
    }
}
