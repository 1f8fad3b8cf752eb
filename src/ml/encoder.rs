// ============================================================
// Layer 5 — Sentence Encoder
// ============================================================
// Reduces a sentence, given as a sequence of projected token
// vectors [batch, seq_len, hidden], to one vector per sentence.
//
//   Summation   → sum over the time axis              [batch, hidden]
//   Recurrent   → last state of an LSTM / GRU          [batch, hidden]
//                 (bidirectional: forward last state ++ backward
//                  last state                          [batch, 2·hidden])
//
// A recurrent encoder with `layers > 1` stacks layers - 1
// sequence-returning layers in front of the final one, each
// optionally followed by batch normalisation over the features.
// The inputs of every recurrent layer go through dropout.
//
// One SentenceEncoder instance serves both the premise and the
// hypothesis branch, so both sentences are encoded with the same
// parameters.
//
// Reference: Burn Book §3 (Building Blocks)
//            Hochreiter & Schmidhuber (1997), Cho et al. (2014)

use burn::{
    nn::{
        gru::{Gru, GruConfig},
        lstm::{Lstm, LstmConfig},
        BatchNorm, BatchNormConfig,
        Dropout, DropoutConfig,
    },
    prelude::*,
};

use crate::domain::settings::{CellKind, EncoderKind};

// ─── Recurrent cell ───────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub enum RecurrentCell<B: Backend> {
    Lstm(Lstm<B>),
    Gru(Gru<B>),
}

impl<B: Backend> RecurrentCell<B> {
    pub fn new(kind: CellKind, d_input: usize, d_hidden: usize, device: &B::Device) -> Self {
        match kind {
            CellKind::Lstm => Self::Lstm(LstmConfig::new(d_input, d_hidden, true).init(device)),
            CellKind::Gru  => Self::Gru(GruConfig::new(d_input, d_hidden, true).init(device)),
        }
    }

    /// Hidden state at every step: [batch, seq, d_input] → [batch, seq, d_hidden]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        match self {
            Self::Lstm(lstm) => lstm.forward(x, None).0,
            Self::Gru(gru)   => gru.forward(x, None),
        }
    }
}

// ─── Recurrent layer (one or two directions) ──────────────────────────────────
#[derive(Module, Debug)]
pub struct RecurrentLayer<B: Backend> {
    forward_cell:  RecurrentCell<B>,
    backward_cell: Option<RecurrentCell<B>>,
}

impl<B: Backend> RecurrentLayer<B> {
    pub fn new(
        kind:          CellKind,
        bidirectional: bool,
        d_input:       usize,
        d_hidden:      usize,
        device:        &B::Device,
    ) -> Self {
        let backward_cell = bidirectional
            .then(|| RecurrentCell::new(kind, d_input, d_hidden, device));
        Self {
            forward_cell: RecurrentCell::new(kind, d_input, d_hidden, device),
            backward_cell,
        }
    }

    /// Per-step outputs aligned with the input time axis.
    /// The backward direction reads the reversed sequence and is flipped
    /// back, so step t of both halves refers to the same token.
    pub fn sequence(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let forward = self.forward_cell.forward(x.clone());
        match &self.backward_cell {
            None       => forward,
            Some(cell) => {
                let backward = cell.forward(x.flip([1])).flip([1]);
                Tensor::cat(vec![forward, backward], 2)
            }
        }
    }

    /// State after each direction has consumed the whole sequence.
    pub fn last_state(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let forward = last_step(self.forward_cell.forward(x.clone()));
        match &self.backward_cell {
            None       => forward,
            Some(cell) => {
                let backward = last_step(cell.forward(x.flip([1])));
                Tensor::cat(vec![forward, backward], 1)
            }
        }
    }
}

/// [batch, seq, hidden] → [batch, hidden] at the final step
fn last_step<B: Backend>(states: Tensor<B, 3>) -> Tensor<B, 2> {
    let [batch, seq_len, hidden] = states.dims();
    states
        .slice([0..batch, seq_len - 1..seq_len, 0..hidden])
        .reshape([batch, hidden])
}

// ─── Sentence encoder ─────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct SentenceEncoderConfig {
    pub kind:       EncoderKind,
    pub d_input:    usize,
    pub d_hidden:   usize,
    #[config(default = 1)]
    pub layers:     usize,
    #[config(default = false)]
    pub batch_norm: bool,
    #[config(default = 0.2)]
    pub dropout:    f64,
}

impl SentenceEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SentenceEncoder<B> {
        let input_dropout = DropoutConfig::new(self.dropout).init();

        let EncoderKind::Recurrent { cell, bidirectional } = self.kind else {
            return SentenceEncoder { stacked: Vec::new(), norms: Vec::new(), last: None, input_dropout };
        };

        let width       = self.kind.output_size(self.d_hidden);
        let mut stacked = Vec::new();
        let mut norms   = Vec::new();
        let mut d_input = self.d_input;

        for _ in 1..self.layers.max(1) {
            stacked.push(RecurrentLayer::new(cell, bidirectional, d_input, self.d_hidden, device));
            if self.batch_norm {
                norms.push(BatchNormConfig::new(width).init(device));
            }
            d_input = width;
        }

        let last = RecurrentLayer::new(cell, bidirectional, d_input, self.d_hidden, device);
        SentenceEncoder { stacked, norms, last: Some(last), input_dropout }
    }

    /// Width of the vectors produced by `SentenceEncoder::forward`.
    pub fn output_size(&self) -> usize {
        match self.kind {
            EncoderKind::Summation => self.d_input,
            kind                   => kind.output_size(self.d_hidden),
        }
    }
}

#[derive(Module, Debug)]
pub struct SentenceEncoder<B: Backend> {
    stacked:       Vec<RecurrentLayer<B>>,
    norms:         Vec<BatchNorm<B, 1>>,
    /// None → summation
    last:          Option<RecurrentLayer<B>>,
    input_dropout: Dropout,
}

impl<B: Backend> SentenceEncoder<B> {
    /// tokens: [batch, seq_len, d_input] → [batch, output_size]
    pub fn forward(&self, tokens: Tensor<B, 3>) -> Tensor<B, 2> {
        let Some(last) = &self.last else {
            return tokens.sum_dim(1).squeeze::<2>(1);
        };

        let mut x = tokens;
        for (i, layer) in self.stacked.iter().enumerate() {
            x = layer.sequence(self.input_dropout.forward(x));
            if let Some(norm) = self.norms.get(i) {
                // BatchNorm normalises dim 1; features live on dim 2
                x = norm.forward(x.swap_dims(1, 2)).swap_dims(1, 2);
            }
        }
        last.last_state(self.input_dropout.forward(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use crate::domain::settings::CellKind;

    type B = NdArray;

    fn tokens(device: &<B as Backend>::Device) -> Tensor<B, 3> {
        Tensor::<B, 1>::from_floats(
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5],
            device,
        )
        .reshape([2, 3, 2])
    }

    #[test]
    fn test_summation_adds_time_steps() {
        let device  = Default::default();
        let encoder = SentenceEncoderConfig::new(EncoderKind::Summation, 2, 2).init::<B>(&device);
        let out: Vec<f32> = encoder.forward(tokens(&device)).into_data().to_vec().unwrap();
        assert_eq!(out, vec![9.0, 12.0, 1.5, 1.5]);
    }

    #[test]
    fn test_recurrent_output_widths() {
        let device = Default::default();
        for (cell, bidirectional, width) in [
            (CellKind::Lstm, false, 4),
            (CellKind::Gru,  false, 4),
            (CellKind::Lstm, true,  8),
            (CellKind::Gru,  true,  8),
        ] {
            let config = SentenceEncoderConfig::new(EncoderKind::Recurrent { cell, bidirectional }, 2, 4)
                .with_layers(2)
                .with_batch_norm(true);
            assert_eq!(config.output_size(), width);
            let out = config.init::<B>(&device).forward(tokens(&device));
            assert_eq!(out.dims(), [2, width]);
        }
    }

    #[test]
    fn test_stacking_builds_extra_layers() {
        let device = Default::default();
        let kind   = EncoderKind::Recurrent { cell: CellKind::Gru, bidirectional: true };
        let enc    = SentenceEncoderConfig::new(kind, 2, 3)
            .with_layers(3)
            .with_batch_norm(true)
            .init::<B>(&device);
        assert_eq!(enc.stacked.len(), 2);
        assert_eq!(enc.norms.len(), 2);
        assert!(enc.last.is_some());
    }

    #[test]
    fn test_last_state_matches_final_sequence_step() {
        let device = Default::default();
        let layer  = RecurrentLayer::<B>::new(CellKind::Lstm, false, 2, 3, &device);
        let x      = tokens(&device);

        let last: Vec<f32> = layer.last_state(x.clone()).into_data().to_vec().unwrap();
        let seq            = layer.sequence(x);
        let final_step: Vec<f32> = seq.slice([0..2, 2..3, 0..3]).into_data().to_vec().unwrap();
        assert_eq!(last, final_step);
    }
}
