// ============================================================
// Layer 5 — Activations and Classifier Dropout
// ============================================================
// Small building blocks shared by the model:
//
//   activate()          — applies the configured nonlinearity
//   ClassifierDropout   — standard or self-normalising (alpha)
//                         dropout between classifier layers
//
// Alpha dropout (Klambauer et al. 2017) drops units to the selu
// saturation value instead of zero, then applies an affine fix-up
// so the output keeps zero mean and unit variance:
//
//   α' = -λα                         (selu negative saturation)
//   x  = x·m + α'(1 - m)             m ~ Bernoulli(1 - p)
//   a  = ((1 - p)(1 + p·α'²))^(-1/2)
//   b  = -a·α'·p
//   y  = a·x + b
//
// Both dropouts are identity when the backend has no autodiff,
// i.e. on `model.valid()` during evaluation.

use burn::{
    module::Ignored,
    nn::DropoutConfig,
    prelude::*,
    tensor::{activation, Distribution},
};

use crate::domain::settings::{Activation, DropoutKind};

const SELU_ALPHA: f64 = 1.673_263_242_354_377_3;
const SELU_SCALE: f64 = 1.050_700_987_355_480_5;

/// Apply `kind` elementwise.
pub fn activate<B: Backend, const D: usize>(kind: Activation, x: Tensor<B, D>) -> Tensor<B, D> {
    match kind {
        Activation::Relu     => activation::relu(x),
        Activation::Elu      => elu(x, 1.0),
        Activation::Selu     => elu(x, SELU_ALPHA).mul_scalar(SELU_SCALE),
        Activation::Tanh     => activation::tanh(x),
        Activation::Sigmoid  => activation::sigmoid(x),
        Activation::Gelu     => activation::gelu(x),
        Activation::Softplus => activation::softplus(x, 1.0),
        Activation::Softsign => x.clone().div(x.abs().add_scalar(1.0)),
        // piecewise-linear: clamp(0.2x + 0.5, 0, 1)
        Activation::HardSigmoid => x.mul_scalar(0.2).add_scalar(0.5).clamp(0.0, 1.0),
        Activation::Exponential => x.exp(),
        Activation::Linear   => x,
    }
}

/// elu(x) = max(x, 0) + α(exp(min(x, 0)) - 1)
fn elu<B: Backend, const D: usize>(x: Tensor<B, D>, alpha: f64) -> Tensor<B, D> {
    let negative = x.clone().clamp_max(0.0).exp().sub_scalar(1.0).mul_scalar(alpha);
    x.clamp_min(0.0) + negative
}

/// Dropout applied after every classifier layer.
#[derive(Module, Clone, Debug)]
pub struct ClassifierDropout {
    prob: f64,
    kind: Ignored<DropoutKind>,
}

impl ClassifierDropout {
    pub fn new(kind: DropoutKind, prob: f64) -> Self {
        Self { prob, kind: Ignored(kind) }
    }

    pub fn forward<B: Backend, const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        match *self.kind {
            DropoutKind::Alpha    => alpha_dropout(input, self.prob),
            DropoutKind::Standard => DropoutConfig::new(self.prob).init().forward(input),
        }
    }
}

fn alpha_dropout<B: Backend, const D: usize>(input: Tensor<B, D>, prob: f64) -> Tensor<B, D> {
    if !B::ad_enabled() || prob == 0.0 {
        return input;
    }

    let keep    = 1.0 - prob;
    let alpha_p = -SELU_ALPHA * SELU_SCALE;
    let a       = (keep * (1.0 + prob * alpha_p * alpha_p)).powf(-0.5);
    let b       = -a * alpha_p * prob;

    let mask    = input.random_like(Distribution::Bernoulli(keep));
    let dropped = mask.clone().neg().add_scalar(1.0).mul_scalar(alpha_p);

    (input * mask + dropped).mul_scalar(a).add_scalar(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type B = NdArray;

    fn values<const D: usize>(t: Tensor<B, D>) -> Vec<f32> {
        t.into_data().to_vec().unwrap()
    }

    fn input() -> Tensor<B, 1> {
        Tensor::from_floats([-2.0, -0.5, 0.0, 1.5], &Default::default())
    }

    #[test]
    fn test_relu_and_linear() {
        assert_eq!(values(activate(Activation::Relu, input())), vec![0.0, 0.0, 0.0, 1.5]);
        assert_eq!(values(activate(Activation::Linear, input())), vec![-2.0, -0.5, 0.0, 1.5]);
    }

    #[test]
    fn test_softsign_hard_sigmoid_and_exponential() {
        assert_eq!(
            values(activate(Activation::Softsign, input())),
            vec![-2.0 / 3.0, -0.5 / 1.5, 0.0, 1.5 / 2.5]
        );
        let hard = values(activate(Activation::HardSigmoid, Tensor::<B, 1>::from_floats(
            [-3.0, -1.0, 0.0, 1.0, 3.0],
            &Default::default(),
        )));
        let expected = [0.0, 0.3, 0.5, 0.7, 1.0];
        assert!(hard.iter().zip(expected).all(|(h, e)| (h - e).abs() < 1e-6));
        let exp = values(activate(Activation::Exponential, input()));
        assert!((exp[0] - (-2.0f32).exp()).abs() < 1e-6);
        assert_eq!(exp[2], 1.0);
    }

    #[test]
    fn test_elu_saturates_below_zero() {
        let out = values(activate(Activation::Elu, input()));
        assert!((out[0] - ((-2.0f32).exp() - 1.0)).abs() < 1e-6);
        assert_eq!(out[3], 1.5);
    }

    #[test]
    fn test_selu_scales_positive_side() {
        let out = values(activate(Activation::Selu, input()));
        assert!((out[3] - 1.5 * SELU_SCALE as f32).abs() < 1e-6);
        assert!(out[0] < 0.0 && out[0] > -(SELU_ALPHA * SELU_SCALE) as f32);
    }

    #[test]
    fn test_dropouts_are_identity_without_autodiff() {
        for kind in [DropoutKind::Standard, DropoutKind::Alpha] {
            let dropout = ClassifierDropout::new(kind, 0.5);
            assert_eq!(values(dropout.forward(input())), values(input()));
        }
    }

    #[test]
    fn test_alpha_dropout_changes_values_in_training() {
        let device  = Default::default();
        let dropout = ClassifierDropout::new(DropoutKind::Alpha, 0.5);
        let x       = Tensor::<Autodiff<B>, 2>::ones([64, 64], &device);
        let out: Vec<f32> = dropout.forward(x).into_data().to_vec().unwrap();

        // Every unit is either a·1 + b or a·α' + b, never the raw input
        let keep    = 0.5;
        let alpha_p = -SELU_ALPHA * SELU_SCALE;
        let a       = (keep * (1.0 + 0.5 * alpha_p * alpha_p)).powf(-0.5);
        let b       = -a * alpha_p * 0.5;
        let kept    = (a + b) as f32;
        let dropped = (a * alpha_p + b) as f32;
        assert!(out.iter().all(|&v| (v - kept).abs() < 1e-4 || (v - dropped).abs() < 1e-4));
        assert!(out.iter().any(|&v| (v - dropped).abs() < 1e-4));
    }
}
