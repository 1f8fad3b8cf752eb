// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model and training code lives in this layer.
//
//   layers.rs     — activations and the dropout flavours used
//                   between classifier layers (standard / alpha)
//
//   encoder.rs    — the sentence encoder: summation over time or
//                   stacked (bi)LSTM / (bi)GRU returning the last state
//
//   model.rs      — the sentence-pair classifier: shared embedding,
//                   projection and encoder for both sentences, then
//                   a three-layer feed-forward classifier
//
//   trainer.rs    — the training loop with validation-based
//                   checkpointing and the final test evaluation
//
//   inferencer.rs — reloads a finished run and classifies one pair
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Bowman et al. (2015) A large annotated corpus for
//            learning natural language inference

/// Activations and dropout variants
pub mod layers;

/// Summation and recurrent sentence encoders
pub mod encoder;

/// Sentence-pair classifier architecture
pub mod model;

/// Training loop with checkpointing and test evaluation
pub mod trainer;

/// Inference engine, loads a run and classifies pairs
pub mod inferencer;
