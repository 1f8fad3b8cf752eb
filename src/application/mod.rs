// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal:
// training a classifier, or classifying a sentence pair with a
// trained one.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination

// The training workflow and the experiment configuration
pub mod train_use_case;

// Reloading a run and classifying a premise / hypothesis pair
pub mod predict_use_case;
