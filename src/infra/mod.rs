// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem on behalf of the
// other layers:
//
//   embedding_store.rs — builds the vocabulary-indexed embedding
//                        matrix from a GloVe text file and caches
//                        it as safetensors
//
//   checkpoint.rs      — best-epoch checkpoint in a temporary
//                        directory, plus the persistent run store
//                        (config, vocabulary, final weights)
//
//   metrics.rs         — per-epoch CSV log and the run history JSON

/// Pretrained embedding matrix construction and caching
pub mod embedding_store;

/// Model checkpoints and the run output directory
pub mod checkpoint;

/// Training metrics CSV logger and history
pub mod metrics;
