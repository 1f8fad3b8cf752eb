// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the SNLI .jsonl files to tensor batches.
//
//   snli_1.0_*.jsonl
//       │
//       ▼
//   SnliCorpus        → streams labelled records, skips "-" labels
//       │               (binary parses flattened by the parser)
//       ▼
//   Vocabulary        → token → index, fitted on training text only
//       │
//       ▼
//   SequenceEncoder   → fixed-length rows, left-padded with 0
//       │
//       ▼
//   NliDataset        → implements Burn's Dataset trait
//       │
//       ▼
//   NliBatcher        → stacks items into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Flattens SNLI binary parse strings into tokens
pub mod parser;

/// Streams labelled sentence pairs from SNLI .jsonl files
pub mod loader;

/// Frequency-ranked word → index mapping
pub mod vocabulary;

/// Pads / truncates token indices to a fixed length
pub mod sequence;

/// Implements Burn's Dataset trait for encoded pairs
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
