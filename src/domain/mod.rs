// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing the NLI
// experiment: labelled sentence pairs and the experiment
// settings chosen on the command line.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

// A labelled premise / hypothesis pair
pub mod example;

// Hyperparameter choices (activation, optimizer, encoder, ...)
pub mod settings;

// Core abstractions (traits) that other layers implement
pub mod traits;
