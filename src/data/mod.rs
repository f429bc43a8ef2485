// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between "a random number generator" and
// device-ready tensor batches.
//
// The pipeline flows in this order:
//
//   codec             → integers ⇄ right-aligned digit rows
//       │
//       ▼
//   synth             → random operands, sums, padding rules,
//       │               row assembly
//       ▼
//   AdditionDataset   → base, current number length, bounds,
//       │               generate_batch
//       ▼
//   AdditionBatcher   → shifted inputs / targets / answer mask
//                       as burn Int tensors
//
// Nothing here is persisted: every batch is generated fresh
// and dropped after its training step.
//
// Reference: Burn Book §4 (Datasets and Batchers)
//            Rust Book §13 (Iterators and Closures)

/// Integer ⇄ digit sequence conversions
pub mod codec;

/// Operand generation and row assembly
pub mod synth;

/// Curriculum-aware dataset of addition problems
pub mod dataset;

/// Turns token grids into burn tensor batches
pub mod batcher;
