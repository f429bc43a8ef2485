// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training driver never touches tensors. Everything it
// needs from the model goes through `Learner`, so the epoch and
// curriculum logic can run against a scripted stand-in in tests
// and against the burn model in production.
//
// Implementations:
//   - BurnLearner     → ml::learner, transformer / LSTM on any backend
//   - ScriptedLearner → ml::trainer tests, replays fixed accuracies
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::{grid::TokenGrid, vocab::TokenVocab};

// ─── Learner ──────────────────────────────────────────────────────────────────
/// The model-side contract of one training run.
///
/// Batches arrive as host token grids of shape `[batch, seq]`; moving them
/// to the model's device is the implementation's job.
pub trait Learner {
    /// Forward, backward and one optimiser step. Returns the batch loss.
    fn training_step(&mut self, batch: &TokenGrid, batch_idx: usize) -> Result<f64>;

    /// Gradient-free evaluation. Returns the fraction of rows whose
    /// whole answer was predicted correctly, in `[0, 1]`.
    fn validation_step(&mut self, batch: &TokenGrid, batch_idx: usize) -> Result<f64>;

    /// Print a few rows next to the model's predictions.
    fn print_examples(&mut self, examples: &TokenGrid, vocab: &TokenVocab) -> Result<()>;
}
