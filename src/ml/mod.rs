// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model and optimiser code lives here. The data layer
// only builds tensors; the domain layer never sees burn at all.
//
// What's in this layer:
//
//   model.rs      AdditionNet. Token embedding, then LSTM layers,
//                 causal attention blocks, or both (kind), then a
//                 projection onto the vocabulary. Also the masked
//                 loss and the whole-answer accuracy.
//
//   learner.rs    BurnLearner, implements the Learner trait with
//                 forward, backward and Adam steps on any
//                 AutodiffBackend
//
//   curriculum.rs threshold check and time-to-success table
//
//   trainer.rs    the epoch loop that drives a Learner and
//                 advances the curriculum
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Sequence model architecture
pub mod model;

/// Burn implementation of the Learner contract
pub mod learner;

/// Promotion policy and per-length epoch counts
pub mod curriculum;

/// Epoch loop with curriculum control
pub mod trainer;
