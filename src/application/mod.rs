// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only. Each use case takes plain config
// values from Layer 1 and drives the data and ml layers:
//
//   train   TrainConfig → dataset → learner → curriculum loop
//   sample  base + length → generated rows, no model involved
//
// Numbers and tensors are never touched here directly.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The curriculum training workflow
pub mod train_use_case;

// Inspect generated problems
pub mod sample_use_case;
