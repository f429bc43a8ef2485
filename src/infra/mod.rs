// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong in any specific
// business layer:
//
//   config_file.rs loads a TrainConfig from JSON so a run can be
//                  described by a file instead of a long
//                  command line
//
//   progress.rs    indicatif progress bars for the training and
//                  validation phases of each epoch
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// JSON run configuration
pub mod config_file;

/// Per-phase progress bars
pub mod progress;
