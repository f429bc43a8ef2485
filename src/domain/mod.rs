// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types shared by every other layer.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Fixed-shape token matrix used for digits, rows and masks
pub mod grid;

// Digit ids and the four reserved tokens
pub mod vocab;

// The model-side contract the training driver runs against
pub mod traits;
