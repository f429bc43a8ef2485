// ============================================================
// Layer 4 — Addition Batcher
// ============================================================
// Converts a host TokenGrid into device tensors for next-token
// prediction.
//
// How batching works here:
//   Input:  TokenGrid [N, S]   rows from AdditionDataset
//   Output: AdditionBatch with tensors of shape [N, S - 1]
//
//   inputs  = row[0 .. S-1]    what the model reads
//   targets = row[1 .. S]      what it must predict at each step
//   mask    = 1 where the target belongs to the answer region
//
// The answer region is every token after `end` up to and
// including `eos`. Operand tokens are random, so predicting them
// carries no signal; padding after eos carries none either.
//
//   row     7  +  3  =  1  0  $  _  _  _
//   target     +  3  =  1  0  $  _  _  _
//   mask       0  0  0  1  1  1  0  0  0
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use burn::prelude::*;

use crate::domain::{grid::TokenGrid, vocab::TokenVocab};

// ─── AdditionBatch ────────────────────────────────────────────────────────────
/// One batch ready for the model forward pass.
/// All tensors have batch_size as their first dimension.
#[derive(Debug, Clone)]
pub struct AdditionBatch<B: Backend> {
    /// Model input, shape [batch_size, seq - 1]
    pub inputs: Tensor<B, 2, Int>,

    /// Next-token targets, shape [batch_size, seq - 1]
    pub targets: Tensor<B, 2, Int>,

    /// 1 where the target is part of the answer, else 0
    /// shape: [batch_size, seq - 1]
    pub answer_mask: Tensor<B, 2, Int>,
}

// ─── AdditionBatcher ──────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on the model's GPU/CPU.
#[derive(Clone, Debug)]
pub struct AdditionBatcher<B: Backend> {
    pub device: B::Device,
    vocab:      TokenVocab,
}

impl<B: Backend> AdditionBatcher<B> {
    pub fn new(device: B::Device, vocab: TokenVocab) -> Self {
        Self { device, vocab }
    }

    /// Split every row into shifted inputs / targets and build the mask.
    ///
    /// # Panics
    /// Panics if the grid has fewer than two columns.
    pub fn batch(&self, grid: &TokenGrid) -> AdditionBatch<B> {
        let [batch_size, seq] = grid.shape();
        assert!(seq >= 2, "rows need at least two tokens, got {seq}");
        let steps = seq - 1;

        let mut inputs  = Vec::with_capacity(batch_size * steps);
        let mut targets = Vec::with_capacity(batch_size * steps);
        let mut mask    = Vec::with_capacity(batch_size * steps);

        for row in grid.iter_rows() {
            inputs.extend(row[..steps].iter().map(|&t| t as i32));
            targets.extend(row[1..].iter().map(|&t| t as i32));
            mask.extend(answer_mask_row(row, &self.vocab).into_iter().skip(1));
        }

        AdditionBatch {
            inputs:      self.to_tensor(&inputs, batch_size, steps),
            targets:     self.to_tensor(&targets, batch_size, steps),
            answer_mask: self.to_tensor(&mask, batch_size, steps),
        }
    }

    fn to_tensor(&self, flat: &[i32], rows: usize, cols: usize) -> Tensor<B, 2, Int> {
        Tensor::<B, 1, Int>::from_ints(flat, &self.device).reshape([rows, cols])
    }
}

/// 1 for every position strictly after `end` up to and including `eos`.
/// A row missing either marker gets an all-zero mask.
pub fn answer_mask_row(row: &[u32], vocab: &TokenVocab) -> Vec<i32> {
    let end = row.iter().position(|&t| t == vocab.end);
    let eos = row.iter().position(|&t| t == vocab.eos);

    match (end, eos) {
        (Some(end), Some(eos)) if end < eos => (0..row.len())
            .map(|i| i32::from(i > end && i <= eos))
            .collect(),
        _ => vec![0; row.len()],
    }
}
