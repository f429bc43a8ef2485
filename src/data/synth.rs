// ============================================================
// Layer 4 — Batch Synthesizer
// ============================================================
// Produces addition problems on demand. There is no fixed pool
// of samples: every training step draws fresh operands.
//
// Pipeline for one batch (number_length = L):
//
//   make_digits_random_length ×2   → a, b          [bs, L]
//   digits_to_numbers(a) + (b)     → sums
//   numbers_to_digits(sums, L + 1) → out           [bs, L + 1]
//   leading_zeros_to_padding       → a, b, out
//   hcat [a | sep | b | end | out | eos]           [bs, 3L + 4]
//   move_padding_to_end
//
// Example (base 10, L = 2, 7 + 3):
//   a   = [0, 7]      → [_, 7]
//   b   = [0, 3]      → [_, 3]
//   out = [0, 1, 0]   → [_, 1, 0]
//   row = _ 7 + _ 3 = _ 1 0 $   →   7 + 3 = 1 0 $ _ _ _
//
// Reference: rand crate documentation (Rng::gen_range)

use anyhow::{anyhow, ensure, Result};
use rand::Rng;

use crate::data::codec::{digits_to_numbers, numbers_to_digits};
use crate::domain::{grid::TokenGrid, vocab::TokenVocab};

/// `bs` rows of `max_number_length` uniform digits in `[0, base)`, each
/// with a leading prefix of random length in `[0, max_number_length)`
/// zeroed. The zeroed prefix turns a fixed-width field into a number of
/// variable length; at least the last digit is always drawn freely.
pub fn make_digits_random_length<R: Rng + ?Sized>(
    rng:               &mut R,
    bs:                usize,
    base:              u32,
    max_number_length: usize,
) -> TokenGrid {
    if max_number_length == 0 {
        return TokenGrid::filled(bs, 0, 0);
    }

    let mut data = Vec::with_capacity(bs * max_number_length);
    for _ in 0..bs {
        let zeroed = rng.gen_range(0..max_number_length);
        for col in 0..max_number_length {
            let digit = rng.gen_range(0..base);
            data.push(if col < zeroed { 0 } else { digit });
        }
    }
    TokenGrid::new(bs, max_number_length, data)
}

/// Replace the leading run of zeros in each row with `padding`.
///
/// The last column is never replaced, so the value zero stays a valid
/// one-digit number: `[0, 0, 0]` becomes `[_, _, 0]`.
pub fn leading_zeros_to_padding(digits: &TokenGrid, padding: u32) -> TokenGrid {
    digits.map_rows(|row| {
        let last    = row.len().saturating_sub(1);
        let leading = row.iter().take_while(|&&d| d == 0).count().min(last);

        let mut out = row.to_vec();
        out[..leading].fill(padding);
        out
    })
}

/// Stable partition of every row: non-padding tokens first in their
/// original order, then all padding tokens.
pub fn move_padding_to_end(tokens: &TokenGrid, padding: u32) -> TokenGrid {
    tokens.map_rows(|row| {
        let mut out: Vec<u32> = row.iter().copied().filter(|&t| t != padding).collect();
        out.resize(row.len(), padding);
        out
    })
}

/// Turn two operand grids into finished rows.
///
/// Both operands must have the same shape `[bs, L]`. The sum is encoded
/// with `L + 1` digits, which always fits two L-digit operands.
pub fn assemble_rows(
    in_digits0: &TokenGrid,
    in_digits1: &TokenGrid,
    vocab:      &TokenVocab,
) -> Result<TokenGrid> {
    ensure!(
        in_digits0.shape() == in_digits1.shape(),
        "operand grids differ in shape: {:?} vs {:?}",
        in_digits0.shape(),
        in_digits1.shape()
    );
    let bs     = in_digits0.rows();
    let width  = in_digits0.cols();
    let base   = vocab.base;

    let lhs  = digits_to_numbers(in_digits0, base)?;
    let rhs  = digits_to_numbers(in_digits1, base)?;
    let sums = lhs
        .iter()
        .zip(&rhs)
        .map(|(a, b)| a.checked_add(*b).ok_or_else(|| anyhow!("{a} + {b} overflows u64")))
        .collect::<Result<Vec<u64>>>()?;
    let out_digits = numbers_to_digits(&sums, base, width + 1)?;

    let out_digits = leading_zeros_to_padding(&out_digits, vocab.padding);
    let in_digits0 = leading_zeros_to_padding(in_digits0, vocab.padding);
    let in_digits1 = leading_zeros_to_padding(in_digits1, vocab.padding);

    let rows = TokenGrid::hcat(&[
        &in_digits0,
        &TokenGrid::filled(bs, 1, vocab.separator),
        &in_digits1,
        &TokenGrid::filled(bs, 1, vocab.end),
        &out_digits,
        &TokenGrid::filled(bs, 1, vocab.eos),
    ]);

    Ok(move_padding_to_end(&rows, vocab.padding))
}

/// A fresh batch of `bs` problems whose operands have up to
/// `number_length` digits. Rows are `3 * number_length + 4` wide.
pub fn synthesize_batch<R: Rng + ?Sized>(
    rng:           &mut R,
    bs:            usize,
    vocab:         &TokenVocab,
    number_length: usize,
) -> Result<TokenGrid> {
    let in_digits0 = make_digits_random_length(rng, bs, vocab.base, number_length);
    let in_digits1 = make_digits_random_length(rng, bs, vocab.base, number_length);
    let rows = assemble_rows(&in_digits0, &in_digits1, vocab)?;

    tracing::trace!("Synthesised batch {:?} at number length {}", rows.shape(), number_length);
    Ok(rows)
}
