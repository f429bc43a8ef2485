// ============================================================
// Layer 4 — Digit Codec
// ============================================================
// Converts between integers and digit sequences.
//
// Two flavours:
//   Scalar   int_to_digits / digits_to_int
//            least-significant digit first, variable length
//   Batched  numbers_to_digits / digits_to_numbers
//            one number per grid row, fixed width, RIGHT aligned
//
// Right alignment example (base 10, max_length 3):
//   [10, 2]  →  [[0, 1, 0],
//                [0, 0, 2]]
//
// Column i carries positional weight base^(max_length - 1 - i),
// so column 0 is the most significant digit.
//
// All arithmetic is u64 and checked. A tensor library would wrap
// silently once base^max_length leaves the integer range; here the
// caller gets an error naming the offending width instead.

use anyhow::{anyhow, Result};

use crate::domain::grid::TokenGrid;

/// Digits of `n` in `base`, least significant first. `0` encodes as `[0]`.
///
/// # Panics
/// Panics if `base < 2` (base 1 never terminates, base 0 divides by zero).
pub fn int_to_digits(mut n: u64, base: u32) -> Vec<u32> {
    assert!(base >= 2, "base must be at least 2, got {base}");
    let b = u64::from(base);

    let mut digits = Vec::new();
    while n > 0 {
        digits.push((n % b) as u32);
        n /= b;
    }
    if digits.is_empty() {
        digits.push(0);
    }
    digits
}

/// Inverse of [`int_to_digits`]: reads the least-significant-first list in
/// reverse, accumulating `n = n * base + digit`.
pub fn digits_to_int(digits: &[u32], base: u32) -> Result<u64> {
    let b = u64::from(base);
    digits.iter().rev().try_fold(0u64, |n, &d| {
        n.checked_mul(b)
            .and_then(|n| n.checked_add(u64::from(d)))
            .ok_or_else(|| anyhow!("{} base-{base} digits overflow u64", digits.len()))
    })
}

/// `[base^(len-1), ..., base^1, base^0]`.
pub fn positional_weights(base: u32, len: usize) -> Result<Vec<u64>> {
    let b = u64::from(base);
    (0..len)
        .rev()
        .map(|exp| {
            u32::try_from(exp)
                .ok()
                .and_then(|e| b.checked_pow(e))
                .ok_or_else(|| anyhow!("base {base} to the power {exp} overflows u64"))
        })
        .collect()
}

/// Encode each number as one right-aligned row of `max_length` digits.
///
/// A number wider than `max_length` keeps only its low `max_length` digits,
/// exactly what the positional formula `(n / weight) % base` yields.
pub fn numbers_to_digits(numbers: &[u64], base: u32, max_length: usize) -> Result<TokenGrid> {
    let weights = positional_weights(base, max_length)?;
    let b       = u64::from(base);

    let data: Vec<u32> = numbers
        .iter()
        .flat_map(|&n| weights.iter().map(move |&w| ((n / w) % b) as u32))
        .collect();

    Ok(TokenGrid::new(numbers.len(), max_length, data))
}

/// Decode each right-aligned digit row back into its value.
pub fn digits_to_numbers(digits: &TokenGrid, base: u32) -> Result<Vec<u64>> {
    let weights = positional_weights(base, digits.cols())?;

    digits
        .iter_rows()
        .map(|row| {
            row.iter().zip(&weights).try_fold(0u64, |acc, (&d, &w)| {
                u64::from(d)
                    .checked_mul(w)
                    .and_then(|term| acc.checked_add(term))
                    .ok_or_else(|| anyhow!("row value overflows u64 in base {base}"))
            })
        })
        .collect()
}
