use anyhow::{ensure, Result};
use rand::Rng;

use crate::data::{codec::int_to_digits, synth::synthesize_batch};
use crate::domain::{grid::TokenGrid, vocab::TokenVocab};

/// Number of operands per problem.
pub const SEQUENCE_LENGTH: usize = 2;

/// Addition problems of a configurable base and operand length.
///
/// Batches are generated on demand, so `len` is a nominal epoch size only.
/// The curriculum moves the operand length forward through
/// [`AdditionDataset::with_number_length`]; the bounds below are always
/// derived from the current length, never cached.
#[derive(Debug, Clone)]
pub struct AdditionDataset {
    num_samples:   usize,
    number_length: usize,
    vocab:         TokenVocab,
}

impl AdditionDataset {
    pub fn new(num_samples: usize, base: u32, number_length: usize) -> Result<Self> {
        ensure!(base >= 2, "base must be at least 2, got {base}");
        ensure!(number_length >= 1, "number length must be at least 1");
        Ok(Self { num_samples, number_length, vocab: TokenVocab::new(base) })
    }

    /// The same dataset with operands of up to `number_length` digits.
    pub fn with_number_length(&self, number_length: usize) -> Self {
        Self { number_length: number_length.max(1), ..self.clone() }
    }

    pub fn base(&self) -> u32 { self.vocab.base }

    pub fn number_length(&self) -> usize { self.number_length }

    pub fn sequence_length(&self) -> usize { SEQUENCE_LENGTH }

    pub fn vocab(&self) -> &TokenVocab { &self.vocab }

    pub fn len(&self) -> usize { self.num_samples }

    pub fn is_empty(&self) -> bool { self.num_samples == 0 }

    /// Operand digits plus one marker per operand.
    pub fn max_input_length(&self) -> usize {
        self.sequence_length() * (self.number_length + 1)
    }

    /// Digits of the largest possible sum bound, `SEQUENCE_LENGTH * base^L`,
    /// plus the eos token.
    pub fn max_output_length(&self) -> usize {
        // base^L is a one followed by L zeros, so multiplying it by
        // SEQUENCE_LENGTH just appends those zeros to SEQUENCE_LENGTH's digits.
        // Counting that way never materialises base^L.
        int_to_digits(SEQUENCE_LENGTH as u64, self.vocab.base).len() + self.number_length + 1
    }

    /// Width of every generated row.
    pub fn seq(&self) -> usize {
        self.max_input_length() + self.max_output_length()
    }

    /// `bs` fresh problems as a `[bs, seq]` token grid.
    ///
    /// Assembled rows are `3L + 4` tokens; in base 2 the output bound has
    /// one extra digit, and the surplus column is filled with padding.
    pub fn generate_batch<R: Rng + ?Sized>(&self, rng: &mut R, bs: usize) -> Result<TokenGrid> {
        let rows = synthesize_batch(rng, bs, &self.vocab, self.number_length)?;
        Ok(rows.pad_cols(self.seq(), self.vocab.padding))
    }

    /// Render one row as `a+b=c`, dropping padding and the eos marker.
    pub fn decode_row(&self, row: &[u32]) -> String {
        row.iter()
            .filter(|&&t| t != self.vocab.padding && t != self.vocab.eos)
            .map(|&t| self.vocab.render(t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_bounds_base_ten() {
        let ds = AdditionDataset::new(1_000, 10, 1).unwrap();
        assert_eq!(ds.max_input_length(), 4);
        assert_eq!(ds.max_output_length(), 3);
        assert_eq!(ds.seq(), 7);

        let ds = ds.with_number_length(3);
        assert_eq!(ds.max_input_length(), 8);
        assert_eq!(ds.max_output_length(), 5);
        assert_eq!(ds.seq(), 13);
    }

    #[test]
    fn test_output_bound_matches_direct_count() {
        for base in [2u32, 3, 10, 16] {
            for len in 1..8usize {
                let ds     = AdditionDataset::new(1, base, len).unwrap();
                let bound  = SEQUENCE_LENGTH as u64 * u64::from(base).pow(len as u32);
                let direct = int_to_digits(bound, base).len() + 1;
                assert_eq!(ds.max_output_length(), direct, "base={base} len={len}");
            }
        }
    }

    #[test]
    fn test_batch_shape_follows_seq() {
        let mut rng = StdRng::seed_from_u64(0);
        for base in [2u32, 10] {
            for len in 1..5 {
                let ds = AdditionDataset::new(10, base, len).unwrap();
                for bs in [1, 2, 17] {
                    let batch = ds.generate_batch(&mut rng, bs).unwrap();
                    assert_eq!(batch.shape(), [bs, ds.seq()]);
                }
            }
        }
    }

    #[test]
    fn test_rows_hold_one_of_each_marker() {
        let mut rng = StdRng::seed_from_u64(1);
        let ds      = AdditionDataset::new(10, 2, 3).unwrap();
        let v       = *ds.vocab();
        let batch   = ds.generate_batch(&mut rng, 64).unwrap();

        for row in batch.iter_rows() {
            let count = |tok: u32| row.iter().filter(|&&t| t == tok).count();
            assert_eq!(count(v.separator), 1);
            assert_eq!(count(v.end), 1);
            assert_eq!(count(v.eos), 1);

            let first_pad = row.iter().position(|&t| t == v.padding).unwrap_or(row.len());
            assert!(row[first_pad..].iter().all(|&t| t == v.padding));
        }
    }

    #[test]
    fn test_with_number_length_keeps_the_rest() {
        let ds   = AdditionDataset::new(500, 16, 1).unwrap();
        let next = ds.with_number_length(2);
        assert_eq!(next.number_length(), 2);
        assert_eq!(next.base(), 16);
        assert_eq!(next.len(), 500);
        assert_eq!(ds.number_length(), 1);
    }

    #[test]
    fn test_decode_row() {
        let ds  = AdditionDataset::new(1, 10, 2).unwrap();
        let v   = *ds.vocab();
        let row = [7, v.separator, 3, v.end, 1, 0, v.eos, v.padding, v.padding, v.padding];
        assert_eq!(ds.decode_row(&row), "7+3=10");
    }

    #[test]
    fn test_invalid_construction() {
        assert!(AdditionDataset::new(1, 1, 1).is_err());
        assert!(AdditionDataset::new(1, 10, 0).is_err());
    }
}
