// ============================================================
// Layer 2 — SampleUseCase
// ============================================================
// Generates a handful of addition problems without touching a
// model, so the row layout can be inspected by eye:
//
//   tokens:  7 10 3 11 1 0 13 12 12 12
//   decoded: 7+3=10
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};

use crate::data::dataset::AdditionDataset;

/// One generated row in both of its forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRow {
    pub tokens:  Vec<u32>,
    pub decoded: String,
}

pub struct SampleUseCase {
    dataset: AdditionDataset,
    seed:    u64,
}

impl SampleUseCase {
    pub fn new(base: u32, number_length: usize, seed: u64) -> Result<Self> {
        let dataset = AdditionDataset::new(0, base, number_length)?;
        Ok(Self { dataset, seed })
    }

    pub fn dataset(&self) -> &AdditionDataset {
        &self.dataset
    }

    /// `count` rows drawn from a fresh generator seeded with `seed`.
    pub fn execute(&self, count: usize) -> Result<Vec<SampleRow>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let grid    = self.dataset.generate_batch(&mut rng, count)?;

        tracing::debug!(
            "Sampled {} rows of width {} (base={} length={})",
            grid.rows(),
            grid.cols(),
            self.dataset.base(),
            self.dataset.number_length()
        );

        Ok(grid
            .iter_rows()
            .map(|row| SampleRow {
                tokens:  row.to_vec(),
                decoded: self.dataset.decode_row(row),
            })
            .collect())
    }
}
