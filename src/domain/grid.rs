// ============================================================
// Layer 3 — TokenGrid Domain Type
// ============================================================
// A fixed-shape, row-major matrix of token ids.
//
// The same type carries three kinds of data through the pipeline:
//   - digit matrices        (one number per row, right aligned)
//   - assembled batch rows  ([a | sep | b | end | sum | eos] + padding)
//   - answer masks          (1 where the loss is taken, 0 elsewhere)
//
// Every row has exactly `cols` entries, so a grid maps 1:1 onto a
// [rows, cols] Int tensor in the batcher.
//
// Reference: Rust Book §8 (Vectors), §5 (Structs and Methods)

/// A `rows × cols` matrix of `u32` stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrid {
    rows: usize,
    cols: usize,
    data: Vec<u32>,
}

impl TokenGrid {
    /// Wrap a flat buffer.
    ///
    /// # Panics
    /// Panics if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<u32>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "grid buffer has {} values, expected {}x{}",
            data.len(),
            rows,
            cols
        );
        Self { rows, cols, data }
    }

    /// A grid where every cell holds `value`.
    pub fn filled(rows: usize, cols: usize, value: u32) -> Self {
        Self { rows, cols, data: vec![value; rows * cols] }
    }

    /// Build a grid from nested rows.
    ///
    /// # Panics
    /// Panics if the rows are not all the same length.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        let n    = rows.len();
        let mut data = Vec::with_capacity(n * cols);
        for row in rows {
            assert_eq!(row.len(), cols, "ragged rows: {} vs {}", row.len(), cols);
            data.extend(row);
        }
        Self { rows: n, cols, data }
    }

    pub fn rows(&self) -> usize { self.rows }

    pub fn cols(&self) -> usize { self.cols }

    /// `[rows, cols]`, the shape of the tensor this grid becomes.
    pub fn shape(&self) -> [usize; 2] { [self.rows, self.cols] }

    pub fn row(&self, i: usize) -> &[u32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[u32]> {
        // chunks_exact(0) panics, and a zero-width grid has no cells anyway
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    pub fn as_slice(&self) -> &[u32] { &self.data }


    /// Apply `f` to every row, producing a grid of the same shape.
    pub fn map_rows<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&[u32]) -> Vec<u32>,
    {
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.iter_rows() {
            let mapped = f(row);
            assert_eq!(mapped.len(), self.cols, "map_rows must keep the row width");
            data.extend(mapped);
        }
        Self { rows: self.rows, cols: self.cols, data }
    }

    /// Column-wise concatenation of grids with equal row counts.
    ///
    /// # Panics
    /// Panics if the row counts differ.
    pub fn hcat(parts: &[&TokenGrid]) -> Self {
        let rows = parts.first().map_or(0, |p| p.rows);
        assert!(
            parts.iter().all(|p| p.rows == rows),
            "hcat needs equal row counts"
        );
        let cols = parts.iter().map(|p| p.cols).sum();

        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for part in parts {
                data.extend_from_slice(part.row(r));
            }
        }
        Self { rows, cols, data }
    }

    /// Right-fill every row with `value` up to `cols` columns.
    /// A grid that is already at least that wide is returned unchanged.
    pub fn pad_cols(self, cols: usize, value: u32) -> Self {
        if cols <= self.cols {
            return self;
        }
        let filler = Self::filled(self.rows, cols - self.cols, value);
        Self::hcat(&[&self, &filler])
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hcat_joins_rows_in_order() {
        let a = TokenGrid::from_rows(vec![vec![1, 2], vec![3, 4]]);
        let b = TokenGrid::filled(2, 1, 9);
        let c = TokenGrid::hcat(&[&a, &b, &a]);

        assert_eq!(c.shape(), [2, 5]);
        assert_eq!(c.row(0), &[1, 2, 9, 1, 2]);
        assert_eq!(c.row(1), &[3, 4, 9, 3, 4]);
    }

    #[test]
    fn test_pad_cols_only_grows() {
        let g = TokenGrid::from_rows(vec![vec![1, 2, 3]]);
        assert_eq!(g.clone().pad_cols(2, 0), g);

        let wide = g.pad_cols(5, 7);
        assert_eq!(wide.row(0), &[1, 2, 3, 7, 7]);
    }

    #[test]
    fn test_iter_rows_matches_row() {
        let g = TokenGrid::new(3, 2, vec![0, 1, 2, 3, 4, 5]);
        let rows: Vec<&[u32]> = g.iter_rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], g.row(2));
    }

    #[test]
    #[should_panic]
    fn test_ragged_rows_rejected() {
        let _ = TokenGrid::from_rows(vec![vec![1, 2], vec![3]]);
    }
}
