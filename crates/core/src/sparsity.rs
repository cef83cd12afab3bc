use ndarray::Array2;
use thiserror::Error;

/// Positions of the potentially nonzero entries of a derivative matrix.
///
/// Handed to a solver alongside a Hessian or Jacobian provider so it can
/// allocate sparse storage instead of a dense matrix. Entries are kept sorted
/// in row-major order without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparsityPattern {
    nrows: usize,
    ncols: usize,
    entries: Vec<(usize, usize)>,
}

/// Errors that can occur when building a sparsity pattern.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SparsityError {
    #[error("entry ({row}, {col}) lies outside a {nrows}x{ncols} pattern")]
    OutOfBounds {
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },
}

impl SparsityPattern {
    /// Creates a pattern from `(row, col)` entries.
    ///
    /// Entries may be given in any order and may repeat.
    ///
    /// # Errors
    ///
    /// Returns [`SparsityError::OutOfBounds`] if an entry falls outside the
    /// `nrows` by `ncols` shape.
    pub fn new<I>(nrows: usize, ncols: usize, entries: I) -> Result<Self, SparsityError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut entries: Vec<_> = entries.into_iter().collect();

        if let Some(&(row, col)) = entries.iter().find(|&&(r, c)| r >= nrows || c >= ncols) {
            return Err(SparsityError::OutOfBounds {
                row,
                col,
                nrows,
                ncols,
            });
        }

        entries.sort_unstable();
        entries.dedup();

        Ok(Self {
            nrows,
            ncols,
            entries,
        })
    }

    /// Creates a pattern in which every entry may be nonzero.
    #[must_use]
    pub fn dense(nrows: usize, ncols: usize) -> Self {
        let entries = (0..nrows)
            .flat_map(|r| (0..ncols).map(move |c| (r, c)))
            .collect();

        Self {
            nrows,
            ncols,
            entries,
        }
    }

    /// Creates a pattern from the nonzero entries of a sample matrix.
    #[must_use]
    pub fn from_dense(matrix: &Array2<f64>) -> Self {
        let (nrows, ncols) = matrix.dim();
        let entries = matrix
            .indexed_iter()
            .filter(|&(_, value)| *value != 0.0)
            .map(|(index, _)| index)
            .collect();

        Self {
            nrows,
            ncols,
            entries,
        }
    }

    /// Returns `(nrows, ncols)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Returns the number of structurally nonzero entries.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn entries(&self) -> &[(usize, usize)] {
        &self.entries
    }

    /// Returns `true` if `(row, col)` may be nonzero.
    #[must_use]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.entries.binary_search(&(row, col)).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    #[test]
    fn entries_are_sorted_and_deduplicated() {
        let pattern = SparsityPattern::new(3, 3, [(2, 1), (0, 0), (2, 1), (1, 2)]).unwrap();

        assert_eq!(pattern.entries(), &[(0, 0), (1, 2), (2, 1)]);
        assert_eq!(pattern.nnz(), 3);
        assert!(pattern.contains(1, 2));
        assert!(!pattern.contains(2, 2));
    }

    #[test]
    fn out_of_bounds_entry_is_rejected() {
        let err = SparsityPattern::new(2, 3, [(0, 1), (1, 3)]).unwrap_err();

        assert_eq!(
            err,
            SparsityError::OutOfBounds {
                row: 1,
                col: 3,
                nrows: 2,
                ncols: 3
            }
        );
        assert_eq!(err.to_string(), "entry (1, 3) lies outside a 2x3 pattern");
    }

    #[test]
    fn dense_pattern_covers_every_entry() {
        let pattern = SparsityPattern::dense(2, 2);

        assert_eq!(pattern.shape(), (2, 2));
        assert_eq!(pattern.entries(), &[(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn pattern_from_tridiagonal_sample() {
        let sample = array![[2.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 2.0]];
        let pattern = SparsityPattern::from_dense(&sample);

        assert_eq!(pattern.nnz(), 7);
        assert!(pattern.contains(0, 1));
        assert!(!pattern.contains(0, 2));
        assert!(!pattern.contains(2, 0));
    }
}
