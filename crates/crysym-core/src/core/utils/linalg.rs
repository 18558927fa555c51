use nalgebra::{DMatrix, DVector};

/// Reduced row echelon form of an augmented linear system `A·x = b`.
#[derive(Debug, Clone)]
pub struct ReducedSystem {
    matrix: DMatrix<f64>,
    rhs: DVector<f64>,
    pivots: Vec<(usize, usize)>,
}

impl ReducedSystem {
    /// The `(row, column)` position of every pivot, in the order they were chosen.
    pub fn pivots(&self) -> &[(usize, usize)] {
        &self.pivots
    }

    pub fn rank(&self) -> usize {
        self.pivots.len()
    }

    pub fn is_pivot_column(&self, column: usize) -> bool {
        self.pivots.iter().any(|&(_, c)| c == column)
    }

    /// Columns without a pivot, in ascending order. These span the null space.
    pub fn free_columns(&self) -> Vec<usize> {
        (0..self.matrix.ncols())
            .filter(|&column| !self.is_pivot_column(column))
            .collect()
    }

    pub fn coefficient(&self, row: usize, column: usize) -> f64 {
        self.matrix[(row, column)]
    }

    pub fn rhs(&self, row: usize) -> f64 {
        self.rhs[row]
    }

    /// Largest right-hand side left on a row with no pivot; zero for a consistent system.
    pub fn residual(&self) -> f64 {
        (self.rank()..self.rhs.len())
            .map(|row| self.rhs[row].abs())
            .fold(0.0, f64::max)
    }
}

/// Gauss-Jordan elimination with partial pivoting.
///
/// Columns are visited in `column_order`; the first columns of that order are the
/// preferred pivots, so they end up dependent and the columns visited last stay free.
/// Candidate pivots smaller than `pivot_tolerance` in magnitude are treated as zero.
pub fn reduce(
    mut matrix: DMatrix<f64>,
    mut rhs: DVector<f64>,
    column_order: &[usize],
    pivot_tolerance: f64,
) -> ReducedSystem {
    let (rows, columns) = matrix.shape();
    let mut pivots = Vec::new();
    let mut row = 0;

    for &column in column_order {
        if row >= rows {
            break;
        }
        let (best, magnitude) = (row..rows)
            .map(|r| (r, matrix[(r, column)].abs()))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((row, 0.0));
        if magnitude < pivot_tolerance {
            continue;
        }

        matrix.swap_rows(row, best);
        rhs.swap_rows(row, best);

        let scale = matrix[(row, column)];
        matrix.row_mut(row).unscale_mut(scale);
        rhs[row] /= scale;

        for other in (0..rows).filter(|&r| r != row) {
            let factor = matrix[(other, column)];
            if factor == 0.0 {
                continue;
            }
            for c in 0..columns {
                let value = matrix[(row, c)];
                matrix[(other, c)] -= factor * value;
            }
            rhs[other] -= factor * rhs[row];
            matrix[(other, column)] = 0.0;
        }

        pivots.push((row, column));
        row += 1;
    }

    ReducedSystem {
        matrix,
        rhs,
        pivots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_rank_system_is_solved_directly() {
        let matrix = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let rhs = DVector::from_vec(vec![3.0, 5.0]);
        let reduced = reduce(matrix, rhs, &[0, 1], 1e-9);
        assert_eq!(reduced.rank(), 2);
        assert!(reduced.free_columns().is_empty());
        for &(row, column) in reduced.pivots() {
            let expected = if column == 0 { 0.8 } else { 1.4 };
            assert!((reduced.rhs(row) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn column_order_decides_which_columns_stay_free() {
        // x0 - x1 = 0
        let matrix = DMatrix::from_row_slice(1, 3, &[1.0, -1.0, 0.0]);
        let rhs = DVector::zeros(1);

        let reversed = reduce(matrix.clone(), rhs.clone(), &[2, 1, 0], 1e-9);
        assert_eq!(reversed.pivots(), &[(0, 1)]);
        assert_eq!(reversed.free_columns(), vec![0, 2]);
        assert!((reversed.coefficient(0, 0) + 1.0).abs() < 1e-12);

        let forward = reduce(matrix, rhs, &[0, 1, 2], 1e-9);
        assert_eq!(forward.free_columns(), vec![1, 2]);
    }

    #[test]
    fn small_entries_are_not_used_as_pivots() {
        let matrix = DMatrix::from_row_slice(1, 2, &[1e-12, 0.0]);
        let reduced = reduce(matrix, DVector::zeros(1), &[0, 1], 1e-9);
        assert_eq!(reduced.rank(), 0);
        assert_eq!(reduced.free_columns(), vec![0, 1]);
    }

    #[test]
    fn residual_reports_inconsistent_rows() {
        // x = 1 and 2x = 3 cannot both hold.
        let matrix = DMatrix::from_row_slice(2, 1, &[1.0, 2.0]);
        let rhs = DVector::from_vec(vec![1.0, 3.0]);
        let reduced = reduce(matrix, rhs, &[0], 1e-9);
        assert_eq!(reduced.rank(), 1);
        assert!((reduced.residual() - 0.5).abs() < 1e-12);
    }
}
