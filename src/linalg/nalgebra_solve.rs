use super::LinalgError;
use nalgebra::DMatrix;

// TODO: use Nalgebra's Sparse crate; the interior block has at most 9 non-zeros per row
pub const MAX_DENSE_SIZE: usize = 4000;

/// Elementwise acceptance test for the residual of a linear solve: `|r_i| <= atol + rtol * |rhs_i|`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResidualTolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for ResidualTolerance {
    fn default() -> Self {
        Self {
            rtol: 1e-4,
            atol: 1e-8,
        }
    }
}

impl ResidualTolerance {
    pub fn accepts(&self, residual: f64, rhs: f64) -> bool {
        residual.abs() <= self.atol + self.rtol * rhs.abs()
    }
}

/// Interior coordinates and the quality of the solve that produced them
#[derive(Clone, Debug)]
pub struct InteriorSolution {
    /// `(num_interior x 2)` matrix: one column per coordinate axis
    pub solution: DMatrix<f64>,
    /// Largest absolute residual entry per axis
    pub residual: [f64; 2],
    /// Whether every residual entry of an axis passed the [ResidualTolerance]
    pub residual_ok: [bool; 2],
    /// Largest absolute right-hand-side entry per axis
    pub rhs_norm: [f64; 2],
}

/// Solve `Q [X Y] = -P [bx by]` for the interior coordinates.
///
/// `Q` is factorized once (Nalgebra's LU decomposition with partial pivoting) and both coordinate axes are
/// solved from that factorization.
///
/// ```
/// use lb_smooth_2d::linalg::nalgebra_solve::{solve_interior, ResidualTolerance};
/// use nalgebra::DMatrix;
///
/// // one interior node coupled equally to two boundary nodes
/// let p = DMatrix::from_row_slice(1, 2, &[-1.0, -1.0]);
/// let q = DMatrix::from_row_slice(1, 1, &[2.0]);
/// let boundary = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 4.0, 2.0]);
///
/// let solved = solve_interior(&p, &q, &boundary, ResidualTolerance::default()).unwrap();
/// assert!((solved.solution[(0, 0)] - 2.0).abs() < 1e-14);
/// assert!((solved.solution[(0, 1)] - 1.0).abs() < 1e-14);
/// assert_eq!(solved.residual_ok, [true, true]);
/// ```
///
/// # Returns
/// * An `Err` if the blocks' dimensions are inconsistent
/// * An `Err` if `Q` is too large to be stored densely
/// * An `Err` if `Q` is singular
/// * The solution and its per-axis residuals, otherwise. A residual that fails the tolerance is reported, not rejected.
pub fn solve_interior(
    p: &DMatrix<f64>,
    q: &DMatrix<f64>,
    boundary: &DMatrix<f64>,
    tolerance: ResidualTolerance,
) -> Result<InteriorSolution, LinalgError> {
    let ni = q.nrows();
    if q.ncols() != ni || p.nrows() != ni {
        return Err(LinalgError::DimensionMismatch {
            expected: (ni, ni),
            found: (p.nrows(), q.ncols()),
        });
    }
    if boundary.shape() != (p.ncols(), 2) {
        return Err(LinalgError::DimensionMismatch {
            expected: (p.ncols(), 2),
            found: boundary.shape(),
        });
    }
    if ni > MAX_DENSE_SIZE {
        return Err(LinalgError::ProblemTooLarge {
            size: ni,
            max: MAX_DENSE_SIZE,
        });
    }
    if ni == 0 {
        return Ok(InteriorSolution {
            solution: DMatrix::zeros(0, 2),
            residual: [0.0; 2],
            residual_ok: [true; 2],
            rhs_norm: [0.0; 2],
        });
    }

    let rhs = -(p * boundary);

    let lu = q.clone().lu();
    if !lu.is_invertible() {
        return Err(LinalgError::SingularSystem);
    }
    let solution = match lu.solve(&rhs) {
        Some(solution) if solution.iter().all(|x| x.is_finite()) => solution,
        _ => return Err(LinalgError::SingularSystem),
    };

    let residual_mat = q * &solution - &rhs;

    let mut residual = [0.0; 2];
    let mut residual_ok = [true; 2];
    let mut rhs_norm = [0.0; 2];
    for axis in 0..2 {
        for (r, b) in residual_mat.column(axis).iter().zip(rhs.column(axis).iter()) {
            residual[axis] = f64::max(residual[axis], r.abs());
            rhs_norm[axis] = f64::max(rhs_norm[axis], b.abs());
            residual_ok[axis] &= tolerance.accepts(*r, *b);
        }
    }

    Ok(InteriorSolution {
        solution,
        residual,
        residual_ok,
        rhs_norm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_interior_nodes() {
        // a 1D chain: b0 - i0 - i1 - b1
        let q = DMatrix::from_row_slice(2, 2, &[2.0, -1.0, -1.0, 2.0]);
        let p = DMatrix::from_row_slice(2, 2, &[-1.0, 0.0, 0.0, -1.0]);
        let boundary = DMatrix::from_row_slice(2, 2, &[0.0, 5.0, 3.0, 5.0]);

        let solved = solve_interior(&p, &q, &boundary, ResidualTolerance::default()).unwrap();
        assert!((solved.solution[(0, 0)] - 1.0).abs() < 1e-14);
        assert!((solved.solution[(1, 0)] - 2.0).abs() < 1e-14);
        assert!((solved.solution[(0, 1)] - 5.0).abs() < 1e-14);
        assert!((solved.solution[(1, 1)] - 5.0).abs() < 1e-14);
        assert!(solved.residual.iter().all(|r| *r < 1e-14));
        assert_eq!(solved.rhs_norm, [3.0, 5.0]);
    }

    #[test]
    fn singular_block() {
        let q = DMatrix::from_row_slice(2, 2, &[1.0, -1.0, -1.0, 1.0]);
        let p = DMatrix::zeros(2, 3);
        let boundary = DMatrix::zeros(3, 2);

        assert_eq!(
            solve_interior(&p, &q, &boundary, ResidualTolerance::default()).unwrap_err(),
            LinalgError::SingularSystem
        );
    }

    #[test]
    fn mismatched_blocks() {
        let q = DMatrix::identity(2, 2);
        let p = DMatrix::zeros(2, 3);

        assert!(matches!(
            solve_interior(&p, &q, &DMatrix::zeros(4, 2), ResidualTolerance::default()),
            Err(LinalgError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            solve_interior(
                &DMatrix::zeros(3, 3),
                &q,
                &DMatrix::zeros(3, 2),
                ResidualTolerance::default(),
            ),
            Err(LinalgError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn no_interior_nodes() {
        let solved = solve_interior(
            &DMatrix::zeros(0, 4),
            &DMatrix::zeros(0, 0),
            &DMatrix::zeros(4, 2),
            ResidualTolerance::default(),
        )
        .unwrap();
        assert_eq!(solved.solution.shape(), (0, 2));
    }

    #[test]
    fn residual_test() {
        let tol = ResidualTolerance::default();
        assert!(tol.accepts(5e-9, 0.0));
        assert!(!tol.accepts(2e-8, 0.0));
        assert!(tol.accepts(-1e-4, 2.0));
        assert!(!tol.accepts(1e-3, 2.0));
    }
}
