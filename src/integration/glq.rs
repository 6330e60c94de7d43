use nalgebra::{DMatrix, SymmetricEigen};
use std::ops::{AddAssign, Mul};

/// Closed form 4-point Gauss-Legendre points over `(-1, 1)`: `±sqrt(3/7 ∓ 2/7 sqrt(6/5))`
pub const GLQ_4_POINTS: [f64; 4] = [
    -0.861_136_311_594_052_6,
    -0.339_981_043_584_856_3,
    0.339_981_043_584_856_3,
    0.861_136_311_594_052_6,
];

/// Closed form 4-point Gauss-Legendre weights: `1/2 ∓ sqrt(30)/36`
pub const GLQ_4_WEIGHTS: [f64; 4] = [
    0.347_854_845_137_453_86,
    0.652_145_154_862_546_1,
    0.652_145_154_862_546_1,
    0.347_854_845_137_453_86,
];

/// 2D Gauss Legendre Quadrature of a fallible integrand with values in any vector space (scalars, small matrices, ...).
///
/// Integration stops at the first point where the integrand fails.
///
/// ```
/// use lb_smooth_2d::integration::glq::*;
/// use nalgebra::Matrix2;
///
/// let (points, weights) = gauss_quadrature_points(4);
///
/// // integrate [[1, u], [v, u*v]] over the reference square
/// let solution = try_gauss_quad(&weights, &weights, Matrix2::zeros(), |m, n| {
///     let (u, v) = (points[m], points[n]);
///     Ok::<_, ()>(Matrix2::new(1.0, u, v, u * v))
/// })
/// .unwrap();
///
/// assert!((solution[(0, 0)] - 4.0).abs() < 1e-12);
/// assert!(solution[(1, 1)].abs() < 1e-12);
/// ```
pub fn try_gauss_quad<T, E, F>(
    u_weights: &[f64],
    v_weights: &[f64],
    zero: T,
    mut integrand: F,
) -> Result<T, E>
where
    T: AddAssign + Mul<f64, Output = T>,
    F: FnMut(usize, usize) -> Result<T, E>,
{
    let mut solution = zero;
    for (m, u_w) in u_weights.iter().enumerate() {
        for (n, v_w) in v_weights.iter().enumerate() {
            solution += integrand(m, n)? * (u_w * v_w);
        }
    }
    Ok(solution)
}

/// Get a set of n Gauss-Legendre-Quadrature Integration points and weights over `(-1, 1)`, sorted by point
///
/// ```
/// use lb_smooth_2d::integration::glq::*;
///
/// // generate 10 GLQ points and weights over the range `(-1, 1)`
/// let (points, weights) = gauss_quadrature_points(10);
/// assert_eq!(points.len(), 10);
/// assert_eq!(weights.len(), 10);
/// assert!(points.iter().sum::<f64>().abs() < 1e-12);
/// assert!((weights.iter().sum::<f64>() - 2.0).abs() < 1e-12);
/// ```
// https://en.wikipedia.org/wiki/Gaussian_quadrature#Gauss%E2%80%93Legendre_quadrature
// Golub-Welsch: the points are the eigenvalues of the Jacobi matrix of the Legendre recurrence
pub fn gauss_quadrature_points(n: usize) -> (Vec<f64>, Vec<f64>) {
    let betas: Vec<f64> = (1..n)
        .map(|i| 0.5 / (1.0 - (2.0 * i as f64).powi(-2)).sqrt())
        .collect();

    let polymat: DMatrix<f64> = DMatrix::from_fn(n, n, |r, c| {
        if r == c + 1 {
            betas[r - 1]
        } else if c == r + 1 {
            betas[c - 1]
        } else {
            0.0
        }
    });

    let eigen_decomp = SymmetricEigen::new(polymat);

    let mut xw: Vec<(f64, f64)> = eigen_decomp
        .eigenvalues
        .iter()
        .cloned()
        .zip(
            eigen_decomp
                .eigenvectors
                .row(0)
                .iter()
                .map(|weight| (*weight).powi(2) * 2.0),
        )
        .collect();

    xw.sort_by(|a, b| a.0.total_cmp(&b.0));

    xw.into_iter().unzip()
}
