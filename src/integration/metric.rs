use crate::basis::{shape_derivatives, ShapeDerivatives};
use crate::domain::mesh::space::{Point, M2D, V2D};
use thiserror::Error;

/// Metric tensor of the bilinear mapping from the reference square onto a quadrilateral, at one parametric point
#[derive(Clone, Copy, Debug)]
pub struct MetricTensor {
    /// Covariant metric tensor `g_ab`
    pub covariant: M2D,
    /// Determinant of `g_ab`
    pub det: f64,
    /// Contravariant metric tensor `g^ab = adj(g_ab) / g`
    pub contravariant: M2D,
    /// Signed Jacobian of the mapping (`g == jacobian^2`)
    pub jacobian: f64,
}

impl MetricTensor {
    /// Evaluate the metric at the point where the shape function derivatives `d_psi` were sampled
    ///
    /// Fails if the mapping is folded or collapsed at that point (non-positive Jacobian or `g <= 0`)
    pub fn at(corners: &[Point; 4], d_psi: &ShapeDerivatives) -> Result<Self, MetricError> {
        let [r_xi, r_eta] = tangent_vectors(corners, d_psi);
        let covariant = M2D::gram(r_xi, r_eta);
        let jacobian = r_xi.cross(&r_eta);

        if !(jacobian > 0.0) {
            return Err(MetricError::Degenerate {
                determinant: covariant.det(),
                jacobian,
            });
        }
        let (det, contravariant) = determinant_and_inverse(covariant)?;

        Ok(Self {
            covariant,
            det,
            contravariant,
            jacobian,
        })
    }

    /// Evaluate the metric at the center of the reference square. Used as a constant, element-wide metric.
    pub fn at_center(corners: &[Point; 4]) -> Result<Self, MetricError> {
        Self::at(corners, &shape_derivatives(0.0, 0.0))
    }

    #[inline]
    pub fn sqrt_det(&self) -> f64 {
        self.det.sqrt()
    }
}

/// `g_ab = (dr/dxi_a) . (dr/dxi_b)`: dot products of the parametric tangent vectors
///
/// ```
/// use lb_smooth_2d::integration::metric::covariant_metric;
/// use lb_smooth_2d::basis::shape_derivatives;
/// use lb_smooth_2d::Point;
///
/// // a 2 x 1 rectangle: dx/dxi = 1, dy/deta = 1/2
/// let corners = [
///     Point::new(0.0, 0.0),
///     Point::new(2.0, 0.0),
///     Point::new(2.0, 1.0),
///     Point::new(0.0, 1.0),
/// ];
/// let g = covariant_metric(&corners, &shape_derivatives(0.3, -0.2));
///
/// assert!((g.at(0, 0) - 1.0).abs() < 1e-15);
/// assert!((g.at(1, 1) - 0.25).abs() < 1e-15);
/// assert!(g.at(0, 1).abs() < 1e-15);
/// ```
pub fn covariant_metric(corners: &[Point; 4], d_psi: &ShapeDerivatives) -> M2D {
    let [r_xi, r_eta] = tangent_vectors(corners, d_psi);
    M2D::gram(r_xi, r_eta)
}

/// Determinant of a covariant metric tensor and the contravariant tensor `adj(g_ab) / g`
pub fn determinant_and_inverse(covariant: M2D) -> Result<(f64, M2D), MetricError> {
    let det = covariant.det();
    if !(det > 0.0) || !det.is_finite() {
        return Err(MetricError::Degenerate {
            determinant: det,
            jacobian: det.max(0.0).sqrt(),
        });
    }
    Ok((det, covariant.adjugate() / det))
}

/// `[dr/dxi, dr/deta]` where `r = sum_m psi_m * corner_m`
fn tangent_vectors(corners: &[Point; 4], d_psi: &ShapeDerivatives) -> [V2D; 2] {
    (*d_psi).map(|d_psi_a| {
        corners
            .iter()
            .zip(d_psi_a.iter())
            .fold(V2D::default(), |acc, (corner, d)| {
                acc + V2D::from([corner.x, corner.y]) * *d
            })
    })
}

/// Error type for metric evaluation
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MetricError {
    #[error(
        "Degenerate mapping (g = {determinant:e}, jacobian = {jacobian:e}); \
         element is folded or has zero area!"
    )]
    Degenerate { determinant: f64, jacobian: f64 },
}
