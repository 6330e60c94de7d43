use super::glq::try_gauss_quad;
use super::metric::{MetricError, MetricTensor};
use crate::basis::{BasisSampler, ShapeDerivatives};
use crate::domain::mesh::space::{Point, M2D};

use nalgebra::{Matrix2, Matrix2x4, Matrix4};

/// Local (4 x 4) stiffness matrix of a quadrilateral
pub type LocalStiffness = Matrix4<f64>;

/// Where the metric tensor in the stiffness integrand is evaluated
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricEvaluation {
    /// At every quadrature point
    PerPoint,
    /// Once, at the center of the reference square, and held constant over the element
    ElementCenter,
}

/// Discrete anisotropic Laplace-Beltrami operator of one quadrilateral:
///
/// `K_mn = ∫∫ sum_ab dpsi_a(m) g^ab dpsi_b(n) sqrt(g) dxi deta`
///
/// The metric is that of the bilinear map onto `corners`. During smoothing these are the stencil-averaged
/// positions of the element's nodes (the "coarse-grained" metric).
///
/// ```
/// use lb_smooth_2d::basis::BasisSampler;
/// use lb_smooth_2d::integration::stiffness::{local_stiffness, MetricEvaluation};
/// use lb_smooth_2d::Point;
///
/// let sampler = BasisSampler::with(4);
/// let unit_square = [
///     Point::new(0.0, 0.0),
///     Point::new(1.0, 0.0),
///     Point::new(1.0, 1.0),
///     Point::new(0.0, 1.0),
/// ];
/// let k = local_stiffness(&unit_square, &sampler, MetricEvaluation::PerPoint).unwrap();
///
/// // bilinear Laplacian on a unit square
/// assert!((k[(0, 0)] - 2.0 / 3.0).abs() < 1e-12);
/// assert!((k[(0, 1)] + 1.0 / 6.0).abs() < 1e-12);
/// assert!((k[(0, 2)] + 1.0 / 3.0).abs() < 1e-12);
/// ```
pub fn local_stiffness(
    corners: &[Point; 4],
    sampler: &BasisSampler,
    evaluation: MetricEvaluation,
) -> Result<LocalStiffness, MetricError> {
    let center_metric = match evaluation {
        MetricEvaluation::PerPoint => None,
        MetricEvaluation::ElementCenter => Some(MetricTensor::at_center(corners)?),
    };

    try_gauss_quad(
        &sampler.weights,
        &sampler.weights,
        LocalStiffness::zeros(),
        |m, n| {
            let d_psi = sampler.derivatives(m, n);
            let metric = match center_metric {
                Some(metric) => metric,
                None => MetricTensor::at(corners, d_psi)?,
            };
            Ok(stiffness_integrand(d_psi, &metric))
        },
    )
}

/// `D^T g^ab D sqrt(g)` at one quadrature point
fn stiffness_integrand(d_psi: &ShapeDerivatives, metric: &MetricTensor) -> LocalStiffness {
    let d = Matrix2x4::from_fn(|a, m| d_psi[a][m]);
    d.transpose() * as_matrix(&metric.contravariant) * d * metric.sqrt_det()
}

fn as_matrix(m: &M2D) -> Matrix2<f64> {
    Matrix2::new(m.at(0, 0), m.at(0, 1), m.at(1, 0), m.at(1, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed_quad() -> [Point; 4] {
        [
            Point::new(0.1, 0.0),
            Point::new(1.2, 0.1),
            Point::new(1.3, 1.1),
            Point::new(0.05, 0.9),
        ]
    }

    #[test]
    fn symmetric() {
        let sampler = BasisSampler::with(4);
        let k = local_stiffness(&skewed_quad(), &sampler, MetricEvaluation::PerPoint).unwrap();
        for m in 0..4 {
            for n in 0..4 {
                assert!((k[(m, n)] - k[(n, m)]).abs() < 1e-13);
            }
            assert!(k[(m, m)] > 0.0);
        }
    }

    #[test]
    fn rigid_translation_has_zero_response() {
        let sampler = BasisSampler::with(4);
        let corners = skewed_quad();
        let shifted = corners.map(|p| Point::new(p.x + 5.0, p.y - 3.0));

        for evaluation in [MetricEvaluation::PerPoint, MetricEvaluation::ElementCenter] {
            let k = local_stiffness(&corners, &sampler, evaluation).unwrap();
            let k_shifted = local_stiffness(&shifted, &sampler, evaluation).unwrap();

            for m in 0..4 {
                assert!(k.row(m).sum().abs() < 1e-13);
                assert!(k_shifted.row(m).sum().abs() < 1e-13);
                for n in 0..4 {
                    assert!((k[(m, n)] - k_shifted[(m, n)]).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn reference_values() {
        // same corners, integrated independently with the closed-form 4 point rule
        let sampler = BasisSampler::with(4);
        let k = local_stiffness(&skewed_quad(), &sampler, MetricEvaluation::PerPoint).unwrap();

        let expected = [
            [0.6526857800884982, -0.08296614666702895, -0.2697785762698732, -0.2999410571515959],
            [-0.08296614666702892, 0.7757451841195755, -0.27036692352332814, -0.42241211392921824],
            [-0.2697785762698731, -0.27036692352332814, 0.5795287126922568, -0.039383212899055324],
            [-0.2999410571515959, -0.4224121139292182, -0.03938321289905534, 0.7617363839798696],
        ];
        for m in 0..4 {
            for n in 0..4 {
                assert!((k[(m, n)] - expected[m][n]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn scale_invariant() {
        // the 2D Laplace-Beltrami operator is conformally invariant
        let sampler = BasisSampler::with(4);
        let corners = skewed_quad();
        let scaled = corners.map(|p| p * 3.5);

        let k = local_stiffness(&corners, &sampler, MetricEvaluation::PerPoint).unwrap();
        let k_scaled = local_stiffness(&scaled, &sampler, MetricEvaluation::PerPoint).unwrap();
        assert!((k - k_scaled).amax() < 1e-12);
    }

    #[test]
    fn folded_element_fails() {
        let sampler = BasisSampler::with(4);
        let bowtie = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
        ];
        assert!(local_stiffness(&bowtie, &sampler, MetricEvaluation::PerPoint).is_err());
    }
}
