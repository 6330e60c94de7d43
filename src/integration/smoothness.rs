use super::glq::try_gauss_quad;
use super::metric::{MetricError, MetricTensor};
use super::ElementError;
use crate::basis::BasisSampler;
use crate::domain::mesh::{space::Point, Mesh};

use rayon::prelude::*;

/// `∫∫ (g^00 + g^11) sqrt(g) dxi deta` over one Element, using the metric of its live corner coordinates
pub fn element_smoothness(
    corners: &[Point; 4],
    sampler: &BasisSampler,
) -> Result<f64, MetricError> {
    try_gauss_quad(&sampler.weights, &sampler.weights, 0.0, |m, n| {
        let metric = MetricTensor::at(corners, sampler.derivatives(m, n))?;
        Ok(metric.contravariant.trace() * metric.sqrt_det())
    })
}

/// Half the sum of [element_smoothness] over every Element of a Mesh.
///
/// Lower values indicate a smoother mesh. This is a diagnostic only; it never drives the smoothing iteration.
///
/// Elements are integrated in parallel over the Rayon Global Threadpool; the sum is taken in Element order.
pub fn global_smoothness(mesh: &Mesh, sampler: &BasisSampler) -> Result<f64, ElementError> {
    let per_element = mesh
        .elements
        .par_iter()
        .map(|element| {
            element_smoothness(&mesh.element_points(element.id), sampler)
                .map_err(|err| ElementError::new(element.id, err))
        })
        .collect::<Result<Vec<f64>, ElementError>>()?;

    Ok(per_element.iter().sum::<f64>() / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{distorted_grid_3x3, grid_3x3};

    #[test]
    fn unit_square() {
        let sampler = BasisSampler::with(4);
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        // g^ab = 4 I, sqrt(g) = 1/4 everywhere
        assert!((element_smoothness(&corners, &sampler).unwrap() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn uniform_grid() {
        let sampler = BasisSampler::with(4);
        let nsf = global_smoothness(&grid_3x3(), &sampler).unwrap();
        assert!((nsf - 36.0).abs() < 1e-10);
    }

    #[test]
    fn distorted_grid() {
        let sampler = BasisSampler::with(4);
        let nsf = global_smoothness(&distorted_grid_3x3(), &sampler).unwrap();
        assert!((nsf - 38.3234).abs() < 1e-3);
    }

    #[test]
    fn folded_element_is_reported() {
        let sampler = BasisSampler::with(4);
        let mut mesh = grid_3x3();
        // push interior node 3 past the far side of element 1
        mesh.nodes[2].coords = Point::new(-0.5, -0.5);

        let err = global_smoothness(&mesh, &sampler).unwrap_err();
        assert!(mesh.element(err.element_id).contains_node(3));
        assert!(matches!(err.source, MetricError::Degenerate { .. }));
    }
}
