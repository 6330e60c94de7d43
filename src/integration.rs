/// Gauss Legendre Quadrature points, weights and 2D integration routines
pub mod glq;
/// Covariant and contravariant metric tensors of the bilinear Element mapping
pub mod metric;
/// Global smoothness functional (mesh quality diagnostic)
pub mod smoothness;
/// Local Laplace-Beltrami stiffness matrices
pub mod stiffness;

use metric::MetricError;
use thiserror::Error;

/// A [MetricError] tagged with the id of the Element where it occurred
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("Element {element_id}: {source}")]
pub struct ElementError {
    pub element_id: usize,
    #[source]
    pub source: MetricError,
}

impl ElementError {
    pub fn new(element_id: usize, source: MetricError) -> Self {
        Self { element_id, source }
    }

    /// Metric determinant at the failing quadrature point
    pub fn determinant(&self) -> f64 {
        match self.source {
            MetricError::Degenerate { determinant, .. } => determinant,
        }
    }

    /// Signed Jacobian of the mapping at the failing quadrature point
    pub fn jacobian(&self) -> f64 {
        match self.source {
            MetricError::Degenerate { jacobian, .. } => jacobian,
        }
    }
}
