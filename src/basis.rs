use crate::integration::glq::gauss_quadrature_points;

/// Number of shape functions on a 4-node quadrilateral
pub const NUM_SHAPE_FNS: usize = 4;

/// Parametric derivatives of the 4 shape functions: `[d/dxi, d/deta][node]`
pub type ShapeDerivatives = [[f64; NUM_SHAPE_FNS]; 2];

/// Bilinear shape functions over the reference square `[-1, 1]^2` (one per corner, counter-clockwise from `(-1, -1)`)
///
/// ```
/// use lb_smooth_2d::basis::shape;
///
/// let weights = shape(0.3, -0.7);
/// assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-15);
/// assert_eq!(shape(-1.0, -1.0), [1.0, 0.0, 0.0, 0.0]);
/// ```
pub fn shape(xi: f64, eta: f64) -> [f64; NUM_SHAPE_FNS] {
    [
        (1.0 - xi) * (1.0 - eta) / 4.0,
        (1.0 + xi) * (1.0 - eta) / 4.0,
        (1.0 + xi) * (1.0 + eta) / 4.0,
        (1.0 - xi) * (1.0 + eta) / 4.0,
    ]
}

/// xi and eta derivatives of the bilinear shape functions
pub fn shape_derivatives(xi: f64, eta: f64) -> ShapeDerivatives {
    [
        [
            -(1.0 - eta) / 4.0,
            (1.0 - eta) / 4.0,
            (1.0 + eta) / 4.0,
            -(1.0 + eta) / 4.0,
        ],
        [
            -(1.0 - xi) / 4.0,
            -(1.0 + xi) / 4.0,
            (1.0 + xi) / 4.0,
            (1.0 - xi) / 4.0,
        ],
    ]
}

/// Shape function derivatives sampled over a tensor-product grid of Gauss-Legendre-Quadrature points.
///
/// The sampling is coordinate independent, so one sampler serves every Element and every iteration.
#[derive(Clone, Debug)]
pub struct BasisSampler {
    /// Gauss Legendre Quadrature points (Defined from -1 to +1)
    pub points: Vec<f64>,
    /// Gauss Legendre Quadrature weights
    pub weights: Vec<f64>,
    derivatives: Vec<Vec<ShapeDerivatives>>,
}

impl BasisSampler {
    /// Sample the shape function derivatives at `glq_order` points along each direction
    pub fn with(glq_order: usize) -> Self {
        let (points, weights) = gauss_quadrature_points(glq_order);

        let derivatives = points
            .iter()
            .map(|xi| {
                points
                    .iter()
                    .map(|eta| shape_derivatives(*xi, *eta))
                    .collect()
            })
            .collect();

        Self {
            points,
            weights,
            derivatives,
        }
    }

    pub fn order(&self) -> usize {
        self.points.len()
    }

    /// Shape function derivatives at quadrature point `(xi_m, eta_n)`
    pub fn derivatives(&self, m: usize, n: usize) -> &ShapeDerivatives {
        &self.derivatives[m][n]
    }
}
