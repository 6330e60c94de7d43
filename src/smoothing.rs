/// Stencil-averaged ("coarse-grained") node positions
pub mod stencil;

use crate::basis::BasisSampler;
use crate::domain::{
    mesh::{space::Point, Mesh, MeshError},
    Domain,
};
use crate::integration::{
    smoothness::global_smoothness,
    stiffness::{local_stiffness, MetricEvaluation},
    ElementError,
};
use crate::linalg::{
    assembly::{GlobalStiffness, NodePartition},
    nalgebra_solve::{solve_interior, ResidualTolerance},
    LinalgError,
};
use stencil::{stencil_averages, StencilError};

use log::{debug, info, warn};
use nalgebra::DMatrix;
use thiserror::Error;

/// Minimum number of Gauss Legendre Quadrature Points (per direction) allowed for the stiffness integrals
pub const MIN_GLQ_ORDER: usize = 2;

/// Which corner positions (and where) the metric tensor of the stiffness integrand is computed from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricSource {
    /// Stencil-averaged corners, evaluated at every quadrature point
    CoarseGrained,
    /// Live corner coordinates, evaluated at every quadrature point. Any fold-free mesh is already a fixed point of this operator.
    Exact,
    /// Stencil-averaged corners, evaluated once at the Element center
    Target,
}

impl Default for MetricSource {
    fn default() -> Self {
        Self::CoarseGrained
    }
}

/// Settings for a smoothing run
///
/// ```
/// use lb_smooth_2d::{MetricSource, SmoothingParams};
///
/// let params = SmoothingParams::default()
///     .with_tolerance(1e-8)
///     .with_max_iterations(200)
///     .with_metric_source(MetricSource::Target);
///
/// assert_eq!(params.max_iterations, 200);
/// assert_eq!(params.glq_order, 4);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothingParams {
    /// The run converges once the error metric drops below this value
    pub tolerance: f64,
    /// Iteration cap
    pub max_iterations: usize,
    pub residual_rtol: f64,
    pub residual_atol: f64,
    /// Number of consecutive iterations with a failing residual check tolerated before the run is aborted (`None`: only warn)
    pub residual_mismatch_limit: Option<usize>,
    pub metric_source: MetricSource,
    /// Gauss Legendre Quadrature Points per direction
    pub glq_order: usize,
    /// Evaluate the global smoothness functional before the run, after the run and after every iteration
    pub track_smoothness: bool,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 50,
            residual_rtol: 1e-4,
            residual_atol: 1e-8,
            residual_mismatch_limit: Some(2),
            metric_source: MetricSource::CoarseGrained,
            glq_order: 4,
            track_smoothness: false,
        }
    }
}

impl SmoothingParams {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_residual_tolerance(mut self, rtol: f64, atol: f64) -> Self {
        self.residual_rtol = rtol;
        self.residual_atol = atol;
        self
    }

    pub fn with_residual_mismatch_limit(mut self, limit: Option<usize>) -> Self {
        self.residual_mismatch_limit = limit;
        self
    }

    pub fn with_metric_source(mut self, metric_source: MetricSource) -> Self {
        self.metric_source = metric_source;
        self
    }

    pub fn with_glq_order(mut self, glq_order: usize) -> Self {
        self.glq_order = glq_order;
        self
    }

    pub fn with_smoothness_tracking(mut self, track_smoothness: bool) -> Self {
        self.track_smoothness = track_smoothness;
        self
    }

    pub fn residual_tolerance(&self) -> ResidualTolerance {
        ResidualTolerance {
            rtol: self.residual_rtol,
            atol: self.residual_atol,
        }
    }

    pub fn validate(&self) -> Result<(), SmoothingError> {
        let invalid = |msg: String| Err(SmoothingError::InvalidParams(msg));

        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return invalid(format!(
                "tolerance must be positive and finite (found {})",
                self.tolerance
            ));
        }
        if self.max_iterations == 0 {
            return invalid("max_iterations must be at least 1".to_string());
        }
        if !(self.residual_rtol >= 0.0 && self.residual_atol >= 0.0)
            || !self.residual_rtol.is_finite()
            || !self.residual_atol.is_finite()
        {
            return invalid(format!(
                "residual tolerances must be non-negative and finite (found rtol = {}, atol = {})",
                self.residual_rtol, self.residual_atol
            ));
        }
        if self.residual_mismatch_limit == Some(0) {
            return invalid("residual_mismatch_limit must be at least 1 (or None)".to_string());
        }
        if self.glq_order < MIN_GLQ_ORDER {
            return invalid(format!(
                "glq_order must be at least {} (found {})",
                MIN_GLQ_ORDER, self.glq_order
            ));
        }
        Ok(())
    }
}

/// States of the smoothing fixed-point iteration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmootherState {
    Initializing,
    Iterating,
    Converged,
    MaxIterReached,
}

impl SmootherState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Converged | Self::MaxIterReached)
    }
}

/// The state a finished run ended in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalState {
    Converged,
    MaxIterReached,
}

/// Diagnostics of one smoothing iteration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IterationRecord {
    /// 1-based iteration index
    pub iteration: usize,
    /// `(dx^2 + dy^2) / num_interior`, where `dx` (`dy`) is the summed absolute change of the interior x (y) coordinates
    pub error: f64,
    /// Largest absolute residual of the interior solve, per axis
    pub residual: [f64; 2],
    pub residual_ok: bool,
    /// Global smoothness after this iteration (if tracked)
    pub smoothness: Option<f64>,
}

/// Outcome of a smoothing run
#[derive(Clone, Debug, PartialEq)]
pub struct SmoothingReport {
    pub state: TerminalState,
    /// Number of iterations run
    pub iterations: usize,
    /// Error metric of the final iteration
    pub error: f64,
    pub history: Vec<IterationRecord>,
    /// Number of iterations whose residual check failed
    pub residual_mismatches: usize,
    pub smoothness_before: Option<f64>,
    pub smoothness_after: Option<f64>,
}

impl SmoothingReport {
    pub fn is_converged(&self) -> bool {
        self.state == TerminalState::Converged
    }

    /// Treat reaching the iteration cap as an error
    pub fn ensure_converged(self) -> Result<Self, SmoothingError> {
        match self.state {
            TerminalState::Converged => Ok(self),
            TerminalState::MaxIterReached => Err(SmoothingError::NonConvergence {
                iterations: self.iterations,
                error: self.error,
            }),
        }
    }
}

/// Error type for smoothing runs
#[derive(Debug, Error)]
pub enum SmoothingError {
    #[error("Invalid Mesh: {0}")]
    InvalidMesh(#[from] MeshError),
    #[error("Invalid smoothing parameters: {0}!")]
    InvalidParams(String),
    #[error(
        "Iteration {iteration}: Element {element_id} is degenerate or folded \
         (jacobian = {jacobian:e}, g = {determinant:e})!"
    )]
    DegenerateElement {
        iteration: usize,
        element_id: usize,
        jacobian: f64,
        determinant: f64,
    },
    #[error("Iteration {iteration}: Node {node_id} has an empty stencil!")]
    IsolatedNode { iteration: usize, node_id: usize },
    #[error("Iteration {iteration}: interior stiffness block is singular!")]
    SingularSystem { iteration: usize },
    #[error(
        "Iteration {iteration}: residual of axis {axis} ({residual:e}) \
         exceeds the tolerance ({tolerance:e})!"
    )]
    ResidualMismatch {
        iteration: usize,
        axis: usize,
        residual: f64,
        tolerance: f64,
    },
    #[error("Iteration {iteration}: {source}")]
    Linalg {
        iteration: usize,
        #[source]
        source: LinalgError,
    },
    #[error("Smoothing did not converge in {iterations} iterations (error = {error:e})!")]
    NonConvergence { iterations: usize, error: f64 },
}

impl SmoothingError {
    fn from_element(iteration: usize, err: ElementError) -> Self {
        Self::DegenerateElement {
            iteration,
            element_id: err.element_id,
            jacobian: err.jacobian(),
            determinant: err.determinant(),
        }
    }

    fn from_linalg(iteration: usize, err: LinalgError) -> Self {
        match err {
            LinalgError::SingularSystem => Self::SingularSystem { iteration },
            source => Self::Linalg { iteration, source },
        }
    }
}

/// Laplace-Beltrami (Winslow) smoother: relocates the interior Nodes of a [Domain]'s Mesh while its boundary Nodes stay fixed.
///
/// Each iteration:
/// 1. average every Node's stencil
/// 2. build each Element's local stiffness from the metric selected by [MetricSource]
/// 3. assemble the global stiffness matrix and extract its interior/boundary blocks
/// 4. solve for new interior coordinates (both axes from one factorization)
/// 5. measure the change, write the new coordinates and check for convergence
///
/// The Mesh is only modified after a successful solve. If an iteration fails, the coordinates from the previous iteration remain.
pub struct Smoother<'d> {
    domain: &'d mut Domain,
    params: SmoothingParams,
    sampler: BasisSampler,
    partition: NodePartition,
    boundary_coords: DMatrix<f64>,
    state: SmootherState,
    iteration: usize,
    error: f64,
    history: Vec<IterationRecord>,
    residual_mismatches: usize,
    consecutive_mismatches: usize,
    smoothness_before: Option<f64>,
}

impl<'d> Smoother<'d> {
    /// Prepare to smooth a [Domain]
    ///
    /// Returns an `Err` if the parameters are invalid, or if smoothness tracking is requested and the initial mesh is folded
    pub fn new(domain: &'d mut Domain, params: SmoothingParams) -> Result<Self, SmoothingError> {
        params.validate()?;

        let sampler = BasisSampler::with(params.glq_order);
        let partition =
            NodePartition::from_boundary(domain.mesh.num_nodes(), &domain.mesh.boundary_loop);
        let boundary_coords = partition.boundary_coords(&domain.mesh.coords());

        let smoothness_before = if params.track_smoothness {
            Some(
                global_smoothness(&domain.mesh, &sampler)
                    .map_err(|err| SmoothingError::from_element(0, err))?,
            )
        } else {
            None
        };

        debug!(
            "Smoothing {} interior nodes ({} boundary nodes, {} elements) with {:?}",
            partition.num_interior(),
            partition.num_boundary(),
            domain.mesh.num_elements(),
            params
        );

        Ok(Self {
            domain,
            params,
            sampler,
            partition,
            boundary_coords,
            state: SmootherState::Initializing,
            iteration: 0,
            error: f64::INFINITY,
            history: Vec::with_capacity(params.max_iterations),
            residual_mismatches: 0,
            consecutive_mismatches: 0,
            smoothness_before,
        })
    }

    pub fn state(&self) -> SmootherState {
        self.state
    }

    /// Number of iterations run so far
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Error metric of the latest iteration (infinite before the first iteration)
    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    pub fn mesh(&self) -> &Mesh {
        &self.domain.mesh
    }

    /// Run one iteration and return the new state. Does nothing once a terminal state is reached.
    pub fn step(&mut self) -> Result<SmootherState, SmoothingError> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }
        self.state = SmootherState::Iterating;
        self.iteration += 1;
        let iteration = self.iteration;

        if self.partition.num_interior() == 0 {
            return Ok(self.finish_without_interior());
        }

        let coords = self.domain.mesh.coords();
        let averages = stencil_averages(&self.domain.topology.nodes, &coords).map_err(
            |StencilError::IsolatedNode { node_id }| SmoothingError::IsolatedNode {
                iteration,
                node_id,
            },
        )?;

        let stiffness = self.assemble(&coords, &averages)?;
        let (p, q) = stiffness
            .partition(&self.partition)
            .map_err(|err| SmoothingError::from_linalg(iteration, err))?;

        let solved = solve_interior(&p, &q, &self.boundary_coords, self.params.residual_tolerance())
            .map_err(|err| SmoothingError::from_linalg(iteration, err))?;
        self.check_residual(&solved.residual, &solved.residual_ok, &solved.rhs_norm)?;

        let error = self.update_interior(&coords, &solved.solution);

        let smoothness = if self.params.track_smoothness {
            match global_smoothness(&self.domain.mesh, &self.sampler) {
                Ok(smoothness) => Some(smoothness),
                Err(err) => {
                    self.restore_interior(&coords);
                    return Err(SmoothingError::from_element(iteration, err));
                }
            }
        } else {
            None
        };
        self.error = error;

        self.history.push(IterationRecord {
            iteration,
            error: self.error,
            residual: solved.residual,
            residual_ok: solved.residual_ok.iter().all(|ok| *ok),
            smoothness,
        });
        debug!(
            "Iteration {}: error = {:e}, residual = [{:e}, {:e}]",
            iteration, self.error, solved.residual[0], solved.residual[1]
        );

        if self.error < self.params.tolerance {
            self.state = SmootherState::Converged;
            info!(
                "Smoothing converged after {} iterations (error = {:e})",
                iteration, self.error
            );
        } else if iteration >= self.params.max_iterations {
            self.state = SmootherState::MaxIterReached;
            warn!(
                "Smoothing reached the iteration cap ({}) without converging (error = {:e})",
                iteration, self.error
            );
        }

        Ok(self.state)
    }

    /// Iterate until a terminal state is reached
    pub fn run(mut self) -> Result<SmoothingReport, SmoothingError> {
        while !self.step()?.is_terminal() {}

        let smoothness_after = if self.params.track_smoothness {
            self.history.last().and_then(|record| record.smoothness)
        } else {
            None
        };

        let state = match self.state {
            SmootherState::Converged => TerminalState::Converged,
            _ => TerminalState::MaxIterReached,
        };

        Ok(SmoothingReport {
            state,
            iterations: self.iteration,
            error: self.error,
            history: self.history,
            residual_mismatches: self.residual_mismatches,
            smoothness_before: self.smoothness_before,
            smoothness_after,
        })
    }

    /// Nothing to move: converged with zero error
    fn finish_without_interior(&mut self) -> SmootherState {
        self.error = 0.0;
        self.history.push(IterationRecord {
            iteration: self.iteration,
            error: 0.0,
            residual: [0.0; 2],
            residual_ok: true,
            smoothness: self.smoothness_before,
        });
        info!("Mesh has no interior nodes; nothing to smooth");

        self.state = SmootherState::Converged;
        self.state
    }

    fn assemble(
        &self,
        coords: &[Point],
        averages: &[Point],
    ) -> Result<GlobalStiffness, SmoothingError> {
        let (corner_source, evaluation) = match self.params.metric_source {
            MetricSource::CoarseGrained => (averages, MetricEvaluation::PerPoint),
            MetricSource::Exact => (coords, MetricEvaluation::PerPoint),
            MetricSource::Target => (averages, MetricEvaluation::ElementCenter),
        };
        let sampler = &self.sampler;

        GlobalStiffness::assemble_with(
            self.domain.mesh.num_nodes(),
            &self.domain.mesh.elements,
            |element| {
                let corners = element.nodes.map(|node_id| corner_source[node_id - 1]);
                local_stiffness(&corners, sampler, evaluation)
            },
        )
        .map_err(|err| SmoothingError::from_element(self.iteration, err))
    }

    fn check_residual(
        &mut self,
        residual: &[f64; 2],
        residual_ok: &[bool; 2],
        rhs_norm: &[f64; 2],
    ) -> Result<(), SmoothingError> {
        if residual_ok.iter().all(|ok| *ok) {
            self.consecutive_mismatches = 0;
            return Ok(());
        }

        self.residual_mismatches += 1;
        self.consecutive_mismatches += 1;

        let axis = if residual_ok[0] { 1 } else { 0 };
        let tolerance = self.params.residual_atol + self.params.residual_rtol * rhs_norm[axis];
        warn!(
            "Iteration {}: residual of axis {} ({:e}) exceeds the tolerance ({:e})",
            self.iteration, axis, residual[axis], tolerance
        );

        match self.params.residual_mismatch_limit {
            Some(limit) if self.consecutive_mismatches >= limit => {
                Err(SmoothingError::ResidualMismatch {
                    iteration: self.iteration,
                    axis,
                    residual: residual[axis],
                    tolerance,
                })
            }
            _ => Ok(()),
        }
    }

    /// Write the solved interior coordinates into the Mesh and return the error metric
    fn update_interior(&mut self, coords: &[Point], solution: &DMatrix<f64>) -> f64 {
        let mut delta = [0.0; 2];
        for (row, node_id) in self.partition.interior().iter().enumerate() {
            let new_coords = Point::new(solution[(row, 0)], solution[(row, 1)]);
            let old_coords = coords[node_id - 1];
            delta[0] += (new_coords.x - old_coords.x).abs();
            delta[1] += (new_coords.y - old_coords.y).abs();

            self.domain.mesh.set_interior_coords(*node_id, new_coords);
        }

        match self.partition.num_interior() {
            0 => 0.0,
            num_interior => (delta[0].powi(2) + delta[1].powi(2)) / num_interior as f64,
        }
    }

    /// Undo [Self::update_interior]
    fn restore_interior(&mut self, coords: &[Point]) {
        for node_id in self.partition.interior() {
            self.domain.mesh.set_interior_coords(*node_id, coords[node_id - 1]);
        }
    }
}

/// Smooth a [Domain] in place with the given settings
///
/// # Returns
/// * An `Err` if the settings are invalid, or if an iteration fails (degenerate Element, empty stencil, singular system or
///   repeated residual failures). The Mesh then holds the coordinates of the last successful iteration.
/// * A [SmoothingReport] otherwise, converged or not
pub fn smooth(
    domain: &mut Domain,
    params: SmoothingParams,
) -> Result<SmoothingReport, SmoothingError> {
    Smoother::new(domain, params)?.run()
}

/// Load a Mesh from a JSON file, build its Domain and smooth it
pub fn smooth_mesh_file(
    path: impl AsRef<str>,
    params: SmoothingParams,
) -> Result<(Domain, SmoothingReport), SmoothingError> {
    let mut domain = Domain::from_mesh(Mesh::from_file(path)?);
    let report = smooth(&mut domain, params)?;
    Ok((domain, report))
}
