//! Elliptic (Laplace-Beltrami / Winslow) smoothing of structured quadrilateral meshes.
//!
//! Interior node positions are relocated by repeatedly solving a discrete Laplace-Beltrami problem whose metric
//! is computed from stencil-averaged node positions, while the boundary nodes stay fixed.
//!
//! ```
//! use lb_smooth_2d::{smooth, Domain, Mesh, Point, SmoothingParams};
//!
//! // a 2 x 3 block of unit squares with interior node 5 pushed off the lattice
//! let mesh = Mesh::from_json_str(
//!     r#"{
//!         "Nodes": [[0, 0], [1, 0], [2, 0], [0, 2], [1.6, 1], [2, 2], [0, 1], [1, 2], [2, 1],
//!                   [0, 3], [1, 3], [2, 3]],
//!         "Elements": [[1, 2, 5, 7], [2, 3, 9, 5], [7, 5, 8, 4], [5, 9, 6, 8],
//!                      [4, 8, 11, 10], [8, 6, 12, 11]],
//!         "Boundary": [1, 2, 3, 9, 6, 12, 11, 10, 4, 7]
//!     }"#,
//! )
//! .unwrap();
//!
//! let mut domain = Domain::from_mesh(mesh);
//! let report = smooth(&mut domain, SmoothingParams::default()).unwrap();
//!
//! assert!(report.is_converged());
//! assert!(domain.mesh.node(5).coords.x < 1.6);
//! assert_eq!(domain.mesh.node(9).coords, Point::new(2.0, 1.0));
//! ```

/// Bilinear shape functions over the reference square
pub mod basis;
/// Meshes and their Topology
pub mod domain;
/// Quadrature, metric tensors and Element integrals
pub mod integration;
/// Global assembly and linear solves
pub mod linalg;
/// The smoothing iteration
pub mod smoothing;

pub use domain::{
    mesh::{space::Point, Mesh, MeshError},
    topology::Topology,
    Domain,
};
pub use smoothing::{
    smooth, smooth_mesh_file, MetricSource, Smoother, SmootherState, SmoothingError,
    SmoothingParams, SmoothingReport, TerminalState,
};
