use super::LinalgError;
use crate::domain::mesh::{element::Element, space::Point};
use crate::integration::{metric::MetricError, stiffness::LocalStiffness, ElementError};

use nalgebra::DMatrix;
use rayon::prelude::*;

/// Dense, square global stiffness matrix indexed by `node_id - 1`
#[derive(Clone, Debug)]
pub struct GlobalStiffness {
    pub matrix: DMatrix<f64>,
}

impl GlobalStiffness {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            matrix: DMatrix::zeros(num_nodes, num_nodes),
        }
    }

    pub fn dimension(&self) -> usize {
        self.matrix.nrows()
    }

    /// Add an Element's local matrix into the global matrix: `K[node_m - 1, node_n - 1] += k[m, n]`
    pub fn scatter(&mut self, element: &Element, local: &LocalStiffness) {
        for (m, row_id) in element.nodes.iter().enumerate() {
            assert!(
                *row_id >= 1 && *row_id <= self.dimension(),
                "Node id exceeded matrix dimension; cannot scatter local matrix!"
            );
            for (n, col_id) in element.nodes.iter().enumerate() {
                self.matrix[(row_id - 1, col_id - 1)] += local[(m, n)];
            }
        }
    }

    /// Compute every Element's local matrix with `local_fn` and assemble them.
    ///
    /// Local matrices are computed in parallel over the Rayon Global Threadpool, then scattered in Element order,
    /// so the result does not depend on the thread count.
    ///
    /// Returns an `Err` naming the Element if any local computation fails.
    pub fn assemble_with<F>(
        num_nodes: usize,
        elements: &[Element],
        local_fn: F,
    ) -> Result<Self, ElementError>
    where
        F: Fn(&Element) -> Result<LocalStiffness, MetricError> + Sync,
    {
        let local_matrices = elements
            .par_iter()
            .map(|element| local_fn(element).map_err(|err| ElementError::new(element.id, err)))
            .collect::<Result<Vec<_>, ElementError>>()?;

        let mut global = Self::new(num_nodes);
        for (element, local) in elements.iter().zip(local_matrices.iter()) {
            global.scatter(element, local);
        }
        Ok(global)
    }

    /// Extract the blocks `P = K[interior, boundary]` and `Q = K[interior, interior]`
    pub fn partition(
        &self,
        partition: &NodePartition,
    ) -> Result<(DMatrix<f64>, DMatrix<f64>), LinalgError> {
        let n = partition.num_nodes();
        if self.dimension() != n {
            return Err(LinalgError::DimensionMismatch {
                expected: (n, n),
                found: self.matrix.shape(),
            });
        }

        let p = DMatrix::from_fn(partition.num_interior(), partition.num_boundary(), |r, c| {
            self.matrix[(partition.interior[r] - 1, partition.boundary[c] - 1)]
        });
        let q = DMatrix::from_fn(partition.num_interior(), partition.num_interior(), |r, c| {
            self.matrix[(partition.interior[r] - 1, partition.interior[c] - 1)]
        });

        Ok((p, q))
    }
}

/// Node ids split into fixed (boundary) and free (interior) sets, each in ascending order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodePartition {
    boundary: Vec<usize>,
    interior: Vec<usize>,
}

impl NodePartition {
    /// Boundary nodes are `1..=num_boundary`, interior nodes are the rest
    pub fn contiguous(num_nodes: usize, num_boundary: usize) -> Self {
        assert!(num_boundary <= num_nodes);
        Self {
            boundary: (1..=num_boundary).collect(),
            interior: (num_boundary + 1..=num_nodes).collect(),
        }
    }

    /// Boundary nodes are the members of `boundary_loop`, in any numbering
    ///
    /// ```
    /// use lb_smooth_2d::linalg::assembly::NodePartition;
    ///
    /// let partition = NodePartition::from_boundary(6, &[1, 2, 6, 5, 4]);
    /// assert_eq!(partition.boundary(), &[1, 2, 4, 5, 6]);
    /// assert_eq!(partition.interior(), &[3]);
    ///
    /// assert_eq!(
    ///     NodePartition::from_boundary(6, &[1, 2, 3, 4]),
    ///     NodePartition::contiguous(6, 4)
    /// );
    /// ```
    pub fn from_boundary(num_nodes: usize, boundary_loop: &[usize]) -> Self {
        let mut is_boundary = vec![false; num_nodes];
        for node_id in boundary_loop {
            is_boundary[node_id - 1] = true;
        }

        let (boundary, interior): (Vec<usize>, Vec<usize>) =
            (1..=num_nodes).partition(|node_id| is_boundary[node_id - 1]);
        Self { boundary, interior }
    }

    pub fn boundary(&self) -> &[usize] {
        &self.boundary
    }

    pub fn interior(&self) -> &[usize] {
        &self.interior
    }

    pub fn num_boundary(&self) -> usize {
        self.boundary.len()
    }

    pub fn num_interior(&self) -> usize {
        self.interior.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.boundary.len() + self.interior.len()
    }

    /// `(num_boundary x 2)` matrix of boundary coordinates; `coords` is indexed by `node_id - 1`
    pub fn boundary_coords(&self, coords: &[Point]) -> DMatrix<f64> {
        Self::gather(&self.boundary, coords)
    }

    /// `(num_interior x 2)` matrix of interior coordinates; `coords` is indexed by `node_id - 1`
    pub fn interior_coords(&self, coords: &[Point]) -> DMatrix<f64> {
        Self::gather(&self.interior, coords)
    }

    fn gather(node_ids: &[usize], coords: &[Point]) -> DMatrix<f64> {
        DMatrix::from_fn(node_ids.len(), 2, |r, c| {
            let point = coords[node_ids[r] - 1];
            if c == 0 {
                point.x
            } else {
                point.y
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::BasisSampler;
    use crate::domain::fixtures::{
        grid_3x3, renumbered_grid_3x3, GRID_3X3_BOUNDARY, GRID_3X3_INTERIOR,
    };
    use crate::integration::stiffness::{local_stiffness, MetricEvaluation};

    fn assemble(mesh: &crate::domain::mesh::Mesh) -> GlobalStiffness {
        let sampler = BasisSampler::with(4);
        GlobalStiffness::assemble_with(mesh.num_nodes(), &mesh.elements, |element| {
            local_stiffness(
                &mesh.element_points(element.id),
                &sampler,
                MetricEvaluation::PerPoint,
            )
        })
        .unwrap()
    }

    #[test]
    fn assembled_rows_sum_to_zero() {
        let k = assemble(&grid_3x3());
        assert_eq!(k.dimension(), 16);
        for r in 0..16 {
            assert!(k.matrix.row(r).sum().abs() < 1e-12);
            for c in 0..16 {
                assert!((k.matrix[(r, c)] - k.matrix[(c, r)]).abs() < 1e-13);
            }
        }

        // interior node 3 is shared by 4 unit squares
        assert!((k.matrix[(2, 2)] - 4.0 * 2.0 / 3.0).abs() < 1e-12);
        // nodes 1 and 5 share no Element
        assert_eq!(k.matrix[(0, 4)], 0.0);
    }

    #[test]
    fn scatter_uses_one_based_ids() {
        let mut k = GlobalStiffness::new(5);
        let element = Element::new(1, [2, 3, 5, 1]);
        let local = LocalStiffness::from_fn(|m, n| (10 * m + n) as f64);
        k.scatter(&element, &local);

        assert_eq!(k.matrix[(1, 2)], 1.0);
        assert_eq!(k.matrix[(4, 0)], 23.0);
        assert_eq!(k.matrix[(3, 3)], 0.0);
    }

    #[test]
    fn failing_element_is_named() {
        let err = GlobalStiffness::assemble_with(16, &grid_3x3().elements, |element| {
            if element.id == 7 {
                Err(MetricError::Degenerate {
                    determinant: 0.0,
                    jacobian: 0.0,
                })
            } else {
                Ok(LocalStiffness::zeros())
            }
        })
        .unwrap_err();
        assert_eq!(err.element_id, 7);
    }

    #[test]
    fn partition_blocks() {
        let mesh = grid_3x3();
        let k = assemble(&mesh);
        let partition = NodePartition::from_boundary(mesh.num_nodes(), &mesh.boundary_loop);
        assert_eq!(partition.interior(), &GRID_3X3_INTERIOR);
        assert_eq!(partition.num_boundary(), 12);

        let (p, q) = k.partition(&partition).unwrap();
        assert_eq!(p.shape(), (4, 12));
        assert_eq!(q.shape(), (4, 4));

        // row sums of [P Q] vanish
        for r in 0..4 {
            assert!((p.row(r).sum() + q.row(r).sum()).abs() < 1e-12);
        }

        let wrong_size = NodePartition::contiguous(10, 4);
        assert!(matches!(
            k.partition(&wrong_size),
            Err(LinalgError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn contiguous_numbering_matches_loop_membership() {
        let mesh = renumbered_grid_3x3();
        let k = assemble(&mesh);

        let contiguous = NodePartition::contiguous(16, 12);
        let from_loop = NodePartition::from_boundary(16, &mesh.boundary_loop);
        assert_eq!(contiguous, from_loop);

        let (p_a, q_a) = k.partition(&contiguous).unwrap();
        let (p_b, q_b) = k.partition(&from_loop).unwrap();
        assert_eq!(p_a, p_b);
        assert_eq!(q_a, q_b);

        // same blocks as the original numbering, up to the order of the boundary columns
        let original = grid_3x3();
        let original_partition = NodePartition::from_boundary(16, &original.boundary_loop);
        let (p_o, q_o) = assemble(&original).partition(&original_partition).unwrap();
        assert!((q_a - q_o).amax() < 1e-12);
        for (new_col, old_id) in GRID_3X3_BOUNDARY.iter().enumerate() {
            let old_col = original_partition
                .boundary()
                .iter()
                .position(|id| id == old_id)
                .unwrap();
            for r in 0..4 {
                assert!((p_a[(r, new_col)] - p_o[(r, old_col)]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn coordinate_blocks() {
        let mesh = grid_3x3();
        let partition = NodePartition::from_boundary(16, &mesh.boundary_loop);
        let interior = partition.interior_coords(&mesh.coords());
        assert_eq!(interior.shape(), (4, 2));
        assert_eq!(interior[(1, 0)], 2.0);
        assert_eq!(interior[(1, 1)], 1.0);

        let boundary = partition.boundary_coords(&mesh.coords());
        assert_eq!(boundary.shape(), (12, 2));
        assert_eq!(boundary[(11, 0)], 0.0);
        assert_eq!(boundary[(11, 1)], 3.0);
    }
}
