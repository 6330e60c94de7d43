use crate::domain::{mesh::space::Point, topology::NodeAdjacency};
use thiserror::Error;

/// Average position of every Node's stencil: `rbar_i = (1 / |S_i|) sum_{j in S_i} r_j`
///
/// `coords` and the result are indexed by `node_id - 1`.
///
/// Returns an `Err` if any Node has an empty stencil.
pub fn stencil_averages(
    adjacency: &NodeAdjacency,
    coords: &[Point],
) -> Result<Vec<Point>, StencilError> {
    adjacency
        .iter()
        .map(|(node_id, stencil)| {
            if stencil.is_empty() {
                return Err(StencilError::IsolatedNode { node_id });
            }
            let sum = stencil
                .iter()
                .fold(Point::default(), |acc, neighbor_id| acc + coords[neighbor_id - 1]);
            Ok(sum / stencil.len() as f64)
        })
        .collect()
}

/// Error type for stencil averaging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StencilError {
    #[error("Node {node_id} has no stencil neighbors; cannot compute its average position!")]
    IsolatedNode { node_id: usize },
}
