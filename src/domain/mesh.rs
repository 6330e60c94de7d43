/// A 4-node quadrilateral
pub mod element;
/// A mesh vertex
pub mod node;
/// Points, vectors and 2x2 tensors in the plane
pub mod space;

use element::Element;
use node::Node;
use space::Point;

#[cfg(feature = "json_export")]
use json::object;
use json::JsonValue;
use std::fs::read_to_string;
#[cfg(feature = "json_export")]
use std::fs::File;
#[cfg(feature = "json_export")]
use std::io::BufWriter;
use thiserror::Error;

/// Minimum number of nodes in a boundary loop
pub const MIN_BOUNDARY_LOOP_LEN: usize = 3;

/// A structured quadrilateral mesh with a fixed boundary loop.
///
/// Node and Element ids are 1-based and dense (`1..=N`, `1..=E`); `nodes[id - 1].id == id`.
/// The boundary loop lists the boundary node ids in cyclic order.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub nodes: Vec<Node>,
    pub elements: Vec<Element>,
    pub boundary_loop: Vec<usize>,
}

impl Mesh {
    /// Construct a Mesh from node coordinates (node `i + 1` sits at `points[i]`), element node lists (1-based, counter-clockwise) and the boundary loop
    ///
    /// ```text
    ///     4 ------- 3
    ///     |         |
    ///     |    1    |
    ///     |         |
    ///     1 ------- 2
    /// ```
    /// ```
    /// use lb_smooth_2d::{Mesh, Point};
    ///
    /// let mesh = Mesh::new(
    ///     vec![
    ///         Point::new(0.0, 0.0),
    ///         Point::new(1.0, 0.0),
    ///         Point::new(1.0, 1.0),
    ///         Point::new(0.0, 1.0),
    ///     ],
    ///     vec![[1, 2, 3, 4]],
    ///     vec![1, 2, 3, 4],
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(mesh.num_nodes(), 4);
    /// assert!(mesh.nodes.iter().all(|node| node.boundary));
    /// assert!((mesh.total_area() - 1.0).abs() < 1e-14);
    /// ```
    pub fn new(
        points: Vec<Point>,
        element_node_ids: Vec<[usize; 4]>,
        boundary_loop: Vec<usize>,
    ) -> Result<Self, MeshError> {
        if points.is_empty() {
            return Err(MeshError::Empty("nodes"));
        }
        if element_node_ids.is_empty() {
            return Err(MeshError::Empty("elements"));
        }
        let num_nodes = points.len();

        if let Some(node_id) = points
            .iter()
            .position(|p| !p.is_finite())
            .map(|idx| idx + 1)
        {
            return Err(MeshError::NonFiniteCoordinates(node_id));
        }

        // every element must reference 4 unique, existing nodes
        let mut referenced = vec![false; num_nodes];
        for (elem_idx, node_ids) in element_node_ids.iter().enumerate() {
            for node_id in node_ids.iter() {
                if *node_id == 0 || *node_id > num_nodes {
                    return Err(MeshError::NodeIdOutOfRange {
                        node_id: *node_id,
                        num_nodes,
                    });
                }
                referenced[node_id - 1] = true;
            }
            if has_duplicates(node_ids) {
                return Err(MeshError::RepeatedElementNode {
                    element_id: elem_idx + 1,
                });
            }
        }
        if let Some(idx) = referenced.iter().position(|r| !r) {
            return Err(MeshError::UnreferencedNode(idx + 1));
        }

        // boundary loop
        if boundary_loop.len() < MIN_BOUNDARY_LOOP_LEN {
            return Err(MeshError::BoundaryLoopTooShort(boundary_loop.len()));
        }
        let mut on_boundary = vec![false; num_nodes];
        for node_id in boundary_loop.iter() {
            if *node_id == 0 || *node_id > num_nodes {
                return Err(MeshError::NodeIdOutOfRange {
                    node_id: *node_id,
                    num_nodes,
                });
            }
            if on_boundary[node_id - 1] {
                return Err(MeshError::RepeatedBoundaryNode(*node_id));
            }
            on_boundary[node_id - 1] = true;
        }

        let nodes = points
            .into_iter()
            .enumerate()
            .map(|(idx, point)| Node::new(idx + 1, point, on_boundary[idx]))
            .collect();

        let elements = element_node_ids
            .into_iter()
            .enumerate()
            .map(|(idx, node_ids)| Element::new(idx + 1, node_ids))
            .collect();

        Ok(Self {
            nodes,
            elements,
            boundary_loop,
        })
    }

    /// Construct a Mesh from a JSON file with the following format (all ids are 1-based)
    ///
    /// ```text
    ///     4 ------- 3 ------- 6
    ///     |         |         |
    ///     |    1    |    2    |
    ///     |         |         |
    ///     1 ------- 2 ------- 5
    /// ```
    ///
    /// mesh.json
    /// ```JSON
    /// {
    ///     "Nodes": [
    ///         [0.0, 0.0], [1.0, 0.0], [1.0, 1.0],
    ///         [0.0, 1.0], [2.0, 0.0], [2.0, 1.0]
    ///     ],
    ///     "Elements": [
    ///         [1, 2, 3, 4],
    ///         [2, 5, 6, 3]
    ///     ],
    ///     "Boundary": [1, 2, 5, 6, 3, 4]
    /// }
    /// ```
    pub fn from_file(path: impl AsRef<str>) -> Result<Self, MeshError> {
        let mesh_file_contents = read_to_string(path.as_ref())?;
        Self::from_json_str(&mesh_file_contents)
    }

    /// Construct a Mesh from a JSON string (see [Mesh::from_file] for the format)
    pub fn from_json_str(contents: &str) -> Result<Self, MeshError> {
        let mesh_json = json::parse(contents).map_err(|err| MeshError::Parse(err.to_string()))?;

        let points = parse_node_information(&mesh_json)?;
        let element_node_ids = parse_element_information(&mesh_json)?;
        let boundary_loop = parse_boundary_information(&mesh_json)?;

        Self::new(points, element_node_ids, boundary_loop)
    }

    /// Print the mesh to a JSON file specified by path (in the format read by [Mesh::from_file])
    #[cfg(feature = "json_export")]
    pub fn export_to_json(&self, path: impl AsRef<str>) -> std::io::Result<()> {
        let f = File::create(path.as_ref())?;
        let mut w = BufWriter::new(&f);
        self.to_json().write_pretty(&mut w, 4)
    }

    /// Produce a Json Object that describes this Mesh
    #[cfg(feature = "json_export")]
    pub fn to_json(&self) -> JsonValue {
        object! {
            "Nodes": JsonValue::from(
                self.nodes
                    .iter()
                    .map(|node| JsonValue::from(vec![node.coords.x, node.coords.y]))
                    .collect::<Vec<_>>()
            ),
            "Elements": JsonValue::from(
                self.elements
                    .iter()
                    .map(|element| JsonValue::from(element.nodes.to_vec()))
                    .collect::<Vec<_>>()
            ),
            "Boundary": JsonValue::from(self.boundary_loop.clone()),
        }
    }

    // ----------------------------------------------------------------------------------------------------
    // General Data Retrieval
    // ----------------------------------------------------------------------------------------------------

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn num_boundary_nodes(&self) -> usize {
        self.boundary_loop.len()
    }

    /// Get a [Node] by its 1-based id
    pub fn node(&self, node_id: usize) -> &Node {
        assert!(node_id >= 1 && node_id <= self.nodes.len());
        &self.nodes[node_id - 1]
    }

    /// Get an [Element] by its 1-based id
    pub fn element(&self, element_id: usize) -> &Element {
        assert!(element_id >= 1 && element_id <= self.elements.len());
        &self.elements[element_id - 1]
    }

    /// Current coordinates of every node, ordered by node id
    pub fn coords(&self) -> Vec<Point> {
        self.nodes.iter().map(|node| node.coords).collect()
    }

    /// Get the four corner [Point]s of an [Element] (in its node order)
    pub fn element_points(&self, element_id: usize) -> [Point; 4] {
        self.element(element_id)
            .nodes
            .map(|node_id| self.nodes[node_id - 1].coords)
    }

    /// Signed area and centroid of an [Element] (shoelace formula over the corner loop).
    ///
    /// The area is positive for counter-clockwise elements.
    pub fn element_area_and_centroid(&self, element_id: usize) -> (f64, Point) {
        let points = self.element_points(element_id);

        let mut area = 0.0;
        let mut centroid = Point::default();
        for i in 0..4 {
            let [p0, p1] = [points[i], points[(i + 1) % 4]];
            let cross = p0.x * p1.y - p1.x * p0.y;
            area += cross;
            centroid += (p0 + p1) * cross;
        }
        area /= 2.0;

        (area, centroid / (6.0 * area))
    }

    /// Sum of the signed areas of every [Element]
    pub fn total_area(&self) -> f64 {
        self.elements
            .iter()
            .map(|element| self.element_area_and_centroid(element.id).0)
            .sum()
    }

    /// Move an interior node. Boundary nodes are fixed.
    pub(crate) fn set_interior_coords(&mut self, node_id: usize, coords: Point) {
        let node = &mut self.nodes[node_id - 1];
        debug_assert!(!node.boundary, "Boundary Node {} cannot be moved!", node_id);
        node.coords = coords;
    }
}

/// Error type for [Mesh] construction
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("Mesh has no {0}; cannot construct Mesh!")]
    Empty(&'static str),
    #[error("Node id {node_id} is outside the range 1..={num_nodes}!")]
    NodeIdOutOfRange { node_id: usize, num_nodes: usize },
    #[error("Element {element_id} references the same Node more than once!")]
    RepeatedElementNode { element_id: usize },
    #[error("Node {0} is not referenced by any Element!")]
    UnreferencedNode(usize),
    #[error("Node {0} has non-finite coordinates!")]
    NonFiniteCoordinates(usize),
    #[error("Boundary loop must contain at least 3 nodes (found {0})!")]
    BoundaryLoopTooShort(usize),
    #[error("Node {0} appears more than once in the boundary loop!")]
    RepeatedBoundaryNode(usize),
    #[error("Unable to parse Mesh file: {0}")]
    Parse(String),
    #[error("Unable to read Mesh file: {0}")]
    Io(#[from] std::io::Error),
}

// ----------------------------------------------------------------------------------------------------
// Mesh construction from JSON Utility functions
// ----------------------------------------------------------------------------------------------------

fn parse_node_information(mesh_json: &JsonValue) -> Result<Vec<Point>, MeshError> {
    if !mesh_json["Nodes"].is_array() {
        return Err(MeshError::Parse("Nodes must be an Array!".to_string()));
    }

    mesh_json["Nodes"]
        .members()
        .map(|json_node_point| {
            if !json_node_point.is_array() || json_node_point.members().count() != 2 {
                return Err(MeshError::Parse(
                    "Nodes must be arrays of length 2!".to_string(),
                ));
            }
            match (json_node_point[0].as_f64(), json_node_point[1].as_f64()) {
                (Some(x), Some(y)) => Ok(Point::new(x, y)),
                _ => Err(MeshError::Parse(
                    "Nodes must be composed of numerical values!".to_string(),
                )),
            }
        })
        .collect()
}

fn parse_element_information(mesh_json: &JsonValue) -> Result<Vec<[usize; 4]>, MeshError> {
    if !mesh_json["Elements"].is_array() {
        return Err(MeshError::Parse("Elements must be an Array!".to_string()));
    }

    mesh_json["Elements"]
        .members()
        .map(|json_element| {
            let node_ids = parse_id_list(json_element, "Elements")?;
            node_ids.try_into().map_err(|_| {
                MeshError::Parse("Elements must have exactly 4 node ids!".to_string())
            })
        })
        .collect()
}

fn parse_boundary_information(mesh_json: &JsonValue) -> Result<Vec<usize>, MeshError> {
    parse_id_list(&mesh_json["Boundary"], "Boundary")
}

fn parse_id_list(json_ids: &JsonValue, what: &str) -> Result<Vec<usize>, MeshError> {
    if !json_ids.is_array() {
        return Err(MeshError::Parse(format!("{} must be Arrays of node ids!", what)));
    }
    json_ids
        .members()
        .map(|id| {
            id.as_usize().ok_or_else(|| {
                MeshError::Parse(format!("{} node ids must be positive integers!", what))
            })
        })
        .collect()
}

fn has_duplicates<T>(values: &[T]) -> bool
where
    T: PartialEq,
{
    for (i, val) in values.iter().enumerate() {
        for val_cmp in values.iter().skip(i + 1) {
            if val == val_cmp {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{grid_3x3, GRID_3X3_BOUNDARY};

    fn unit_square_points() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]
    }

    #[test]
    fn mesh_from_file() {
        let mesh = Mesh::from_file("./test_input/mesh_3x3.json").unwrap();
        let reference = grid_3x3();

        assert_eq!(mesh.num_nodes(), 16);
        assert_eq!(mesh.num_elements(), 9);
        assert_eq!(mesh.boundary_loop, GRID_3X3_BOUNDARY.to_vec());

        for (node, node_ref) in mesh.nodes.iter().zip(reference.nodes.iter()) {
            assert_eq!(node.id, node_ref.id);
            assert_eq!(node.coords, node_ref.coords);
            assert_eq!(node.boundary, node_ref.boundary);
        }
        assert_eq!(mesh.elements, reference.elements);
    }

    #[test]
    fn boundary_flags_follow_loop() {
        let mesh = grid_3x3();
        let interior: Vec<usize> = mesh
            .nodes
            .iter()
            .filter(|node| !node.boundary)
            .map(|node| node.id)
            .collect();
        assert_eq!(interior, vec![3, 6, 10, 11]);
    }

    #[test]
    fn areas_and_centroids() {
        let mesh = grid_3x3();
        let (area, centroid) = mesh.element_area_and_centroid(7);
        assert!((area - 1.0).abs() < 1e-14);
        assert!((centroid.x - 1.5).abs() < 1e-14);
        assert!((centroid.y - 1.5).abs() < 1e-14);

        assert!((mesh.total_area() - 9.0).abs() < 1e-12);
    }

    #[cfg(feature = "json_export")]
    #[test]
    fn json_round_trip() {
        let mesh = grid_3x3();
        let copy = Mesh::from_json_str(&mesh.to_json().dump()).unwrap();

        assert_eq!(copy.elements, mesh.elements);
        assert_eq!(copy.boundary_loop, mesh.boundary_loop);
        assert_eq!(copy.coords(), mesh.coords());
    }

    #[test]
    fn bad_node_id() {
        let err = Mesh::new(
            unit_square_points(),
            vec![[1, 2, 3, 5]],
            vec![1, 2, 3, 4],
        )
        .unwrap_err();
        assert!(matches!(err, MeshError::NodeIdOutOfRange { node_id: 5, .. }));
    }

    #[test]
    fn repeated_element_node() {
        let err = Mesh::new(
            unit_square_points(),
            vec![[1, 2, 3, 4], [1, 2, 2, 4]],
            vec![1, 2, 3, 4],
        )
        .unwrap_err();
        assert!(matches!(err, MeshError::RepeatedElementNode { element_id: 2 }));
    }

    #[test]
    fn bad_boundary_loops() {
        let points = unit_square_points();

        assert!(matches!(
            Mesh::new(points.clone(), vec![[1, 2, 3, 4]], vec![1, 2]).unwrap_err(),
            MeshError::BoundaryLoopTooShort(2)
        ));
        assert!(matches!(
            Mesh::new(points, vec![[1, 2, 3, 4]], vec![1, 2, 3, 2]).unwrap_err(),
            MeshError::RepeatedBoundaryNode(2)
        ));
    }

    #[test]
    fn unreferenced_node() {
        let err = Mesh::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(1.0, 1.0),
                Point::new(0.0, 1.0),
                Point::new(5.0, 5.0),
            ],
            vec![[1, 2, 3, 4]],
            vec![1, 2, 3, 4],
        )
        .unwrap_err();
        assert!(matches!(err, MeshError::UnreferencedNode(5)));
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            Mesh::from_json_str(r#"{"Nodes": [[0.0]], "Elements": [], "Boundary": []}"#)
                .unwrap_err(),
            MeshError::Parse(_)
        ));
        assert!(matches!(
            Mesh::from_json_str(
                r#"{"Nodes": [[0.0, 0.0]], "Elements": [[1, 1, 1]], "Boundary": []}"#,
            )
            .unwrap_err(),
            MeshError::Parse(_)
        ));
        assert!(matches!(
            Mesh::from_file("./test_input/does_not_exist.json").unwrap_err(),
            MeshError::Io(_)
        ));
    }
}
