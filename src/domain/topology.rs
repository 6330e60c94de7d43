use super::mesh::element::Element;

#[cfg(feature = "json_export")]
use json::JsonValue;
use log::trace;
use smallvec::SmallVec;

/// Expected number of Elements sharing a Node. Determines the stack allocation size of the node incidence lists.
pub const EXPECTED_NODE_VALENCE: usize = 4;

/// Expected stencil size. Determines the stack allocation size of each Node's stencil.
pub const EXPECTED_STENCIL_SIZE: usize = 8;

/// A Node's stencil: sorted, de-duplicated (1-based) neighbor node ids
pub type Stencil = SmallVec<[usize; EXPECTED_STENCIL_SIZE]>;

/// Coordinate-independent connectivity of a Mesh. Computed once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Topology {
    pub elements: ElementAdjacency,
    pub nodes: NodeAdjacency,
}

impl Topology {
    pub fn build(elements: &[Element], boundary_loop: &[usize], num_nodes: usize) -> Self {
        let element_adjacency = ElementAdjacency::build(elements, num_nodes);
        let node_adjacency =
            NodeAdjacency::build(&element_adjacency, elements, boundary_loop, num_nodes);

        trace!(
            "Topology: {} elements ({} boundary sides), {} nodes (max stencil size {})",
            elements.len(),
            element_adjacency.num_boundary_sides(),
            num_nodes,
            node_adjacency.max_stencil_size(),
        );

        Self {
            elements: element_adjacency,
            nodes: node_adjacency,
        }
    }
}

/// Per Element, per side: the (1-based) id of the neighboring Element, or `None` if the side lies on the Mesh boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementAdjacency {
    neighbors: Vec<[Option<usize>; 4]>,
}

impl ElementAdjacency {
    /// For each side of each Element, find the first other Element (in id order) which contains both of the side's Nodes.
    /// Sides without such an Element are boundary sides.
    ///
    /// A node-to-element incidence index is used in place of a full scan over all Element pairs; the result is the same.
    pub fn build(elements: &[Element], num_nodes: usize) -> Self {
        let mut incidence: Vec<SmallVec<[usize; EXPECTED_NODE_VALENCE]>> =
            vec![SmallVec::new(); num_nodes];
        for (elem_idx, element) in elements.iter().enumerate() {
            for node_id in element.nodes.iter() {
                incidence[node_id - 1].push(elem_idx);
            }
        }

        let neighbors = elements
            .iter()
            .enumerate()
            .map(|(elem_idx, element)| {
                element.sides().map(|[node_a, node_b]| {
                    incidence[node_a - 1]
                        .iter()
                        .copied()
                        .find(|other_idx| {
                            *other_idx != elem_idx && elements[*other_idx].contains_node(node_b)
                        })
                        .map(|other_idx| other_idx + 1)
                })
            })
            .collect();

        Self { neighbors }
    }

    pub fn num_elements(&self) -> usize {
        self.neighbors.len()
    }

    /// The neighbors of an Element on each of its 4 sides
    pub fn of(&self, element_id: usize) -> &[Option<usize>; 4] {
        &self.neighbors[element_id - 1]
    }

    /// The neighbor across one side of an Element (`None` on the Mesh boundary)
    pub fn neighbor(&self, element_id: usize, side_idx: usize) -> Option<usize> {
        self.neighbors[element_id - 1][side_idx]
    }

    pub fn is_boundary_side(&self, element_id: usize, side_idx: usize) -> bool {
        self.neighbor(element_id, side_idx).is_none()
    }

    /// Iterate over `(element_id, neighbors)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Option<usize>; 4])> + '_ {
        self.neighbors
            .iter()
            .enumerate()
            .map(|(idx, neighbors)| (idx + 1, neighbors))
    }

    pub fn num_boundary_sides(&self) -> usize {
        self.neighbors
            .iter()
            .flat_map(|sides| sides.iter())
            .filter(|n| n.is_none())
            .count()
    }

    /// Json description: one array per Element, with `0` marking boundary sides
    #[cfg(feature = "json_export")]
    pub fn to_json(&self) -> JsonValue {
        JsonValue::from(
            self.neighbors
                .iter()
                .map(|sides| JsonValue::from(sides.map(|n| n.unwrap_or(0)).to_vec()))
                .collect::<Vec<_>>(),
        )
    }
}

/// Per Node: the set of neighboring Nodes forming its smoothing stencil
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAdjacency {
    stencils: Vec<Stencil>,
}

impl NodeAdjacency {
    /// 1. Seed each boundary Node's stencil with its two neighbors along the boundary loop (cyclic)
    /// 2. For every node of every Element, visit the Element's non-boundary neighbors; where a neighbor also contains the node,
    ///    add the two nodes adjacent to it along the neighbor's node cycle
    pub fn build(
        element_adjacency: &ElementAdjacency,
        elements: &[Element],
        boundary_loop: &[usize],
        num_nodes: usize,
    ) -> Self {
        let mut stencils: Vec<Stencil> = vec![SmallVec::new(); num_nodes];

        let bn = boundary_loop.len();
        for (loop_idx, node_id) in boundary_loop.iter().enumerate() {
            let next = boundary_loop[(loop_idx + 1) % bn];
            let prev = boundary_loop[(loop_idx + bn - 1) % bn];
            insert_sorted(&mut stencils[node_id - 1], next);
            insert_sorted(&mut stencils[node_id - 1], prev);
        }

        for element in elements.iter() {
            for node_id in element.nodes.iter() {
                for neighbor_id in element_adjacency.of(element.id).iter().flatten() {
                    let neighbor = &elements[neighbor_id - 1];
                    if let Some(local_idx) = neighbor.local_index_of(*node_id) {
                        for adj_node_id in neighbor.cycle_neighbors(local_idx) {
                            insert_sorted(&mut stencils[node_id - 1], adj_node_id);
                        }
                    }
                }
            }
        }

        Self { stencils }
    }

    /// Node adjacency from explicit neighbor lists (`stencils[node_id - 1]`); duplicates are removed
    pub fn from_stencils(stencils: Vec<Vec<usize>>) -> Self {
        Self {
            stencils: stencils
                .into_iter()
                .map(|neighbors| {
                    let mut stencil = Stencil::new();
                    for node_id in neighbors {
                        insert_sorted(&mut stencil, node_id);
                    }
                    stencil
                })
                .collect(),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.stencils.len()
    }

    /// The stencil of a Node (sorted neighbor ids)
    pub fn stencil(&self, node_id: usize) -> &[usize] {
        &self.stencils[node_id - 1]
    }

    /// Iterate over `(node_id, stencil)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> + '_ {
        self.stencils
            .iter()
            .enumerate()
            .map(|(idx, stencil)| (idx + 1, stencil.as_slice()))
    }

    pub fn max_stencil_size(&self) -> usize {
        self.stencils.iter().map(|s| s.len()).max().unwrap_or(0)
    }

    /// Json description: one array of neighbor ids per Node
    #[cfg(feature = "json_export")]
    pub fn to_json(&self) -> JsonValue {
        JsonValue::from(
            self.stencils
                .iter()
                .map(|stencil| JsonValue::from(stencil.to_vec()))
                .collect::<Vec<_>>(),
        )
    }
}

fn insert_sorted(stencil: &mut Stencil, node_id: usize) {
    if let Err(pos) = stencil.binary_search(&node_id) {
        stencil.insert(pos, node_id);
    }
}
