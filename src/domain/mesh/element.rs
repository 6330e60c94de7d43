#[cfg(feature = "json_export")]
use json::{object, JsonValue};

/*
    side - local node pair relationships (counter-clockwise)

    side 0 : [node_0, node_1]
    side 1 : [node_1, node_2]
    side 2 : [node_2, node_3]
    side 3 : [node_3, node_0]

        3 --------- 2
        |     2     |
        |3         1|
        |     0     |
        0 --------- 1
*/
/// Local node indices composing each side of an [Element]
pub const SIDE_IDX_DEFS: [[usize; 2]; 4] = [[0, 1], [1, 2], [2, 3], [3, 0]];

/// A 4-node quadrilateral, defined by its (1-based) node ids in counter-clockwise order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: usize,
    pub nodes: [usize; 4],
}

impl Element {
    pub fn new(id: usize, nodes: [usize; 4]) -> Self {
        Self { id, nodes }
    }

    /// The pair of node ids on side `side_idx`
    pub fn side(&self, side_idx: usize) -> [usize; 2] {
        let [a, b] = SIDE_IDX_DEFS[side_idx];
        [self.nodes[a], self.nodes[b]]
    }

    /// All four sides in cyclic order
    pub fn sides(&self) -> [[usize; 2]; 4] {
        [0, 1, 2, 3].map(|side_idx| self.side(side_idx))
    }

    pub fn contains_node(&self, node_id: usize) -> bool {
        self.nodes.contains(&node_id)
    }

    /// Position of `node_id` within this element's node cycle
    pub fn local_index_of(&self, node_id: usize) -> Option<usize> {
        self.nodes.iter().position(|n| *n == node_id)
    }

    /// The two nodes adjacent to the node at `local_idx` along the element's cycle: `[idx + 1, idx - 1] (mod 4)`
    pub fn cycle_neighbors(&self, local_idx: usize) -> [usize; 2] {
        [self.nodes[(local_idx + 1) % 4], self.nodes[(local_idx + 3) % 4]]
    }

    /// Produce a Json Object that describes this Element
    #[cfg(feature = "json_export")]
    pub fn to_json(&self) -> JsonValue {
        object! {
            "id": self.id,
            "node_ids": JsonValue::from(self.nodes.to_vec()),
        }
    }
}
