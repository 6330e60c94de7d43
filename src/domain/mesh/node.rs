use super::space::Point;
#[cfg(feature = "json_export")]
use json::{object, JsonValue};

/// A mesh vertex. `id` is 1-based.
///
/// Only the smoother moves a `Node`; boundary nodes never move.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: usize,
    pub coords: Point,
    pub boundary: bool,
}

impl Node {
    pub fn new(id: usize, coords: Point, boundary: bool) -> Self {
        Self {
            id,
            coords,
            boundary,
        }
    }

    /// Produce a Json Object that describes this Node
    #[cfg(feature = "json_export")]
    pub fn to_json(&self) -> JsonValue {
        object! {
            "id": self.id,
            "x": self.coords.x,
            "y": self.coords.y,
            "boundary": self.boundary,
        }
    }
}
