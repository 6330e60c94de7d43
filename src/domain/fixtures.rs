//! Meshes shared by the unit tests

use super::mesh::{space::Point, Mesh};

/*
    16 ----- 15 ----- 14 ----- 13
     |        |        |        |
     |   9    |   5    |   6    |
     |        |        |        |
    12 ----- 11 ----- 10 ------ 9
     |        |        |        |
     |   8    |   7    |   4    |
     |        |        |        |
     4 ------ 3 ------ 6 ------ 8
     |        |        |        |
     |   1    |   2    |   3    |
     |        |        |        |
     1 ------ 2 ------ 5 ------ 7
*/
pub const GRID_3X3_POINTS: [[f64; 2]; 16] = [
    [0.0, 0.0],
    [1.0, 0.0],
    [1.0, 1.0],
    [0.0, 1.0],
    [2.0, 0.0],
    [2.0, 1.0],
    [3.0, 0.0],
    [3.0, 1.0],
    [3.0, 2.0],
    [2.0, 2.0],
    [1.0, 2.0],
    [0.0, 2.0],
    [3.0, 3.0],
    [2.0, 3.0],
    [1.0, 3.0],
    [0.0, 3.0],
];

pub const GRID_3X3_ELEMENTS: [[usize; 4]; 9] = [
    [1, 2, 3, 4],
    [2, 5, 6, 3],
    [5, 7, 8, 6],
    [6, 8, 9, 10],
    [11, 10, 14, 15],
    [10, 9, 13, 14],
    [3, 6, 10, 11],
    [4, 3, 11, 12],
    [12, 11, 15, 16],
];

pub const GRID_3X3_BOUNDARY: [usize; 12] = [1, 2, 5, 7, 8, 9, 13, 14, 15, 16, 12, 4];

pub const GRID_3X3_INTERIOR: [usize; 4] = [3, 6, 10, 11];

/// The 16 node, 9 element grid on `[0, 3] x [0, 3]`
pub fn grid_3x3() -> Mesh {
    grid_3x3_with(GRID_3X3_POINTS.map(Point::from).to_vec())
}

/// The same grid with interior nodes 3 and 11 pushed off the lattice
pub fn distorted_grid_3x3() -> Mesh {
    let mut points = GRID_3X3_POINTS.map(Point::from).to_vec();
    points[2] = Point::new(1.4, 0.7);
    points[10] = Point::new(0.8, 2.3);
    grid_3x3_with(points)
}

/// The grid renumbered so that the boundary nodes are `1..=12` (in loop order) and the interior nodes are `13..=16`
pub fn renumbered_grid_3x3() -> Mesh {
    let mut new_ids = [0; 16];
    for (new_idx, old_id) in GRID_3X3_BOUNDARY
        .iter()
        .chain(GRID_3X3_INTERIOR.iter())
        .enumerate()
    {
        new_ids[old_id - 1] = new_idx + 1;
    }

    let mut points = vec![Point::default(); 16];
    for (old_idx, p) in GRID_3X3_POINTS.iter().enumerate() {
        points[new_ids[old_idx] - 1] = Point::from(*p);
    }

    Mesh::new(
        points,
        GRID_3X3_ELEMENTS
            .iter()
            .map(|nodes| nodes.map(|old_id| new_ids[old_id - 1]))
            .collect(),
        (1..=12).collect(),
    )
    .unwrap()
}

fn grid_3x3_with(points: Vec<Point>) -> Mesh {
    Mesh::new(
        points,
        GRID_3X3_ELEMENTS.to_vec(),
        GRID_3X3_BOUNDARY.to_vec(),
    )
    .unwrap()
}
