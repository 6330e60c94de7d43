/// The geometric structure of a Domain: Nodes, Elements and the boundary loop
pub mod mesh;
/// Element-to-Element and Node-to-Node connectivity
pub mod topology;

#[cfg(test)]
pub(crate) mod fixtures;

use mesh::{element::Element, node::Node, Mesh};
use topology::Topology;

#[cfg(feature = "json_export")]
use json::object;
#[cfg(feature = "json_export")]
use std::fs::File;
#[cfg(feature = "json_export")]
use std::io::BufWriter;

/// A Mesh together with its (immutable) Topology.
///
/// The Topology is derived once, on construction. Smoothing only ever changes the coordinates of the Mesh's interior Nodes.
#[derive(Debug, Clone)]
pub struct Domain {
    pub mesh: Mesh,
    pub topology: Topology,
}

impl Domain {
    pub fn from_mesh(mesh: Mesh) -> Self {
        let topology = Topology::build(&mesh.elements, &mesh.boundary_loop, mesh.num_nodes());
        Self { mesh, topology }
    }

    /// Iterate over all `Element`s in the mesh
    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.mesh.elements.iter()
    }

    /// Iterate over all `Node`s in the mesh
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.mesh.nodes.iter()
    }

    /// Print the Mesh and its Topology to a JSON file specified by path
    #[cfg(feature = "json_export")]
    pub fn export_to_json(&self, path: impl AsRef<str>) -> std::io::Result<()> {
        let f = File::create(path.as_ref())?;
        let mut w = BufWriter::new(&f);

        let mut domain_object = self.mesh.to_json();
        domain_object["NodeObjects"] = json::JsonValue::from(
            self.nodes().map(|node| node.to_json()).collect::<Vec<_>>(),
        );
        domain_object["ElementObjects"] = json::JsonValue::from(
            self.elements()
                .map(|element| element.to_json())
                .collect::<Vec<_>>(),
        );
        domain_object["Topology"] = object! {
            "ElementAdjacency": self.topology.elements.to_json(),
            "NodeAdjacency": self.topology.nodes.to_json(),
        };

        domain_object.write_pretty(&mut w, 4)
    }
}

#[cfg(all(test, feature = "json_export"))]
mod tests {
    use super::*;
    use fixtures::grid_3x3;
    use std::fs::{create_dir_all, read_to_string};

    #[test]
    fn domain_to_file() {
        let domain = Domain::from_mesh(grid_3x3());
        create_dir_all("./test_output").unwrap();
        domain
            .export_to_json("./test_output/domain_3x3.json")
            .unwrap();

        let contents = read_to_string("./test_output/domain_3x3.json").unwrap();
        let parsed = json::parse(&contents).unwrap();
        assert_eq!(parsed["Topology"]["ElementAdjacency"][0][1].as_usize(), Some(2));
        assert_eq!(parsed["Topology"]["ElementAdjacency"][0][0].as_usize(), Some(0));
        assert_eq!(parsed["Topology"]["NodeAdjacency"][0].len(), 2);

        // the exported file is itself a valid mesh file
        let mesh = Mesh::from_file("./test_output/domain_3x3.json").unwrap();
        assert_eq!(mesh.elements, domain.mesh.elements);
    }
}
