//! Scene: the arena-backed node hierarchy plus id-keyed material and texture
//! stores.

use glam::Mat4;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{Result, SceneError};
use crate::geometry::{BoundingBox, Geometry};
use crate::material::{Material, Texture};
use crate::{MaterialId, NodeId, TextureId};

/// The live scene graph.
///
/// Nodes reference each other and their materials by id; nothing here owns a
/// node through another node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Scene name.
    pub name: String,
    /// Scene nodes (hierarchy).
    pub nodes: Vec<Node>,
    /// Root node indices.
    pub roots: Vec<NodeId>,
    /// Materials by id.
    pub materials: IndexMap<MaterialId, Material>,
    /// Textures by id.
    pub textures: IndexMap<TextureId, Texture>,
    next_material: u64,
    next_texture: u64,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a named empty scene.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse a scene from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut scene: Scene = serde_json::from_str(json)?;
        scene.validate()?;
        scene.resync_counters();
        tracing::debug!(
            nodes = scene.nodes.len(),
            materials = scene.materials.len(),
            textures = scene.textures.len(),
            "parsed scene"
        );
        Ok(scene)
    }

    /// Serialize the scene as JSON.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Check that every node reference points inside the arena.
    pub fn validate(&self) -> Result<()> {
        let count = self.nodes.len();
        for root in &self.roots {
            if root.index() >= count {
                return Err(SceneError::UnknownNode(*root));
            }
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(child) = node.children.iter().find(|c| c.index() >= count) {
                return Err(SceneError::InvalidData(format!(
                    "node {index} references missing child {child}"
                )));
            }
        }
        Ok(())
    }

    // Deserialized scenes may carry ids above the stored counters.
    fn resync_counters(&mut self) {
        let max_material = self.materials.keys().map(|id| id.0 + 1).max().unwrap_or(0);
        let max_texture = self.textures.keys().map(|id| id.0 + 1).max().unwrap_or(0);
        self.next_material = self.next_material.max(max_material);
        self.next_texture = self.next_texture.max(max_texture);
    }

    /// Get the total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add a root node and return its id.
    pub fn add_root(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.roots.push(id);
        id
    }

    /// Add a child node to a parent and return its id.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId> {
        if parent.index() >= self.nodes.len() {
            return Err(SceneError::UnknownNode(parent));
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Add a material and return its id.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.next_material);
        self.next_material += 1;
        self.materials.insert(id, material);
        id
    }

    /// Add a texture and return its id.
    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(id, texture);
        id
    }

    /// Iterate over all nodes with their world transforms, depth-first in
    /// root order.
    pub fn traverse(&self) -> impl Iterator<Item = (NodeId, &Node, Mat4)> {
        SceneTraverser::new(self)
    }

    /// Iterate over nodes that carry geometry.
    pub fn meshes(&self) -> impl Iterator<Item = (NodeId, &Node, Mat4)> {
        self.traverse().filter(|(_, node, _)| node.is_mesh())
    }

    /// World transform of one node.
    pub fn world_transform(&self, id: NodeId) -> Option<Mat4> {
        self.traverse()
            .find(|(node_id, _, _)| *node_id == id)
            .map(|(_, _, world)| world)
    }

    /// World-space bounding box of all meshes; zero box when there are none.
    pub fn compute_bounds(&self) -> BoundingBox {
        let mut bounds: Option<BoundingBox> = None;
        for (_, node, world) in self.meshes() {
            let Some(geometry) = &node.geometry else {
                continue;
            };
            if geometry.positions.is_empty() {
                continue;
            }
            let node_bounds = geometry.compute_bounds().transformed(&world);
            match &mut bounds {
                Some(b) => b.expand(&node_bounds),
                None => bounds = Some(node_bounds),
            }
        }
        bounds.unwrap_or_default()
    }
}

/// A node in the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    /// Node name.
    pub name: String,
    /// Local transform.
    pub transform: Mat4,
    /// Child node ids.
    pub children: Vec<NodeId>,
    /// Mesh geometry, when this node is a mesh.
    pub geometry: Option<Geometry>,
    /// Material slots; geometry groups index into this list.
    pub materials: SmallVec<[MaterialId; 1]>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Mat4::IDENTITY,
            children: Vec::new(),
            geometry: None,
            materials: SmallVec::new(),
        }
    }
}

impl Node {
    /// Create a new named node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a mesh node.
    pub fn mesh(name: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            name: name.into(),
            geometry: Some(geometry),
            ..Default::default()
        }
    }

    /// Set the transform.
    pub fn transformed(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Append a material slot.
    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.materials.push(material);
        self
    }

    pub fn is_mesh(&self) -> bool {
        self.geometry.is_some()
    }
}

/// Iterator for traversing the scene graph.
struct SceneTraverser<'a> {
    scene: &'a Scene,
    stack: Vec<(NodeId, Mat4)>,
    visited: Vec<bool>,
}

impl<'a> SceneTraverser<'a> {
    fn new(scene: &'a Scene) -> Self {
        let stack: Vec<(NodeId, Mat4)> = scene
            .roots
            .iter()
            .rev()
            .map(|&id| (id, Mat4::IDENTITY))
            .collect();
        Self {
            scene,
            stack,
            visited: vec![false; scene.nodes.len()],
        }
    }
}

impl<'a> Iterator for SceneTraverser<'a> {
    type Item = (NodeId, &'a Node, Mat4);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (id, parent_transform) = self.stack.pop()?;
            let Some(node) = self.scene.nodes.get(id.index()) else {
                continue;
            };
            // A node reachable twice would otherwise be visited twice, or forever
            if std::mem::replace(&mut self.visited[id.index()], true) {
                continue;
            }
            let world_transform = parent_transform * node.transform;

            // Push children in reverse order so they're processed left-to-right
            for &child in node.children.iter().rev() {
                self.stack.push((child, world_transform));
            }

            return Some((id, node, world_transform));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_empty_scene() {
        let scene = Scene::new();
        assert_eq!(scene.node_count(), 0);
        assert_eq!(scene.compute_bounds(), BoundingBox::default());
    }

    #[test]
    fn test_scene_traversal() {
        let mut scene = Scene::new();
        let root = scene.add_root(Node::new("root"));
        let child1 = scene.add_child(root, Node::new("child1")).unwrap();
        scene.add_child(root, Node::new("child2")).unwrap();
        scene.add_child(child1, Node::new("grandchild")).unwrap();

        let names: Vec<&str> = scene.traverse().map(|(_, n, _)| n.name.as_str()).collect();
        assert_eq!(names, vec!["root", "child1", "grandchild", "child2"]);
    }

    #[test]
    fn test_world_transform_accumulates() {
        let mut scene = Scene::new();
        let root = scene.add_root(
            Node::new("root").transformed(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0))),
        );
        let child = scene
            .add_child(
                root,
                Node::new("child").transformed(Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0))),
            )
            .unwrap();
        let world = scene.world_transform(child).unwrap();
        assert_eq!(world.transform_point3(Vec3::ZERO), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_cyclic_children_terminate() {
        let mut scene = Scene::new();
        let root = scene.add_root(Node::new("root"));
        let child = scene.add_child(root, Node::new("child")).unwrap();
        scene.nodes[child.index()].children.push(root);
        assert_eq!(scene.traverse().count(), 2);
    }

    #[test]
    fn test_add_child_unknown_parent() {
        let mut scene = Scene::new();
        assert!(matches!(
            scene.add_child(NodeId(3), Node::new("x")),
            Err(SceneError::UnknownNode(NodeId(3)))
        ));
    }

    #[test]
    fn test_world_bounds() {
        let mut scene = Scene::new();
        scene.add_root(
            Node::mesh("cube", Geometry::cuboid(Vec3::ONE))
                .transformed(Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0))),
        );
        let bounds = scene.compute_bounds();
        assert_eq!(bounds.min, Vec3::new(-1.0, 4.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 6.0, 1.0));
    }

    #[test]
    fn test_json_round_trip_keeps_ids_unique() {
        let mut scene = Scene::named("demo");
        let material = scene.add_material(Material::new("m"));
        scene.add_root(Node::mesh("cube", Geometry::cuboid(Vec3::ONE)).with_material(material));

        let json = scene.to_json(false).unwrap();
        let mut parsed = Scene::from_json(&json).unwrap();
        assert_eq!(parsed.nodes, scene.nodes);
        let fresh = parsed.add_material(Material::new("n"));
        assert_ne!(fresh, material);
    }

    #[test]
    fn test_from_json_rejects_dangling_root() {
        let err = Scene::from_json(r#"{"nodes":[],"roots":[4]}"#).unwrap_err();
        assert!(matches!(err, SceneError::UnknownNode(NodeId(4))));
    }
}
