//! The capability interface material bookkeeping runs against.
//!
//! Registry and editing code only ever talks to a [`SceneGraph`]; [`Scene`]
//! is the in-process implementation, a renderer binding would be another.

use crate::error::{Result, SceneError};
use crate::graph::Scene;
use crate::material::{Material, Texture};
use crate::{MaterialId, NodeId, TextureId};

/// Scene graph capabilities used by the material registry and editor.
pub trait SceneGraph {
    /// Mesh-bearing nodes, depth-first in root order.
    fn mesh_nodes(&self) -> Vec<NodeId>;

    /// Node display name.
    fn node_name(&self, node: NodeId) -> Option<&str>;

    /// Material slots attached to a node.
    fn node_materials(&self, node: NodeId) -> Option<&[MaterialId]>;

    /// Whether the node's geometry has a vertex color attribute.
    fn node_has_vertex_colors(&self, node: NodeId) -> bool;

    /// Every live material id.
    fn material_ids(&self) -> Vec<MaterialId>;

    fn material(&self, id: MaterialId) -> Option<&Material>;

    fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material>;

    /// Store a new material and return its id.
    fn insert_material(&mut self, material: Material) -> MaterialId;

    /// Point a node's material slot at another material.
    fn replace_material(&mut self, node: NodeId, slot: usize, material: MaterialId) -> Result<()>;

    /// Release a material. Its id becomes unknown.
    fn dispose_material(&mut self, id: MaterialId) -> Result<Material>;

    fn texture(&self, id: TextureId) -> Option<&Texture>;

    fn texture_mut(&mut self, id: TextureId) -> Option<&mut Texture>;

    /// Every stored texture id, released ones included.
    fn texture_ids(&self) -> Vec<TextureId>;

    /// Store a new texture and return its id.
    fn insert_texture(&mut self, texture: Texture) -> TextureId;

    /// Release a texture's resources. The data stays addressable so it can be
    /// revived.
    fn dispose_texture(&mut self, id: TextureId) -> Result<()>;

    /// Drop a texture and its data. Its id becomes unknown.
    fn remove_texture(&mut self, id: TextureId) -> Result<Texture>;

    /// Signal that a material needs re-upload.
    fn mark_dirty(&mut self, id: MaterialId) -> Result<()> {
        let material = self
            .material_mut(id)
            .ok_or(SceneError::UnknownMaterial(id))?;
        material.mark_dirty();
        Ok(())
    }
}

impl SceneGraph for Scene {
    fn mesh_nodes(&self) -> Vec<NodeId> {
        self.meshes().map(|(id, _, _)| id).collect()
    }

    fn node_name(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.name.as_str())
    }

    fn node_materials(&self, node: NodeId) -> Option<&[MaterialId]> {
        self.node(node).map(|n| n.materials.as_slice())
    }

    fn node_has_vertex_colors(&self, node: NodeId) -> bool {
        self.node(node)
            .and_then(|n| n.geometry.as_ref())
            .is_some_and(|g| g.has_vertex_colors())
    }

    fn material_ids(&self) -> Vec<MaterialId> {
        self.materials.keys().copied().collect()
    }

    fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(&id)
    }

    fn insert_material(&mut self, material: Material) -> MaterialId {
        self.add_material(material)
    }

    fn replace_material(&mut self, node: NodeId, slot: usize, material: MaterialId) -> Result<()> {
        if !self.materials.contains_key(&material) {
            return Err(SceneError::UnknownMaterial(material));
        }
        let target = self.node_mut(node).ok_or(SceneError::UnknownNode(node))?;
        let entry = target
            .materials
            .get_mut(slot)
            .ok_or(SceneError::NoMaterialSlot { node, slot })?;
        *entry = material;
        Ok(())
    }

    fn dispose_material(&mut self, id: MaterialId) -> Result<Material> {
        self.materials
            .shift_remove(&id)
            .ok_or(SceneError::UnknownMaterial(id))
    }

    fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(&id)
    }

    fn texture_mut(&mut self, id: TextureId) -> Option<&mut Texture> {
        self.textures.get_mut(&id)
    }

    fn texture_ids(&self) -> Vec<TextureId> {
        self.textures.keys().copied().collect()
    }

    fn insert_texture(&mut self, texture: Texture) -> TextureId {
        self.add_texture(texture)
    }

    fn dispose_texture(&mut self, id: TextureId) -> Result<()> {
        let texture = self.textures.get_mut(&id).ok_or(SceneError::UnknownTexture(id))?;
        texture.dispose();
        Ok(())
    }

    fn remove_texture(&mut self, id: TextureId) -> Result<Texture> {
        self.textures
            .shift_remove(&id)
            .ok_or(SceneError::UnknownTexture(id))
    }
}
