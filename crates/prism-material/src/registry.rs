//! Material discovery, PBR upgrade and snapshot restore.
//!
//! A scan walks every mesh node of a [`SceneGraph`], deduplicates materials
//! by id and captures an [`OriginalSnapshot`] per material. Legacy (non-PBR)
//! materials are swapped for an equivalent `Standard` material on the way.

use indexmap::{IndexMap, IndexSet};
use prism_paint::Color;
use prism_scene::{Material, MaterialId, MaterialKind, NodeId, SceneError, SceneGraph, TextureId};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::edit::EditReport;
use crate::error::{MaterialError, Result};

/// Display color for materials without a color field.
pub const FALLBACK_COLOR: Color = Color::rgb(0x88, 0x88, 0x88);

/// Material state captured at discovery. Restore copies from it, nothing
/// writes into it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalSnapshot {
    pub color: Option<Color>,
    pub map: Option<TextureId>,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub emissive: Color,
    pub emissive_intensity: f32,
}

impl OriginalSnapshot {
    fn capture(material: &Material) -> Self {
        Self {
            color: material.color,
            map: material.map,
            metalness: material.metalness,
            roughness: material.roughness,
            opacity: material.opacity,
            emissive: material.emissive,
            emissive_intensity: material.emissive_intensity,
        }
    }

    fn apply_to(&self, material: &mut Material) {
        material.color = self.color;
        material.map = self.map;
        material.metalness = self.metalness;
        material.roughness = self.roughness;
        material.set_opacity(self.opacity);
        material.emissive = self.emissive;
        material.emissive_intensity = self.emissive_intensity;
    }
}

/// One distinct material found by a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialEntry {
    pub id: MaterialId,
    pub name: String,
    /// Name of the first mesh the material was found on.
    pub owner_mesh_name: String,
    /// First mesh the material was found on. The scene owns the node.
    pub owner_mesh: NodeId,
    /// Every mesh using the material, in traversal order.
    pub meshes: Vec<NodeId>,
    pub snapshot: OriginalSnapshot,
    /// Display color; [`FALLBACK_COLOR`] when the material has none.
    pub color: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub emissive: Color,
    pub emissive_intensity: f32,
    pub has_vertex_colors: bool,
    pub mesh_count: usize,
}

impl MaterialEntry {
    fn refresh(&mut self, material: &Material) {
        self.color = material.color.unwrap_or(FALLBACK_COLOR);
        self.metalness = material.metalness;
        self.roughness = material.roughness;
        self.opacity = material.opacity;
        self.emissive = material.emissive;
        self.emissive_intensity = material.emissive_intensity;
    }
}

/// Registry of materials discovered on the current model.
#[derive(Debug, Default)]
pub struct MaterialRegistry {
    entries: IndexMap<MaterialId, MaterialEntry>,
    scanned: bool,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover every material on the scene's meshes.
    ///
    /// Previous entries and snapshots are discarded. Legacy materials are
    /// replaced on every slot that references them; materials referenced by
    /// a node but missing from the scene are skipped.
    pub fn scan<G: SceneGraph>(&mut self, scene: &mut G) -> Vec<&MaterialEntry> {
        self.entries.clear();
        self.scanned = true;

        let mut upgraded: IndexMap<MaterialId, MaterialId> = IndexMap::new();
        for node in scene.mesh_nodes() {
            let Some(slots) = scene.node_materials(node).map(<[MaterialId]>::to_vec) else {
                continue;
            };
            let node_has_colors = scene.node_has_vertex_colors(node);

            for (slot, original) in slots.into_iter().enumerate() {
                let id = match resolve_slot(scene, node, slot, original, &mut upgraded) {
                    Ok(Some(id)) => id,
                    Ok(None) => continue,
                    Err(err) => {
                        warn!(%node, slot, error = %err, "skipping material slot");
                        continue;
                    }
                };

                if let Some(entry) = self.entries.get_mut(&id) {
                    entry.meshes.push(node);
                    entry.mesh_count += 1;
                    entry.has_vertex_colors |= node_has_colors;
                    continue;
                }

                let Some(material) = scene.material(id) else {
                    continue;
                };
                let owner_mesh_name = scene.node_name(node).unwrap_or_default().to_string();
                let mut entry = MaterialEntry {
                    id,
                    name: material.name.clone(),
                    owner_mesh_name,
                    owner_mesh: node,
                    meshes: vec![node],
                    snapshot: OriginalSnapshot::capture(material),
                    color: FALLBACK_COLOR,
                    metalness: 0.0,
                    roughness: 1.0,
                    opacity: 1.0,
                    emissive: Color::BLACK,
                    emissive_intensity: 1.0,
                    has_vertex_colors: material.vertex_colors || node_has_colors,
                    mesh_count: 1,
                };
                entry.refresh(material);
                self.entries.insert(id, entry);
            }
        }

        self.purge_released_textures(scene);
        info!(
            materials = self.entries.len(),
            upgraded = upgraded.len(),
            "scanned scene materials"
        );
        self.entries.values().collect()
    }

    /// Entries in discovery order.
    pub fn entries(&self) -> impl Iterator<Item = &MaterialEntry> {
        self.entries.values()
    }

    pub fn get(&self, id: MaterialId) -> Option<&MaterialEntry> {
        self.entries.get(&id)
    }

    /// Ids of all entries in discovery order.
    pub fn ids(&self) -> Vec<MaterialId> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-read the current values of every entry from the scene.
    pub fn sync<G: SceneGraph>(&mut self, scene: &G) {
        for entry in self.entries.values_mut() {
            if let Some(material) = scene.material(entry.id) {
                entry.refresh(material);
            }
        }
    }

    /// Copy the snapshot back onto the live material and mark it dirty.
    ///
    /// A snapshot texture that was released since discovery is revived. The
    /// map being replaced is released unless another material still uses it.
    pub fn restore_original<G: SceneGraph>(&mut self, scene: &mut G, id: MaterialId) -> Result<()> {
        if !self.scanned {
            return Err(MaterialError::NotScanned);
        }
        self.restore_entry(scene, id)?;
        self.purge_released_textures(scene);
        Ok(())
    }

    fn restore_entry<G: SceneGraph>(&mut self, scene: &mut G, id: MaterialId) -> Result<()> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(MaterialError::UnknownMaterial(id))?;

        if let Some(texture_id) = entry.snapshot.map {
            let texture = scene
                .texture_mut(texture_id)
                .ok_or(SceneError::UnknownTexture(texture_id))?;
            texture.revive();
        }

        let material = scene
            .material_mut(id)
            .ok_or(SceneError::UnknownMaterial(id))?;
        let replaced = material.map.filter(|&map| Some(map) != entry.snapshot.map);
        entry.snapshot.apply_to(material);
        material.mark_dirty();
        entry.refresh(material);

        if let Some(map) = replaced {
            if !map_shared(scene, id, map) {
                if let Err(err) = scene.dispose_texture(map) {
                    warn!(material = %id, texture = %map, error = %err, "failed to release map");
                }
            }
        }
        debug!(material = %id, "restored original material");
        Ok(())
    }

    /// Drop textures that are released, used by no material and held by no
    /// snapshot. Returns how many were dropped.
    pub fn purge_released_textures<G: SceneGraph>(&self, scene: &mut G) -> usize {
        let mut held: IndexSet<TextureId> = self
            .entries
            .values()
            .filter_map(|entry| entry.snapshot.map)
            .collect();
        held.extend(
            scene
                .material_ids()
                .into_iter()
                .filter_map(|id| scene.material(id).and_then(|m| m.map)),
        );

        let mut dropped = 0;
        for id in scene.texture_ids() {
            let released = scene.texture(id).is_some_and(|t| t.disposed);
            if released && !held.contains(&id) && scene.remove_texture(id).is_ok() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!(dropped, "purged released textures");
        }
        dropped
    }

    /// Restore every entry, continuing past failures.
    pub fn restore_all_originals<G: SceneGraph>(&mut self, scene: &mut G) -> Result<EditReport> {
        if !self.scanned {
            return Err(MaterialError::NotScanned);
        }
        let mut report = EditReport::default();
        for id in self.ids() {
            match self.restore_entry(scene, id) {
                Ok(()) => report.applied.push(id),
                Err(err) => {
                    warn!(material = %id, error = %err, "restore failed");
                    report.skipped.push(id);
                }
            }
        }
        self.purge_released_textures(scene);
        Ok(report)
    }
}

/// Whether a material other than `owner` uses `map`.
pub(crate) fn map_shared<G: SceneGraph>(scene: &G, owner: MaterialId, map: TextureId) -> bool {
    scene
        .material_ids()
        .into_iter()
        .filter(|&other| other != owner)
        .any(|other| scene.material(other).is_some_and(|m| m.map == Some(map)))
}

// Returns the id the slot refers to after any upgrade.
fn resolve_slot<G: SceneGraph>(
    scene: &mut G,
    node: NodeId,
    slot: usize,
    original: MaterialId,
    upgraded: &mut IndexMap<MaterialId, MaterialId>,
) -> Result<Option<MaterialId>> {
    if let Some(&replacement) = upgraded.get(&original) {
        scene.replace_material(node, slot, replacement)?;
        if scene.node_has_vertex_colors(node) {
            if let Some(material) = scene.material_mut(replacement) {
                material.vertex_colors = true;
            }
        }
        return Ok(Some(replacement));
    }

    let Some(material) = scene.material(original) else {
        warn!(%node, material = %original, "node references unknown material");
        return Ok(None);
    };
    if material.kind.is_pbr() {
        return Ok(Some(original));
    }

    let replacement = upgrade(material, scene.node_has_vertex_colors(node));
    debug!(
        material = %original,
        kind = ?material.kind,
        "upgrading legacy material"
    );
    let replacement = scene.insert_material(replacement);
    scene.replace_material(node, slot, replacement)?;
    scene.dispose_material(original)?;
    upgraded.insert(original, replacement);
    Ok(Some(replacement))
}

/// Build the `Standard` replacement for a legacy material.
fn upgrade(legacy: &Material, geometry_has_colors: bool) -> Material {
    Material {
        name: legacy.name.clone(),
        kind: MaterialKind::Standard,
        color: legacy.color,
        map: legacy.map,
        metalness: 0.0,
        roughness: 1.0,
        opacity: legacy.opacity,
        transparent: legacy.transparent || legacy.opacity < 1.0,
        emissive: legacy.emissive,
        emissive_intensity: legacy.emissive_intensity,
        vertex_colors: legacy.vertex_colors || geometry_has_colors,
        double_sided: true,
        version: 0,
    }
}
