//! In-place material edits: solid colors, gradients, textures, opacity.
//!
//! Every operation is uniform over its target list. A target the scene does
//! not know is skipped and reported; the remaining targets are still edited.
//! After an edit the registry entries are re-read from the scene and maps
//! nothing can restore any more are dropped.

use prism_paint::{generate, Color, GradientSpec, RgbaImage};
use prism_scene::{Material, MaterialId, SceneGraph, Texture};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::registry::{map_shared, MaterialRegistry};

/// Outcome of a batch edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditReport {
    /// Materials that were changed.
    pub applied: Vec<MaterialId>,
    /// Targets that could not be found.
    pub skipped: Vec<MaterialId>,
}

impl EditReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Which registry entries an edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Every discovered material.
    All,
    /// One material.
    Material(MaterialId),
}

impl Target {
    /// Resolve to material ids using the registry.
    pub fn resolve(self, registry: &MaterialRegistry) -> Vec<MaterialId> {
        match self {
            Target::All => registry.ids(),
            Target::Material(id) => vec![id],
        }
    }
}

/// Parameters of a flat-color edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidColor {
    pub color: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    /// Left untouched when `None`.
    pub emissive: Option<Color>,
    /// Left untouched when `None`.
    pub emissive_intensity: Option<f32>,
}

impl SolidColor {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            metalness: 0.0,
            roughness: 1.0,
            opacity: 1.0,
            emissive: None,
            emissive_intensity: None,
        }
    }

    pub fn with_pbr(mut self, metalness: f32, roughness: f32) -> Self {
        self.metalness = metalness;
        self.roughness = roughness;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_emissive(mut self, emissive: Color, intensity: f32) -> Self {
        self.emissive = Some(emissive);
        self.emissive_intensity = Some(intensity);
        self
    }
}

/// Applies edits to live materials and tracks the editor-wide opacity value.
#[derive(Debug)]
pub struct MaterialEditor {
    opacity: f32,
}

impl Default for MaterialEditor {
    fn default() -> Self {
        Self { opacity: 1.0 }
    }
}

impl MaterialEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The opacity last applied through [`MaterialEditor::set_opacity`].
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Replace each target's look with a flat color.
    ///
    /// The existing diffuse map is released and cleared first so it cannot
    /// mask the color.
    pub fn apply_solid_color<G: SceneGraph>(
        &mut self,
        scene: &mut G,
        registry: &mut MaterialRegistry,
        targets: &[MaterialId],
        solid: &SolidColor,
    ) -> EditReport {
        let report = for_each_target(scene, targets, |scene, id| {
            release_map(scene, id);
            let Some(material) = scene.material_mut(id) else {
                return false;
            };
            material.map = None;
            material.color = Some(solid.color);
            material.metalness = solid.metalness.clamp(0.0, 1.0);
            material.roughness = solid.roughness.clamp(0.0, 1.0);
            material.set_opacity(solid.opacity);
            if let Some(emissive) = solid.emissive {
                material.emissive = emissive;
            }
            if let Some(intensity) = solid.emissive_intensity {
                material.emissive_intensity = intensity.max(0.0);
            }
            material.mark_dirty();
            true
        });
        settle(scene, registry);
        info!(
            color = %solid.color,
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "applied solid color"
        );
        report
    }

    /// Rasterize a gradient once and use it as each target's diffuse map.
    ///
    /// Base colors are forced to white. A single target gets the texture
    /// itself; several targets each get their own copy.
    pub fn apply_gradient<G: SceneGraph>(
        &mut self,
        scene: &mut G,
        registry: &mut MaterialRegistry,
        targets: &[MaterialId],
        spec: &GradientSpec,
        size: u32,
    ) -> Result<EditReport> {
        let image = generate(spec, size)?;
        let texture = Texture::from_image(format!("{:?} gradient", spec.kind), image);
        let report = assign_map(scene, targets, texture);
        settle(scene, registry);
        info!(
            kind = ?spec.kind,
            size,
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "applied gradient"
        );
        Ok(report)
    }

    /// Use a caller-supplied image as each target's diffuse map, with
    /// repeat wrapping.
    pub fn apply_texture<G: SceneGraph>(
        &mut self,
        scene: &mut G,
        registry: &mut MaterialRegistry,
        targets: &[MaterialId],
        name: &str,
        image: RgbaImage,
    ) -> EditReport {
        let texture = Texture::from_image(name, image).with_repeat_wrap();
        let report = assign_map(scene, targets, texture);
        settle(scene, registry);
        info!(
            texture = name,
            applied = report.applied.len(),
            "applied texture"
        );
        report
    }

    /// Set opacity on every target; `transparent` follows `value < 1`.
    pub fn set_opacity<G: SceneGraph>(
        &mut self,
        scene: &mut G,
        registry: &mut MaterialRegistry,
        targets: &[MaterialId],
        value: f32,
    ) -> EditReport {
        let value = if value.is_nan() { 1.0 } else { value.clamp(0.0, 1.0) };
        self.opacity = value;
        let report = for_each_target(scene, targets, |scene, id| {
            let Some(material) = scene.material_mut(id) else {
                return false;
            };
            material.set_opacity(value);
            material.mark_dirty();
            true
        });
        registry.sync(scene);
        report
    }

    /// Restore every registry entry and reset the editor opacity to 1.
    pub fn restore_originals<G: SceneGraph>(
        &mut self,
        scene: &mut G,
        registry: &mut MaterialRegistry,
    ) -> Result<EditReport> {
        let report = registry.restore_all_originals(scene)?;
        self.opacity = 1.0;
        info!(restored = report.applied.len(), "restored original materials");
        Ok(report)
    }
}

fn settle<G: SceneGraph>(scene: &mut G, registry: &mut MaterialRegistry) {
    registry.purge_released_textures(scene);
    registry.sync(scene);
}

fn for_each_target<G, F>(scene: &mut G, targets: &[MaterialId], mut edit: F) -> EditReport
where
    G: SceneGraph,
    F: FnMut(&mut G, MaterialId) -> bool,
{
    let mut report = EditReport::default();
    for &id in targets {
        if report.applied.contains(&id) {
            continue;
        }
        if scene.material(id).is_some() && edit(scene, id) {
            report.applied.push(id);
        } else {
            warn!(material = %id, "edit target not found");
            report.skipped.push(id);
        }
    }
    report
}

fn assign_map<G: SceneGraph>(
    scene: &mut G,
    targets: &[MaterialId],
    texture: Texture,
) -> EditReport {
    let single = targets.len() == 1 && scene.material(targets[0]).is_some();
    let shared = single.then(|| scene.insert_texture(texture.clone()));

    for_each_target(scene, targets, |scene, id| {
        release_map(scene, id);
        let map = match shared {
            Some(map) => map,
            None => scene.insert_texture(texture.clone()),
        };
        let Some(material) = scene.material_mut(id) else {
            return false;
        };
        material.map = Some(map);
        material.color = Some(Color::WHITE);
        material.mark_dirty();
        true
    })
}

/// Release the target's current map unless another material still uses it.
fn release_map<G: SceneGraph>(scene: &mut G, id: MaterialId) {
    let Some(map) = scene.material(id).and_then(|m: &Material| m.map) else {
        return;
    };
    if map_shared(scene, id, map) {
        debug!(material = %id, texture = %map, "map still in use, not releasing");
        return;
    }
    if let Err(err) = scene.dispose_texture(map) {
        warn!(material = %id, error = %err, "failed to release map");
    }
}
