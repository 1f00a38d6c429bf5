//! Detached scene copies for export.
//!
//! Export never touches the live scene: writers always receive the output
//! of [`bake`], which owns its nodes, materials and textures.

use glam::Mat4;
use prism_scene::Scene;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How node transforms are carried into the exported copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BakeMode {
    /// Fold world transforms into vertex data; every node ends up with an
    /// identity transform.
    #[default]
    Baked,
    /// Keep the hierarchy's local transforms; vertex data is untouched.
    Preserved,
}

/// Deep-clone `scene` for export.
pub fn bake(scene: &Scene, mode: BakeMode) -> Scene {
    let mut detached = scene.clone();
    if mode == BakeMode::Preserved {
        return detached;
    }

    let worlds: Vec<_> = scene
        .traverse()
        .filter(|(_, node, _)| node.geometry.is_some())
        .map(|(id, _, world)| (id, world))
        .collect();
    for (id, world) in &worlds {
        if let Some(geometry) = detached
            .node_mut(*id)
            .and_then(|node| node.geometry.as_mut())
        {
            *geometry = geometry.transformed(world);
        }
    }
    for node in &mut detached.nodes {
        node.transform = Mat4::IDENTITY;
    }

    debug!(meshes = worlds.len(), "baked world transforms");
    detached
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};
    use prism_paint::{Color, RgbaImage};
    use prism_scene::{Geometry, Material, Node, Texture};

    fn nested_scene() -> Scene {
        let mut scene = Scene::new();
        let texture = scene.add_texture(Texture::from_image("t", RgbaImage::new(2, 2)));
        let mut material = Material::colored("m", Color::rgb(0, 255, 0));
        material.map = Some(texture);
        let material = scene.add_material(material);

        let parent = scene.add_root(
            Node::new("parent").transformed(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0))),
        );
        let geometry = Geometry::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y])
            .with_normals(vec![Vec3::Z; 3]);
        scene
            .add_child(
                parent,
                Node::mesh("tri", geometry)
                    .with_material(material)
                    .transformed(Mat4::from_rotation_translation(
                        Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
                        Vec3::new(0.0, 0.0, 1.0),
                    )),
            )
            .unwrap();
        scene
    }

    #[test]
    fn test_baked_positions_and_identity_transforms() {
        let scene = nested_scene();
        let baked = bake(&scene, BakeMode::Baked);

        assert!(baked.nodes.iter().all(|n| n.transform == Mat4::IDENTITY));
        for (_, _, world) in baked.traverse() {
            assert_eq!(world, Mat4::IDENTITY);
        }

        let geometry = baked.nodes[1].geometry.as_ref().unwrap();
        assert!(geometry.positions[0].abs_diff_eq(Vec3::new(10.0, 0.0, 1.0), 1e-5));
        assert!(geometry.positions[2].abs_diff_eq(Vec3::new(10.0, 0.0, 2.0), 1e-5));
        assert!(geometry.normals.as_ref().unwrap()[0].abs_diff_eq(Vec3::NEG_Y, 1e-5));
    }

    #[test]
    fn test_baked_bounds_match_live_bounds() {
        let scene = nested_scene();
        let baked = bake(&scene, BakeMode::Baked);
        let live = scene.compute_bounds();
        let exported = baked.compute_bounds();
        assert!(live.min.abs_diff_eq(exported.min, 1e-5));
        assert!(live.max.abs_diff_eq(exported.max, 1e-5));
    }

    #[test]
    fn test_preserved_keeps_transforms() {
        let scene = nested_scene();
        let preserved = bake(&scene, BakeMode::Preserved);
        assert_eq!(preserved, scene);
    }

    #[test]
    fn test_export_copy_is_detached() {
        let mut scene = nested_scene();
        let baked = bake(&scene, BakeMode::Baked);
        let (material_id, _) = scene.materials.first().map(|(k, v)| (*k, v.clone())).unwrap();

        scene.materials[&material_id].color = Some(Color::BLACK);
        scene.textures[0].dispose();

        assert_eq!(baked.materials[&material_id].color, Some(Color::rgb(0, 255, 0)));
        assert!(!baked.textures[0].disposed);
    }
}
