//! Model statistics.

use indexmap::IndexSet;
use prism_scene::Scene;
use serde::{Deserialize, Serialize};

/// Summary counts and world-space extent of a scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStats {
    pub vertices: usize,
    /// Drawable triangles: complete triples whose indices are in range,
    /// counted the same way the STL and OBJ writers walk them.
    pub triangles: usize,
    pub mesh_count: usize,
    /// Distinct live textures referenced by mesh materials.
    pub texture_count: usize,
    pub bounding_box: StatsBounds,
}

/// World-space axis-aligned bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsBounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub size: [f32; 3],
}

/// Compute statistics over every mesh node of `scene`.
pub fn compute_stats(scene: &Scene) -> ModelStats {
    let mut vertices = 0;
    let mut triangles = 0;
    let mut mesh_count = 0;
    let mut textures = IndexSet::new();

    for (_, node, _) in scene.meshes() {
        let Some(geometry) = &node.geometry else {
            continue;
        };
        mesh_count += 1;
        vertices += geometry.vertex_count();
        triangles += geometry.triangles().count();

        for material_id in &node.materials {
            let Some(map) = scene.materials.get(material_id).and_then(|m| m.map) else {
                continue;
            };
            if scene.textures.get(&map).is_some_and(|t| !t.disposed) {
                textures.insert(map);
            }
        }
    }

    let bounds = scene.compute_bounds();
    ModelStats {
        vertices,
        triangles,
        mesh_count,
        texture_count: textures.len(),
        bounding_box: StatsBounds {
            min: bounds.min.to_array(),
            max: bounds.max.to_array(),
            size: bounds.size().to_array(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use prism_paint::RgbaImage;
    use prism_scene::{Geometry, Material, Node, Texture};

    #[test]
    fn test_empty_scene() {
        let stats = compute_stats(&Scene::new());
        assert_eq!(stats, ModelStats::default());
    }

    #[test]
    fn test_cube_stats() {
        let mut scene = Scene::new();
        scene.add_root(
            Node::mesh("cube", Geometry::cuboid(Vec3::splat(0.5)))
                .transformed(Mat4::from_translation(Vec3::new(0.0, 0.5, 0.0))),
        );
        let stats = compute_stats(&scene);
        assert_eq!(stats.vertices, 8);
        assert_eq!(stats.triangles, 12);
        assert_eq!(stats.mesh_count, 1);
        assert_eq!(stats.bounding_box.min, [-0.5, 0.0, -0.5]);
        assert_eq!(stats.bounding_box.size, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_triangles_floor_per_mesh() {
        // Three unindexed meshes of 4 vertices: one complete triangle each
        let mut scene = Scene::new();
        for i in 0..3 {
            scene.add_root(Node::mesh(
                format!("strip{i}"),
                Geometry::from_positions(vec![Vec3::ZERO; 4]),
            ));
        }
        assert_eq!(compute_stats(&scene).triangles, 3);
    }

    #[test]
    fn test_triangles_skip_out_of_range_indices() {
        let mut scene = Scene::new();
        let geometry = Geometry::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y])
            .with_indices(vec![0, 1, 2, 0, 1, 9]);
        scene.add_root(Node::mesh("tri", geometry));
        assert_eq!(compute_stats(&scene).triangles, 1);
    }

    #[test]
    fn test_texture_count_distinct_and_live() {
        let mut scene = Scene::new();
        let shared = scene.add_texture(Texture::from_image("a", RgbaImage::new(1, 1)));
        let released = scene.add_texture(Texture::from_image("b", RgbaImage::new(1, 1)));
        scene.textures[&released].dispose();

        let mut ids = Vec::new();
        for map in [shared, shared, released] {
            let mut material = Material::new("m");
            material.map = Some(map);
            ids.push(scene.add_material(material));
        }
        for id in ids {
            scene.add_root(Node::mesh("cube", Geometry::cuboid(Vec3::ONE)).with_material(id));
        }

        assert_eq!(compute_stats(&scene).texture_count, 1);
    }
}
