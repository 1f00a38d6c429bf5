//! Whole-pipeline scenarios: scan, edit, export, restore.

use glam::{Mat4, Quat, Vec3};
use prism_export::{
    bake, compute_stats, export, BakeMode, ExportFormat, ExportOptions, WriteOptions,
};
use prism_material::{MaterialEditor, MaterialRegistry, Target};
use prism_paint::{interpolate, Color, ColorStop, GradientKind, GradientSpec};
use prism_scene::{Geometry, Material, MaterialKind, Node, Scene, SceneGraph, TextureImage};
use proptest::prelude::*;

fn red_cube() -> Scene {
    let mut scene = Scene::named("cube");
    let legacy = scene.add_material(Material::legacy(
        "paint",
        MaterialKind::Lambert,
        Some(Color::rgb(255, 0, 0)),
    ));
    scene.add_root(Node::mesh("cube", Geometry::cuboid(Vec3::splat(0.5))).with_material(legacy));
    scene
}

fn stl_triangle_count(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]])
}

#[test]
fn test_cube_gradient_export_restore() {
    let mut scene = red_cube();
    let mut registry = MaterialRegistry::new();
    let mut editor = MaterialEditor::new();

    let entries = registry.scan(&mut scene);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].mesh_count, 1);
    let targets = Target::All.resolve(&registry);
    let id = targets[0];
    assert_eq!(scene.material(id).unwrap().kind, MaterialKind::Standard);
    assert_eq!(scene.material(id).unwrap().map, None);
    let before = export(&scene, &ExportOptions::new(ExportFormat::Stl)).unwrap();

    let black = Color::from_hex("#000000").unwrap();
    let white = Color::from_hex("#ffffff").unwrap();
    let spec = GradientSpec::with_stops(
        GradientKind::Linear,
        vec![ColorStop::new(black, 0.0), ColorStop::new(white, 1.0)],
    )
    .with_angle(0.0);
    // Odd size puts a pixel center on the horizontal midpoint
    let report = editor
        .apply_gradient(&mut scene, &mut registry, &targets, &spec, 65)
        .unwrap();
    assert!(report.is_complete());

    let material = scene.material(id).unwrap();
    assert_eq!(material.color, Some(Color::WHITE));
    let map = material.map.expect("gradient map assigned");
    let TextureImage::Raster(image) = &scene.texture(map).unwrap().image else {
        panic!("gradient texture is not a raster");
    };
    assert_eq!((image.width, image.height), (65, 65));
    let midpoint = image.color_at(32, 32);
    let expected = interpolate(black, white, 0.5);
    for (got, want) in [(midpoint.r, expected.r), (midpoint.g, expected.g), (midpoint.b, expected.b)] {
        assert!(got.abs_diff(want) <= 1, "midpoint {midpoint} vs {expected}");
    }

    // A second gradient replaces the first map rather than stacking
    editor
        .apply_gradient(&mut scene, &mut registry, &targets, &spec.clone().reversed(true), 65)
        .unwrap();
    let replaced = scene.material(id).unwrap().map.unwrap();
    assert_ne!(replaced, map);
    assert!(scene.texture(map).is_none());
    assert_eq!(scene.textures.len(), 1);

    let stl = export(&scene, &ExportOptions::new(ExportFormat::Stl).with_bake(BakeMode::Baked)).unwrap();
    assert_eq!(stl.byte_size, 684);
    assert_eq!(stl_triangle_count(&stl.bytes), 12);
    assert_eq!(stl.bytes, before.bytes);

    let glb = export(&scene, &ExportOptions::new(ExportFormat::Glb)).unwrap();
    assert_eq!(&glb.bytes[..4], b"glTF");

    editor.restore_originals(&mut scene, &mut registry).unwrap();
    let material = scene.material(id).unwrap();
    assert_eq!(material.color.map(|c| c.to_hex()), Some("#ff0000".to_string()));
    assert!(material.map.is_none());
    assert!(scene.textures.is_empty());
}

#[test]
fn test_partial_triangles_agree_across_stats_and_writers() {
    // Three unindexed 4-vertex meshes and one mesh with an out-of-range triple
    let mut scene = Scene::new();
    for i in 0..3 {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(0.0, 0.0, i as f32)];
        scene.add_root(Node::mesh(format!("strip{i}"), Geometry::from_positions(positions)));
    }
    scene.add_root(Node::mesh(
        "broken",
        Geometry::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y]).with_indices(vec![0, 1, 2, 0, 1, 9]),
    ));

    let stats = compute_stats(&scene);
    assert_eq!(stats.triangles, 4);

    let stl = export(&scene, &ExportOptions::new(ExportFormat::Stl)).unwrap();
    assert_eq!(stl_triangle_count(&stl.bytes) as usize, stats.triangles);

    let obj = export(&scene, &ExportOptions::new(ExportFormat::Obj)).unwrap();
    let faces = String::from_utf8(obj.bytes).unwrap().lines().filter(|l| l.starts_with("f ")).count();
    assert_eq!(faces, stats.triangles);
}

#[test]
fn test_export_leaves_live_scene_untouched() {
    let mut scene = red_cube();
    let root = scene.roots[0];
    scene.node_mut(root).unwrap().transform = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
    let before = scene.clone();

    for format in ExportFormat::ALL {
        for bake_mode in [BakeMode::Baked, BakeMode::Preserved] {
            let options = ExportOptions::new(format).with_bake(bake_mode);
            export(&scene, &options).unwrap();
        }
    }
    assert_eq!(scene, before);
}

#[test]
fn test_baked_and_preserved_agree_in_world_space() {
    let mut scene = red_cube();
    let root = scene.roots[0];
    scene.node_mut(root).unwrap().transform = Mat4::from_rotation_translation(
        Quat::from_rotation_y(0.7),
        Vec3::new(3.0, 0.0, -1.0),
    );

    let baked = export(
        &scene,
        &ExportOptions::new(ExportFormat::Obj).with_bake(BakeMode::Baked),
    )
    .unwrap();
    let preserved = export(
        &scene,
        &ExportOptions::new(ExportFormat::Obj).with_bake(BakeMode::Preserved),
    )
    .unwrap();
    assert_eq!(baked.bytes, preserved.bytes);
}

#[test]
fn test_ascii_stl_through_options() {
    let options = ExportOptions::new(ExportFormat::Stl).with_write_options(WriteOptions::new().ascii());
    let output = export(&red_cube(), &options).unwrap();
    let text = String::from_utf8(output.bytes).unwrap();
    assert!(text.starts_with("solid cube\n"));
}

fn arb_mesh() -> impl Strategy<Value = (Geometry, Mat4)> {
    // Index buffers may end mid-triangle and may point past the vertex buffer
    (3usize..24, -5.0f32..5.0, 0.1f32..3.0).prop_flat_map(
        |(vertex_count, shift, scale)| {
            let positions = prop::collection::vec(
                (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0).prop_map(|(x, y, z)| Vec3::new(x, y, z)),
                vertex_count,
            );
            let extra = prop::collection::vec(0..vertex_count as u32 + 3, 0..36);
            (positions, extra).prop_map(move |(positions, extra)| {
                let mut indices = vec![0, 1, 2];
                indices.extend(extra);
                let transform = Mat4::from_scale_rotation_translation(
                    Vec3::splat(scale),
                    Quat::IDENTITY,
                    Vec3::splat(shift),
                );
                (Geometry::from_positions(positions).with_indices(indices), transform)
            })
        },
    )
}

proptest! {
    #[test]
    fn stl_triangle_count_matches_stats(meshes in prop::collection::vec(arb_mesh(), 1..5)) {
        let mut scene = Scene::new();
        for (i, (geometry, transform)) in meshes.into_iter().enumerate() {
            scene.add_root(Node::mesh(format!("mesh{i}"), geometry).transformed(transform));
        }

        let stats = compute_stats(&scene);
        let stl = export(&scene, &ExportOptions::new(ExportFormat::Stl)).unwrap();
        prop_assert_eq!(stl_triangle_count(&stl.bytes) as usize, stats.triangles);
        prop_assert_eq!(stl.byte_size, 84 + 50 * stats.triangles);

        let bounds = bake(&scene, BakeMode::Baked).compute_bounds();
        prop_assert!(bounds.min.abs_diff_eq(Vec3::from(stats.bounding_box.min), 1e-4));
        prop_assert!(bounds.max.abs_diff_eq(Vec3::from(stats.bounding_box.max), 1e-4));
    }
}
