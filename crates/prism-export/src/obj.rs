//! Wavefront OBJ export.
//!
//! Geometry only: no material library is written, so colors and texture
//! maps are dropped.

use prism_scene::{normal_matrix, Scene};

use crate::error::{ExportError, Result};
use crate::writer::{FormatWriter, WriteOptions};

/// Writer for ASCII Wavefront OBJ.
#[derive(Debug, Default)]
pub struct ObjWriter;

impl ObjWriter {
    pub fn new() -> Self {
        Self
    }
}

impl FormatWriter for ObjWriter {
    fn name(&self) -> &'static str {
        "obj"
    }

    fn extension(&self) -> &'static str {
        "obj"
    }

    fn write(&self, scene: &Scene, _options: &WriteOptions) -> Result<Vec<u8>> {
        encode_obj(scene).map(String::into_bytes)
    }
}

/// Running 1-based index bases; each attribute advances independently.
#[derive(Debug, Default)]
struct Offsets {
    vertex: usize,
    uv: usize,
    normal: usize,
}

/// Encode every mesh of `scene` as OBJ text, in world space.
pub fn encode_obj(scene: &Scene) -> Result<String> {
    let mut output = String::new();
    output.push_str("# Wavefront OBJ exported by Prism\n");
    if !scene.name.is_empty() {
        output.push_str(&format!("# scene: {}\n", scene.name));
    }

    let mut offsets = Offsets::default();
    let mut faces = 0usize;

    for (index, (_, node, world)) in scene.meshes().enumerate() {
        let Some(geometry) = &node.geometry else {
            continue;
        };
        if geometry.positions.is_empty() {
            continue;
        }

        let vertex_count = geometry.positions.len();
        let uvs = geometry.uvs.as_ref().filter(|uvs| uvs.len() == vertex_count);
        let normals = geometry
            .normals
            .as_ref()
            .filter(|normals| normals.len() == vertex_count);

        output.push_str(&format!("o {}\n", object_name(&node.name, index)));

        for p in &geometry.positions {
            let p = world.transform_point3(*p);
            output.push_str(&format!("v {:.6} {:.6} {:.6}\n", p.x, p.y, p.z));
        }
        if let Some(uvs) = uvs {
            for uv in uvs {
                output.push_str(&format!("vt {:.6} {:.6}\n", uv.x, uv.y));
            }
        }
        if let Some(normals) = normals {
            let matrix = normal_matrix(&world);
            for n in normals {
                let n = (matrix * *n).normalize_or_zero();
                output.push_str(&format!("vn {:.6} {:.6} {:.6}\n", n.x, n.y, n.z));
            }
        }

        for triangle in geometry.triangles() {
            output.push('f');
            for i in triangle {
                let i = i as usize;
                let v = offsets.vertex + i + 1;
                let vertex = match (uvs.is_some(), normals.is_some()) {
                    (true, true) => format!("{v}/{}/{}", offsets.uv + i + 1, offsets.normal + i + 1),
                    (false, true) => format!("{v}//{}", offsets.normal + i + 1),
                    (true, false) => format!("{v}/{}", offsets.uv + i + 1),
                    (false, false) => v.to_string(),
                };
                output.push(' ');
                output.push_str(&vertex);
            }
            output.push('\n');
            faces += 1;
        }

        offsets.vertex += vertex_count;
        offsets.uv += uvs.map_or(0, Vec::len);
        offsets.normal += normals.map_or(0, Vec::len);
    }

    if faces == 0 {
        return Err(ExportError::NoGeometry);
    }
    Ok(output)
}

fn object_name(name: &str, index: usize) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        format!("mesh_{index}")
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec2, Vec3};
    use prism_scene::{Geometry, Node};

    fn face_lines(obj: &str) -> Vec<&str> {
        obj.lines().filter(|l| l.starts_with("f ")).collect()
    }

    #[test]
    fn test_index_continuity_across_meshes() {
        let mut scene = Scene::new();
        let a = Geometry::from_positions(vec![Vec3::ZERO; 10])
            .with_indices(vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 1]);
        let b = Geometry::from_positions(vec![Vec3::ZERO; 5]).with_indices(vec![0, 1, 2, 2, 3, 4]);
        scene.add_root(Node::mesh("a", a));
        scene.add_root(Node::mesh("b", b));

        let obj = encode_obj(&scene).unwrap();
        let faces = face_lines(&obj);
        assert_eq!(faces.len(), 6);
        assert_eq!(faces[4], "f 11 12 13");
        assert_eq!(faces[5], "f 13 14 15");
    }

    #[test]
    fn test_face_forms_follow_attributes() {
        let tri = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let mut scene = Scene::new();
        scene.add_root(Node::mesh(
            "full",
            Geometry::from_positions(tri.clone())
                .with_uvs(vec![Vec2::ZERO; 3])
                .with_normals(vec![Vec3::Z; 3]),
        ));
        scene.add_root(Node::mesh(
            "normals",
            Geometry::from_positions(tri.clone()).with_normals(vec![Vec3::Z; 3]),
        ));
        scene.add_root(Node::mesh(
            "uvs",
            Geometry::from_positions(tri.clone()).with_uvs(vec![Vec2::ONE; 3]),
        ));
        scene.add_root(Node::mesh("bare", Geometry::from_positions(tri)));

        let obj = encode_obj(&scene).unwrap();
        let faces = face_lines(&obj);
        assert_eq!(faces[0], "f 1/1/1 2/2/2 3/3/3");
        assert_eq!(faces[1], "f 4//4 5//5 6//6");
        assert_eq!(faces[2], "f 7/4 8/5 9/6");
        assert_eq!(faces[3], "f 10 11 12");
    }

    #[test]
    fn test_world_space_output() {
        let mut scene = Scene::new();
        scene.add_root(
            Node::mesh(
                "moved triangle",
                Geometry::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y])
                    .with_normals(vec![Vec3::Z; 3]),
            )
            .transformed(Mat4::from_scale(Vec3::new(1.0, 1.0, -1.0))),
        );
        let obj = encode_obj(&scene).unwrap();
        assert!(obj.starts_with("# Wavefront OBJ exported by Prism\n"));
        assert!(obj.contains("o moved_triangle\n"));
        assert!(obj.contains("v 1.000000 0.000000 0.000000\n"));
        assert!(obj.contains("vn 0.000000 0.000000 -1.000000\n"));
    }

    #[test]
    fn test_meshes_without_positions_are_skipped() {
        let mut scene = Scene::new();
        scene.add_root(Node::mesh("empty", Geometry::default()));
        scene.add_root(Node::mesh("", Geometry::cuboid(Vec3::ONE)));
        let obj = encode_obj(&scene).unwrap();
        assert!(!obj.contains("o empty"));
        assert!(obj.contains("o mesh_1\n"));
        assert!(face_lines(&obj)[0].starts_with("f 1 "));
    }

    #[test]
    fn test_no_geometry() {
        assert!(matches!(
            encode_obj(&Scene::new()),
            Err(ExportError::NoGeometry)
        ));
    }
}
