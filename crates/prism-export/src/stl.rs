//! STL export for 3D printing.

use glam::Vec3;
use prism_scene::Scene;

use crate::error::{ExportError, Result};
use crate::writer::{FormatWriter, WriteOptions};

/// Bytes per binary STL triangle record.
pub const TRIANGLE_RECORD_SIZE: usize = 50;
/// Header plus triangle count.
pub const BINARY_HEADER_SIZE: usize = 84;

/// Writer for binary and ASCII STL.
#[derive(Debug, Default)]
pub struct StlWriter;

impl StlWriter {
    pub fn new() -> Self {
        Self
    }
}

impl FormatWriter for StlWriter {
    fn name(&self) -> &'static str {
        "stl"
    }

    fn extension(&self) -> &'static str {
        "stl"
    }

    fn write(&self, scene: &Scene, options: &WriteOptions) -> Result<Vec<u8>> {
        let triangles = collect_triangles(scene);
        if triangles.is_empty() {
            return Err(ExportError::NoGeometry);
        }

        if options.ascii {
            let name = solid_name(scene);
            Ok(encode_ascii_stl(&triangles, &name).into_bytes())
        } else {
            Ok(encode_binary_stl(&triangles))
        }
    }
}

/// World-space triangles of every mesh, in traversal order.
pub fn collect_triangles(scene: &Scene) -> Vec<[Vec3; 3]> {
    let mut triangles = Vec::new();
    for (_, node, world) in scene.meshes() {
        let Some(geometry) = &node.geometry else {
            continue;
        };
        for [a, b, c] in geometry.triangles() {
            triangles.push([
                world.transform_point3(geometry.positions[a as usize]),
                world.transform_point3(geometry.positions[b as usize]),
                world.transform_point3(geometry.positions[c as usize]),
            ]);
        }
    }
    triangles
}

fn solid_name(scene: &Scene) -> String {
    let name: String = scene
        .name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if name.is_empty() {
        "prism_model".to_string()
    } else {
        name
    }
}

fn face_normal([v0, v1, v2]: &[Vec3; 3]) -> Vec3 {
    (*v1 - *v0).cross(*v2 - *v0).normalize_or_zero()
}

/// Encode triangles as binary STL.
pub fn encode_binary_stl(triangles: &[[Vec3; 3]]) -> Vec<u8> {
    let capacity = BINARY_HEADER_SIZE + triangles.len() * TRIANGLE_RECORD_SIZE;
    let mut output = Vec::with_capacity(capacity);

    // 80-byte header (padded with spaces)
    let mut header = [0x20u8; 80];
    let header_text = b"Binary STL exported by Prism";
    header[..header_text.len()].copy_from_slice(header_text);
    output.extend_from_slice(&header);

    output.extend_from_slice(&(triangles.len() as u32).to_le_bytes());

    for triangle in triangles {
        let normal = face_normal(triangle);
        for v in std::iter::once(&normal).chain(triangle.iter()) {
            output.extend_from_slice(&v.x.to_le_bytes());
            output.extend_from_slice(&v.y.to_le_bytes());
            output.extend_from_slice(&v.z.to_le_bytes());
        }
        // Attribute byte count
        output.extend_from_slice(&0u16.to_le_bytes());
    }

    output
}

/// Encode triangles as ASCII STL.
pub fn encode_ascii_stl(triangles: &[[Vec3; 3]], name: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("solid {name}\n"));
    for triangle in triangles {
        let n = face_normal(triangle);
        output.push_str(&format!("  facet normal {} {} {}\n", n.x, n.y, n.z));
        output.push_str("    outer loop\n");
        for v in triangle {
            output.push_str(&format!("      vertex {} {} {}\n", v.x, v.y, v.z));
        }
        output.push_str("    endloop\n");
        output.push_str("  endfacet\n");
    }
    output.push_str(&format!("endsolid {name}\n"));

    output
}
