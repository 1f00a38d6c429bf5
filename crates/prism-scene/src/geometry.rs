//! Geometry buffers and bounding boxes.

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Triangle geometry: vertex buffers plus an optional index buffer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Vertex normals (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<Vec<Vec3>>,
    /// Texture coordinates (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uvs: Option<Vec<Vec2>>,
    /// Per-vertex colors (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<Vec4>>,
    /// Triangle indices; `None` means sequential triples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<u32>>,
    /// Element ranges drawn with a specific material slot.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GeometryGroup>,
}

/// A range of elements (indices, or vertices when unindexed) bound to one
/// material slot of the owning node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryGroup {
    pub start: usize,
    pub count: usize,
    pub material_index: usize,
}

impl Geometry {
    /// Create geometry from positions only.
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            ..Default::default()
        }
    }

    /// Attach an index buffer.
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Attach vertex normals.
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Attach texture coordinates.
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    /// Attach vertex colors.
    pub fn with_colors(mut self, colors: Vec<Vec4>) -> Self {
        self.colors = Some(colors);
        self
    }

    /// An axis-aligned box with 8 shared corners and 12 triangles.
    pub fn cuboid(half_extents: Vec3) -> Self {
        let h = half_extents;
        let positions = vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // -z
            4, 5, 6, 4, 6, 7, // +z
            0, 1, 5, 0, 5, 4, // -y
            3, 7, 6, 3, 6, 2, // +y
            0, 4, 7, 0, 7, 3, // -x
            1, 2, 6, 1, 6, 5, // +x
        ];
        Self::from_positions(positions).with_indices(indices)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of drawn elements: indices when indexed, vertices otherwise.
    pub fn element_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len(),
            None => self.positions.len(),
        }
    }

    /// Number of complete triangles.
    pub fn triangle_count(&self) -> usize {
        self.element_count() / 3
    }

    pub fn has_vertex_colors(&self) -> bool {
        self.colors.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Vertex index at element position `element`.
    pub fn element(&self, element: usize) -> u32 {
        match &self.indices {
            Some(indices) => indices[element],
            None => element as u32,
        }
    }

    /// Iterate complete triangles as vertex index triples.
    ///
    /// Triangles referencing vertices outside the position buffer are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        let vertex_count = self.positions.len() as u32;
        (0..self.triangle_count())
            .map(move |t| {
                [
                    self.element(t * 3),
                    self.element(t * 3 + 1),
                    self.element(t * 3 + 2),
                ]
            })
            .filter(move |tri| tri.iter().all(|&i| i < vertex_count))
    }

    /// Compute the local-space bounding box.
    pub fn compute_bounds(&self) -> BoundingBox {
        BoundingBox::from_points(&self.positions)
    }

    /// Compute smooth vertex normals if not present.
    pub fn compute_normals(&mut self) {
        if self.normals.is_some() {
            return;
        }

        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for [i0, i1, i2] in self.triangles().collect::<Vec<_>>() {
            let v0 = self.positions[i0 as usize];
            let v1 = self.positions[i1 as usize];
            let v2 = self.positions[i2 as usize];
            let normal = (v1 - v0).cross(v2 - v0);

            normals[i0 as usize] += normal;
            normals[i1 as usize] += normal;
            normals[i2 as usize] += normal;
        }
        for normal in &mut normals {
            *normal = normal.normalize_or_zero();
        }

        self.normals = Some(normals);
    }

    /// Return a copy with positions moved by `matrix` and normals by its
    /// normal matrix.
    pub fn transformed(&self, matrix: &Mat4) -> Geometry {
        let normal_matrix = normal_matrix(matrix);
        let mut out = self.clone();
        for p in &mut out.positions {
            *p = matrix.transform_point3(*p);
        }
        if let Some(normals) = &mut out.normals {
            for n in normals.iter_mut() {
                *n = (normal_matrix * *n).normalize_or_zero();
            }
        }
        out
    }
}

/// Normal matrix: inverse-transpose of the upper-left 3×3 of `world`.
///
/// Singular matrices fall back to the plain 3×3 so that degenerate scales
/// still produce finite output.
pub fn normal_matrix(world: &Mat4) -> Mat3 {
    let upper = Mat3::from_mat4(*world);
    if upper.determinant().abs() <= f32::EPSILON {
        upper
    } else {
        upper.inverse().transpose()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl BoundingBox {
    /// Create from a set of points.
    pub fn from_points(points: &[Vec3]) -> Self {
        if points.is_empty() {
            return Self::default();
        }

        let mut min = points[0];
        let mut max = points[0];
        for p in &points[1..] {
            min = min.min(*p);
            max = max.max(*p);
        }

        Self { min, max }
    }

    /// Get the center of the bounding box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) / 2.0
    }

    /// Get the size of the bounding box.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Expand to include another bounding box.
    pub fn expand(&mut self, other: &BoundingBox) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// The eight corners.
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounding box of this box's corners after `matrix`.
    pub fn transformed(&self, matrix: &Mat4) -> BoundingBox {
        let corners = self.corners().map(|c| matrix.transform_point3(c));
        BoundingBox::from_points(&corners)
    }
}
