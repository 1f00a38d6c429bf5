//! glTF writer implementation.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use glam::{Mat4, Vec2, Vec3, Vec4};
use indexmap::IndexMap;
use prism_paint::Color;
use prism_scene::{
    Filter, Geometry, Material, MaterialId, Node as SceneNode, NodeId, Sampler as SceneSampler,
    Scene as PrismScene, Texture as SceneTexture, TextureId, Wrap,
};
use tracing::debug;

use super::schema::{
    self, Accessor, Asset, Buffer, BufferView, Gltf, GltfMaterial, Image, Mesh, Node,
    PbrMetallicRoughness, Primitive, Sampler, Scene, Texture, TextureInfo,
};
use crate::error::{ExportError, Result};
use crate::writer::{FormatWriter, WriteOptions};

/// GLB magic number "glTF".
const GLB_MAGIC: u32 = 0x46546C67;
/// GLB version.
const GLB_VERSION: u32 = 2;
/// JSON chunk type.
const CHUNK_JSON: u32 = 0x4E4F534A;
/// Binary chunk type.
const CHUNK_BIN: u32 = 0x004E4942;

/// Buffer view target: ARRAY_BUFFER (vertex data).
const TARGET_ARRAY_BUFFER: u32 = 34962;
/// Buffer view target: ELEMENT_ARRAY_BUFFER (index data).
const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;

/// Writer for glTF 2.0 files.
///
/// The binary variant embeds buffers and images in the BIN chunk; the JSON
/// variant embeds them as base64 data URIs.
#[derive(Debug, Clone, Copy)]
pub struct GltfWriter {
    binary: bool,
}

impl GltfWriter {
    /// Writer for `.glb`.
    pub fn binary() -> Self {
        Self { binary: true }
    }

    /// Writer for `.gltf`.
    pub fn json() -> Self {
        Self { binary: false }
    }
}

impl Default for GltfWriter {
    fn default() -> Self {
        Self::binary()
    }
}

impl FormatWriter for GltfWriter {
    fn name(&self) -> &'static str {
        if self.binary {
            "glb"
        } else {
            "gltf"
        }
    }

    fn extension(&self) -> &'static str {
        self.name()
    }

    fn write(&self, scene: &PrismScene, options: &WriteOptions) -> Result<Vec<u8>> {
        if self.binary {
            write_glb(scene)
        } else {
            write_json(scene, options.pretty)
        }
    }
}

/// Internal state for building glTF data.
struct GltfBuilder<'a> {
    scene: &'a PrismScene,
    /// Images go into the binary buffer rather than data URIs.
    images_in_buffer: bool,
    gltf: Gltf,
    buffer_data: Vec<u8>,
    /// Missing or unusable scene materials map to `None`.
    material_to_gltf: HashMap<MaterialId, Option<usize>>,
    /// Disposed or missing textures map to `None`.
    texture_to_gltf: HashMap<TextureId, Option<usize>>,
    node_map: HashMap<NodeId, usize>,
}

impl<'a> GltfBuilder<'a> {
    fn new(scene: &'a PrismScene, images_in_buffer: bool) -> Self {
        Self {
            scene,
            images_in_buffer,
            gltf: Gltf {
                asset: Asset {
                    version: "2.0".to_string(),
                    generator: Some("prism-export".to_string()),
                },
                ..Default::default()
            },
            buffer_data: Vec::new(),
            material_to_gltf: HashMap::new(),
            texture_to_gltf: HashMap::new(),
            node_map: HashMap::new(),
        }
    }

    /// Append bytes as a new buffer view, 4-byte aligned.
    fn add_buffer_view(&mut self, bytes: &[u8], target: Option<u32>) -> usize {
        let padding = (4 - self.buffer_data.len() % 4) % 4;
        self.buffer_data.extend(std::iter::repeat(0u8).take(padding));

        let byte_offset = self.buffer_data.len();
        self.buffer_data.extend_from_slice(bytes);

        let buffer_view_idx = self.gltf.buffer_views.len();
        self.gltf.buffer_views.push(BufferView {
            buffer: 0,
            byte_offset,
            byte_length: bytes.len(),
            target,
        });
        buffer_view_idx
    }

    fn add_float_accessor(
        &mut self,
        components: &[f32],
        count: usize,
        accessor_type: &'static str,
        bounds: Option<(Vec<f32>, Vec<f32>)>,
    ) -> usize {
        let bytes: Vec<u8> = components.iter().flat_map(|c| c.to_le_bytes()).collect();
        let buffer_view = self.add_buffer_view(&bytes, Some(TARGET_ARRAY_BUFFER));

        let (min, max) = bounds.unzip();
        let accessor_idx = self.gltf.accessors.len();
        self.gltf.accessors.push(Accessor {
            buffer_view,
            component_type: schema::COMPONENT_FLOAT,
            count,
            accessor_type,
            min,
            max,
        });
        accessor_idx
    }

    /// Add an accessor for Vec3 data, with min/max when `bounded`.
    fn add_accessor_vec3(&mut self, data: &[Vec3], bounded: bool) -> usize {
        let bounds = bounded.then(|| {
            let (min, max) = data.iter().fold(
                (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
                |(min, max), v| (min.min(*v), max.max(*v)),
            );
            (min.to_array().to_vec(), max.to_array().to_vec())
        });
        let components: Vec<f32> = data.iter().flat_map(|v| v.to_array()).collect();
        self.add_float_accessor(&components, data.len(), "VEC3", bounds)
    }

    /// Add an accessor for Vec2 data (texcoords).
    fn add_accessor_vec2(&mut self, data: &[Vec2]) -> usize {
        let components: Vec<f32> = data.iter().flat_map(|v| v.to_array()).collect();
        self.add_float_accessor(&components, data.len(), "VEC2", None)
    }

    /// Add an accessor for Vec4 data (colors).
    fn add_accessor_vec4(&mut self, data: &[Vec4]) -> usize {
        let components: Vec<f32> = data.iter().flat_map(|v| v.to_array()).collect();
        self.add_float_accessor(&components, data.len(), "VEC4", None)
    }

    /// Add an accessor for index data, u16 when every index fits.
    ///
    /// 65535 is the primitive restart value and forces u32.
    fn add_accessor_indices(&mut self, indices: &[u32]) -> usize {
        let max_index = indices.iter().copied().max().unwrap_or(0);

        let (component_type, bytes): (u32, Vec<u8>) = if max_index < u16::MAX as u32 {
            let bytes = indices
                .iter()
                .flat_map(|&idx| (idx as u16).to_le_bytes())
                .collect();
            (schema::COMPONENT_UNSIGNED_SHORT, bytes)
        } else {
            let bytes = indices.iter().flat_map(|idx| idx.to_le_bytes()).collect();
            (schema::COMPONENT_UNSIGNED_INT, bytes)
        };

        let buffer_view = self.add_buffer_view(&bytes, Some(TARGET_ELEMENT_ARRAY_BUFFER));
        let accessor_idx = self.gltf.accessors.len();
        self.gltf.accessors.push(Accessor {
            buffer_view,
            component_type,
            count: indices.len(),
            accessor_type: "SCALAR",
            min: None,
            max: None,
        });
        accessor_idx
    }

    /// Convert a node's geometry into a glTF mesh.
    ///
    /// Each geometry group becomes its own primitive sharing the vertex
    /// attributes. Attributes whose length disagrees with the positions are
    /// dropped. Indices are always written and carry only the triangles
    /// [`Geometry::triangles`] yields, so incomplete or out-of-range triples
    /// are skipped here as they are by the OBJ and STL writers.
    fn add_mesh(&mut self, node: &SceneNode) -> Result<Option<usize>> {
        let Some(geometry) = &node.geometry else {
            return Ok(None);
        };
        if geometry.positions.is_empty() {
            return Ok(None);
        }
        let vertex_count = geometry.positions.len();

        let mut attributes = IndexMap::new();
        let position_accessor = self.add_accessor_vec3(&geometry.positions, true);
        attributes.insert("POSITION".to_string(), position_accessor);

        if let Some(normals) = geometry.normals.as_ref().filter(|n| n.len() == vertex_count) {
            let normal_accessor = self.add_accessor_vec3(normals, false);
            attributes.insert("NORMAL".to_string(), normal_accessor);
        }
        if let Some(uvs) = geometry.uvs.as_ref().filter(|t| t.len() == vertex_count) {
            let texcoord_accessor = self.add_accessor_vec2(uvs);
            attributes.insert("TEXCOORD_0".to_string(), texcoord_accessor);
        }
        if let Some(colors) = geometry.colors.as_ref().filter(|c| c.len() == vertex_count) {
            let color_accessor = self.add_accessor_vec4(colors);
            attributes.insert("COLOR_0".to_string(), color_accessor);
        }

        let mut primitives = Vec::new();
        if geometry.groups.is_empty() {
            let elements: Vec<u32> = geometry.triangles().flatten().collect();
            if !elements.is_empty() {
                let indices = self.add_accessor_indices(&elements);
                let material = match node.materials.first() {
                    Some(&id) => self.material_index(id)?,
                    None => None,
                };
                primitives.push(Primitive {
                    attributes,
                    indices: Some(indices),
                    material,
                    mode: schema::MODE_TRIANGLES,
                });
            }
        } else {
            for group in &geometry.groups {
                let elements = group_elements(geometry, group.start, group.count);
                if elements.is_empty() {
                    continue;
                }
                let indices = self.add_accessor_indices(&elements);
                let material = match node.materials.get(group.material_index) {
                    Some(&id) => self.material_index(id)?,
                    None => None,
                };
                primitives.push(Primitive {
                    attributes: attributes.clone(),
                    indices: Some(indices),
                    material,
                    mode: schema::MODE_TRIANGLES,
                });
            }
        }

        if primitives.is_empty() {
            return Ok(None);
        }
        let mesh_idx = self.gltf.meshes.len();
        self.gltf.meshes.push(Mesh {
            name: non_empty(&node.name),
            primitives,
        });
        Ok(Some(mesh_idx))
    }

    fn material_index(&mut self, id: MaterialId) -> Result<Option<usize>> {
        if let Some(&idx) = self.material_to_gltf.get(&id) {
            return Ok(idx);
        }
        let scene = self.scene;
        let idx = match scene.materials.get(&id) {
            Some(material) => Some(self.add_material(material)?),
            None => None,
        };
        self.material_to_gltf.insert(id, idx);
        Ok(idx)
    }

    /// Convert a scene material to a PBR material.
    fn add_material(&mut self, material: &Material) -> Result<usize> {
        let base_color_texture = match material.map {
            Some(id) => self.texture_index(id)?.map(|index| TextureInfo {
                index,
                tex_coord: 0,
            }),
            None => None,
        };

        let [r, g, b] = material.color.unwrap_or(Color::WHITE).to_linear();
        let opacity = material.opacity.clamp(0.0, 1.0);
        let emissive = material
            .emissive
            .to_linear()
            .map(|c| (c * material.emissive_intensity).clamp(0.0, 1.0));
        let blend = material.transparent || opacity < 1.0;

        let gltf_material = GltfMaterial {
            name: non_empty(&material.name),
            pbr_metallic_roughness: PbrMetallicRoughness {
                base_color_factor: [r, g, b, opacity],
                base_color_texture,
                metallic_factor: material.metalness.clamp(0.0, 1.0),
                roughness_factor: material.roughness.clamp(0.0, 1.0),
            },
            emissive_factor: emissive,
            alpha_mode: if blend { "BLEND" } else { "OPAQUE" },
            double_sided: material.double_sided,
        };

        let material_idx = self.gltf.materials.len();
        self.gltf.materials.push(gltf_material);
        Ok(material_idx)
    }

    fn texture_index(&mut self, id: TextureId) -> Result<Option<usize>> {
        if let Some(&idx) = self.texture_to_gltf.get(&id) {
            return Ok(idx);
        }
        let scene = self.scene;
        let idx = match scene.textures.get(&id) {
            Some(texture) if !texture.disposed => Some(self.add_texture(texture)?),
            _ => None,
        };
        self.texture_to_gltf.insert(id, idx);
        Ok(idx)
    }

    /// Add a texture with its image and sampler.
    fn add_texture(&mut self, texture: &SceneTexture) -> Result<usize> {
        let (data, mime_type) = texture
            .encoded()
            .map_err(|e| ExportError::Serialization(format!("texture '{}': {e}", texture.name)))?;

        let image = if self.images_in_buffer {
            let buffer_view = self.add_buffer_view(&data, None);
            Image {
                mime_type: Some(mime_type.to_string()),
                buffer_view: Some(buffer_view),
                name: non_empty(&texture.name),
                ..Default::default()
            }
        } else {
            Image {
                uri: Some(format!("data:{mime_type};base64,{}", STANDARD.encode(&data))),
                name: non_empty(&texture.name),
                ..Default::default()
            }
        };
        let image_idx = self.gltf.images.len();
        self.gltf.images.push(image);

        let sampler_idx = self.add_sampler(&texture.sampler);

        let texture_idx = self.gltf.textures.len();
        self.gltf.textures.push(Texture {
            sampler: sampler_idx,
            source: image_idx,
            name: non_empty(&texture.name),
        });
        Ok(texture_idx)
    }

    /// Add a sampler, reusing an identical one.
    fn add_sampler(&mut self, sampler: &SceneSampler) -> usize {
        let gltf_sampler = Sampler {
            mag_filter: filter_code(sampler.mag_filter),
            min_filter: filter_code(sampler.min_filter),
            wrap_s: wrap_code(sampler.wrap_u),
            wrap_t: wrap_code(sampler.wrap_v),
        };
        if let Some(idx) = self.gltf.samplers.iter().position(|s| *s == gltf_sampler) {
            return idx;
        }
        self.gltf.samplers.push(gltf_sampler);
        self.gltf.samplers.len() - 1
    }

    /// Convert a scene node and its subtree.
    ///
    /// The node's index is reserved before its children so parents precede
    /// children. Nodes already visited are not converted twice.
    fn convert_node(&mut self, id: NodeId) -> Result<Option<usize>> {
        if self.node_map.contains_key(&id) {
            return Ok(None);
        }
        let scene = self.scene;
        let Some(scene_node) = scene.node(id) else {
            return Ok(None);
        };

        let gltf_node_idx = self.gltf.nodes.len();
        self.gltf.nodes.push(Node::default());
        self.node_map.insert(id, gltf_node_idx);

        let mesh = self.add_mesh(scene_node)?;

        let mut children = Vec::new();
        for &child in &scene_node.children {
            if let Some(idx) = self.convert_node(child)? {
                children.push(idx);
            }
        }

        let (translation, rotation, scale) = decompose_transform(&scene_node.transform);
        self.gltf.nodes[gltf_node_idx] = Node {
            name: non_empty(&scene_node.name),
            children,
            mesh,
            translation: (translation != [0.0, 0.0, 0.0]).then_some(translation),
            rotation: (rotation != [0.0, 0.0, 0.0, 1.0]).then_some(rotation),
            scale: (scale != [1.0, 1.0, 1.0]).then_some(scale),
        };
        Ok(Some(gltf_node_idx))
    }

    /// Build the glTF structure from the scene.
    fn build(mut self) -> Result<(Gltf, Vec<u8>)> {
        let scene = self.scene;
        let mut root_indices = Vec::new();
        for &root in &scene.roots {
            if let Some(idx) = self.convert_node(root)? {
                root_indices.push(idx);
            }
        }

        if !root_indices.is_empty() {
            self.gltf.scenes.push(Scene {
                name: non_empty(&scene.name),
                nodes: root_indices,
            });
            self.gltf.scene = Some(0);
        }

        if !self.buffer_data.is_empty() {
            self.gltf.buffers.push(Buffer {
                byte_length: self.buffer_data.len(),
                uri: None,
            });
        }

        debug!(
            nodes = self.gltf.nodes.len(),
            meshes = self.gltf.meshes.len(),
            materials = self.gltf.materials.len(),
            textures = self.gltf.textures.len(),
            buffer_bytes = self.buffer_data.len(),
            "built glTF document"
        );
        Ok((self.gltf, self.buffer_data))
    }
}

/// Vertex indices for the elements `start..start + count`, clipped to the
/// geometry's element range.
/// Complete, in-range triangles of the element range `start..start + count`.
fn group_elements(geometry: &Geometry, start: usize, count: usize) -> Vec<u32> {
    let end = start.saturating_add(count).min(geometry.element_count());
    let start = start.min(end);
    let vertex_count = geometry.positions.len() as u32;
    (0..(end - start) / 3)
        .map(|t| {
            let e = start + t * 3;
            [geometry.element(e), geometry.element(e + 1), geometry.element(e + 2)]
        })
        .filter(|tri| tri.iter().all(|&i| i < vertex_count))
        .flatten()
        .collect()
}

fn non_empty(name: &str) -> Option<String> {
    (!name.is_empty()).then(|| name.to_string())
}

fn filter_code(filter: Filter) -> u32 {
    match filter {
        Filter::Nearest => 9728,
        Filter::Linear => 9729,
    }
}

fn wrap_code(wrap: Wrap) -> u32 {
    match wrap {
        Wrap::ClampToEdge => 33071,
        Wrap::Repeat => 10497,
        Wrap::MirroredRepeat => 33648,
    }
}

/// Decompose a Mat4 into translation, rotation (quaternion), and scale.
fn decompose_transform(transform: &Mat4) -> ([f32; 3], [f32; 4], [f32; 3]) {
    let (scale, rotation, translation) = transform.to_scale_rotation_translation();

    (
        [translation.x, translation.y, translation.z],
        [rotation.x, rotation.y, rotation.z, rotation.w],
        [scale.x, scale.y, scale.z],
    )
}

fn serialization_error(e: serde_json::Error) -> ExportError {
    ExportError::Serialization(format!("failed to serialize glTF JSON: {e}"))
}

fn write_glb(scene: &PrismScene) -> Result<Vec<u8>> {
    let (gltf, buffer_data) = GltfBuilder::new(scene, true).build()?;

    let json_bytes = serde_json::to_vec(&gltf).map_err(serialization_error)?;

    // Pad JSON to 4-byte alignment
    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let padded_json_len = json_bytes.len() + json_padding;

    // Pad binary to 4-byte alignment
    let bin_padding = (4 - (buffer_data.len() % 4)) % 4;
    let padded_bin_len = buffer_data.len() + bin_padding;

    let has_bin = !buffer_data.is_empty();
    let total_size = 12  // GLB header
        + 8 + padded_json_len  // JSON chunk
        + if has_bin { 8 + padded_bin_len } else { 0 }; // BIN chunk (optional)

    let mut output = Vec::with_capacity(total_size);

    // GLB header
    output.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    output.extend_from_slice(&GLB_VERSION.to_le_bytes());
    output.extend_from_slice(&(total_size as u32).to_le_bytes());

    // JSON chunk
    output.extend_from_slice(&(padded_json_len as u32).to_le_bytes());
    output.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    output.extend_from_slice(&json_bytes);
    output.extend(std::iter::repeat(0x20u8).take(json_padding)); // Space padding

    if has_bin {
        output.extend_from_slice(&(padded_bin_len as u32).to_le_bytes());
        output.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        output.extend_from_slice(&buffer_data);
        output.extend(std::iter::repeat(0u8).take(bin_padding)); // Zero padding
    }

    Ok(output)
}

fn write_json(scene: &PrismScene, pretty: bool) -> Result<Vec<u8>> {
    let (mut gltf, buffer_data) = GltfBuilder::new(scene, false).build()?;

    // Embed buffer as base64 data URI
    if let Some(buffer) = gltf.buffers.first_mut() {
        let data_uri = format!(
            "data:application/octet-stream;base64,{}",
            STANDARD.encode(&buffer_data)
        );
        buffer.uri = Some(data_uri);
    }

    let json_bytes = if pretty {
        serde_json::to_vec_pretty(&gltf)
    } else {
        serde_json::to_vec(&gltf)
    }
    .map_err(serialization_error)?;

    Ok(json_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_paint::RgbaImage;
    use prism_scene::GeometryGroup;
    use serde_json::Value;

    /// Parse a GLB into its JSON document and BIN payload.
    fn split_glb(glb: &[u8]) -> (Value, Vec<u8>) {
        let word = |at: usize| u32::from_le_bytes([glb[at], glb[at + 1], glb[at + 2], glb[at + 3]]);
        assert_eq!(word(0), GLB_MAGIC);
        assert_eq!(word(4), GLB_VERSION);
        assert_eq!(word(8) as usize, glb.len());

        let json_len = word(12) as usize;
        assert_eq!(word(16), CHUNK_JSON);
        let json: Value = serde_json::from_slice(&glb[20..20 + json_len]).unwrap();

        let bin_start = 20 + json_len;
        if bin_start >= glb.len() {
            return (json, Vec::new());
        }
        let bin_len = word(bin_start) as usize;
        assert_eq!(word(bin_start + 4), CHUNK_BIN);
        (json, glb[bin_start + 8..bin_start + 8 + bin_len].to_vec())
    }

    fn triangle() -> Geometry {
        Geometry::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::new(0.5, 1.0, 0.0)])
            .with_indices(vec![0, 1, 2])
    }

    #[test]
    fn test_write_empty_scene() {
        let glb = GltfWriter::binary()
            .write(&PrismScene::new(), &WriteOptions::new())
            .unwrap();
        let (json, bin) = split_glb(&glb);
        assert_eq!(json["asset"]["version"], "2.0");
        assert!(bin.is_empty());
        assert_eq!(glb.len() % 4, 0);
    }

    #[test]
    fn test_write_simple_mesh() {
        let mut scene = PrismScene::named("demo");
        scene.add_root(SceneNode::mesh("Triangle", triangle()));

        let glb = GltfWriter::binary().write(&scene, &WriteOptions::new()).unwrap();
        let (json, bin) = split_glb(&glb);

        assert_eq!(json["scenes"][0]["name"], "demo");
        assert_eq!(json["nodes"][0]["name"], "Triangle");
        let primitive = &json["meshes"][0]["primitives"][0];
        assert_eq!(primitive["mode"], 4);
        let position = &json["accessors"][primitive["attributes"]["POSITION"].as_u64().unwrap() as usize];
        assert_eq!(position["count"], 3);
        assert_eq!(position["max"], serde_json::json!([1.0, 1.0, 0.0]));
        let indices = &json["accessors"][primitive["indices"].as_u64().unwrap() as usize];
        assert_eq!(indices["componentType"], schema::COMPONENT_UNSIGNED_SHORT);
        // BIN chunk is padded to 4 bytes; the buffer length is not
        let byte_length = json["buffers"][0]["byteLength"].as_u64().unwrap() as usize;
        assert_eq!(bin.len(), (byte_length + 3) / 4 * 4);
    }

    #[test]
    fn test_material_factors() {
        let mut scene = PrismScene::new();
        let mut material = Material::colored("Red", Color::rgb(255, 0, 0));
        material.metalness = 0.5;
        material.roughness = 0.3;
        material.set_opacity(0.5);
        material.emissive = Color::WHITE;
        material.emissive_intensity = 3.0;
        material.double_sided = true;
        let id = scene.add_material(material);
        scene.add_root(SceneNode::mesh("Triangle", triangle()).with_material(id));

        let glb = GltfWriter::binary().write(&scene, &WriteOptions::new()).unwrap();
        let (json, _) = split_glb(&glb);
        let material = &json["materials"][0];
        let pbr = &material["pbrMetallicRoughness"];

        let factor: Vec<f64> = pbr["baseColorFactor"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_f64().unwrap())
            .collect();
        assert!((factor[0] - 1.0).abs() < 1e-4);
        assert_eq!(factor[1], 0.0);
        assert_eq!(factor[3], 0.5);
        assert!((pbr["metallicFactor"].as_f64().unwrap() - 0.5).abs() < 1e-6);
        assert!((pbr["roughnessFactor"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(material["alphaMode"], "BLEND");
        assert_eq!(material["doubleSided"], true);
        for channel in material["emissiveFactor"].as_array().unwrap() {
            assert!((channel.as_f64().unwrap() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_srgb_color_is_linearized() {
        let mut scene = PrismScene::new();
        let id = scene.add_material(Material::colored("Grey", Color::rgb(128, 128, 128)));
        scene.add_root(SceneNode::mesh("Triangle", triangle()).with_material(id));

        let glb = GltfWriter::binary().write(&scene, &WriteOptions::new()).unwrap();
        let (json, _) = split_glb(&glb);
        let r = json["materials"][0]["pbrMetallicRoughness"]["baseColorFactor"][0]
            .as_f64()
            .unwrap();
        assert!((r - 0.2158).abs() < 1e-3);
        assert_eq!(json["materials"][0]["alphaMode"], "OPAQUE");
    }

    #[test]
    fn test_texture_embedded_in_bin_chunk() {
        let mut scene = PrismScene::new();
        let texture = scene.add_texture(
            SceneTexture::from_image("gradient", RgbaImage::filled(4, 4, Color::WHITE))
                .with_repeat_wrap(),
        );
        let mut material = Material::new("textured");
        material.map = Some(texture);
        let id = scene.add_material(material);
        scene.add_root(SceneNode::mesh("Triangle", triangle()).with_material(id));

        let glb = GltfWriter::binary().write(&scene, &WriteOptions::new()).unwrap();
        let (json, bin) = split_glb(&glb);

        assert_eq!(
            json["materials"][0]["pbrMetallicRoughness"]["baseColorTexture"]["index"],
            0
        );
        assert_eq!(json["samplers"][0]["wrapS"], 10497);
        let image = &json["images"][0];
        assert_eq!(image["mimeType"], "image/png");
        let view = &json["bufferViews"][image["bufferView"].as_u64().unwrap() as usize];
        let offset = view["byteOffset"].as_u64().unwrap() as usize;
        assert_eq!(&bin[offset..offset + 8], b"\x89PNG\r\n\x1a\n");
        assert!(view.get("target").is_none());
    }

    #[test]
    fn test_disposed_texture_is_skipped() {
        let mut scene = PrismScene::new();
        let texture = scene.add_texture(SceneTexture::from_image("gone", RgbaImage::new(2, 2)));
        scene.textures[&texture].dispose();
        let mut material = Material::new("m");
        material.map = Some(texture);
        let id = scene.add_material(material);
        scene.add_root(SceneNode::mesh("Triangle", triangle()).with_material(id));

        let glb = GltfWriter::binary().write(&scene, &WriteOptions::new()).unwrap();
        let (json, _) = split_glb(&glb);
        assert!(json.get("textures").is_none());
        assert!(json["materials"][0]["pbrMetallicRoughness"]
            .get("baseColorTexture")
            .is_none());
    }

    #[test]
    fn test_groups_become_primitives() {
        let mut scene = PrismScene::new();
        let red = scene.add_material(Material::colored("red", Color::rgb(255, 0, 0)));
        let blue = scene.add_material(Material::colored("blue", Color::rgb(0, 0, 255)));
        let mut geometry = Geometry::cuboid(Vec3::ONE);
        geometry.groups = vec![
            GeometryGroup {
                start: 0,
                count: 18,
                material_index: 0,
            },
            GeometryGroup {
                start: 18,
                count: 18,
                material_index: 1,
            },
        ];
        scene.add_root(
            SceneNode::mesh("cube", geometry)
                .with_material(red)
                .with_material(blue),
        );

        let glb = GltfWriter::binary().write(&scene, &WriteOptions::new()).unwrap();
        let (json, _) = split_glb(&glb);
        let primitives = json["meshes"][0]["primitives"].as_array().unwrap();
        assert_eq!(primitives.len(), 2);
        assert_eq!(primitives[0]["material"], 0);
        assert_eq!(primitives[1]["material"], 1);
        assert_eq!(
            primitives[0]["attributes"]["POSITION"],
            primitives[1]["attributes"]["POSITION"]
        );
        let count = |p: &Value| json["accessors"][p["indices"].as_u64().unwrap() as usize]["count"].clone();
        assert_eq!(count(&primitives[0]), 18);
        assert_eq!(count(&primitives[1]), 18);
    }

    #[test]
    fn test_write_json_format() {
        let mut scene = PrismScene::new();
        let texture = scene.add_texture(SceneTexture::from_image("t", RgbaImage::new(2, 2)));
        let mut material = Material::new("m");
        material.map = Some(texture);
        let id = scene.add_material(material);
        scene.add_root(SceneNode::mesh("Triangle", triangle()).with_material(id));

        let bytes = GltfWriter::json()
            .write(&scene, &WriteOptions::new().pretty())
            .unwrap();
        let json = String::from_utf8(bytes).unwrap();
        assert!(json.contains("\"version\": \"2.0\""));
        assert!(json.contains("data:application/octet-stream;base64,"));

        let doc: Value = serde_json::from_str(&json).unwrap();
        let image = &doc["images"][0];
        assert!(image["uri"].as_str().unwrap().starts_with("data:image/png;base64,"));
        assert!(image.get("bufferView").is_none());
    }

    #[test]
    fn test_hierarchy_parents_precede_children() {
        let mut scene = PrismScene::new();
        let root = scene.add_root(
            SceneNode::new("Root").transformed(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))),
        );
        scene.add_child(root, SceneNode::new("Child1")).unwrap();
        scene.add_child(root, SceneNode::new("Child2")).unwrap();

        let glb = GltfWriter::binary().write(&scene, &WriteOptions::new()).unwrap();
        let (json, _) = split_glb(&glb);
        assert_eq!(json["scenes"][0]["nodes"], serde_json::json!([0]));
        assert_eq!(json["nodes"][0]["name"], "Root");
        assert_eq!(json["nodes"][0]["children"], serde_json::json!([1, 2]));
        assert_eq!(json["nodes"][0]["translation"], serde_json::json!([1.0, 2.0, 3.0]));
        assert!(json["nodes"][1].get("translation").is_none());
    }

    #[test]
    fn test_large_meshes_use_u32_indices() {
        let count = u16::MAX as usize + 2;
        let positions = vec![Vec3::ZERO; count];
        let indices = vec![0, 1, count as u32 - 1];
        let mut scene = PrismScene::new();
        scene.add_root(SceneNode::mesh(
            "big",
            Geometry::from_positions(positions).with_indices(indices),
        ));

        let glb = GltfWriter::binary().write(&scene, &WriteOptions::new()).unwrap();
        let (json, _) = split_glb(&glb);
        let idx = json["meshes"][0]["primitives"][0]["indices"].as_u64().unwrap() as usize;
        assert_eq!(json["accessors"][idx]["componentType"], schema::COMPONENT_UNSIGNED_INT);
    }

    #[test]
    fn test_restart_value_forces_u32_indices() {
        let count = u16::MAX as usize + 1;
        let indices = vec![0, 1, u16::MAX as u32];
        let mut scene = PrismScene::new();
        scene.add_root(SceneNode::mesh(
            "edge",
            Geometry::from_positions(vec![Vec3::ZERO; count]).with_indices(indices),
        ));

        let glb = GltfWriter::binary().write(&scene, &WriteOptions::new()).unwrap();
        let (json, _) = split_glb(&glb);
        let idx = json["meshes"][0]["primitives"][0]["indices"].as_u64().unwrap() as usize;
        assert_eq!(json["accessors"][idx]["componentType"], schema::COMPONENT_UNSIGNED_INT);
    }

    #[test]
    fn test_out_of_range_triangles_are_dropped() {
        let geometry = Geometry::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y])
            .with_indices(vec![0, 1, 2, 0, 1, 9]);
        let mut scene = PrismScene::new();
        scene.add_root(SceneNode::mesh("broken", geometry));

        let glb = GltfWriter::binary().write(&scene, &WriteOptions::new()).unwrap();
        let (json, bin) = split_glb(&glb);
        let idx = json["meshes"][0]["primitives"][0]["indices"].as_u64().unwrap() as usize;
        let accessor = &json["accessors"][idx];
        assert_eq!(accessor["count"], 3);

        let view = &json["bufferViews"][accessor["bufferView"].as_u64().unwrap() as usize];
        let offset = view["byteOffset"].as_u64().unwrap() as usize;
        let written: Vec<u16> = bin[offset..offset + 6]
            .chunks(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(written, vec![0, 1, 2]);
    }

    #[test]
    fn test_unindexed_geometry_gets_whole_triangles() {
        // Four vertices draw one triangle; the trailing vertex is not indexed
        let geometry = Geometry::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z]);
        let mut scene = PrismScene::new();
        scene.add_root(SceneNode::mesh("strip", geometry));

        let glb = GltfWriter::binary().write(&scene, &WriteOptions::new()).unwrap();
        let (json, _) = split_glb(&glb);
        let idx = json["meshes"][0]["primitives"][0]["indices"].as_u64().unwrap() as usize;
        assert_eq!(json["accessors"][idx]["count"], 3);
    }

    #[test]
    fn test_transform_decomposition() {
        let (t, r, s) = decompose_transform(&Mat4::IDENTITY);
        assert_eq!(t, [0.0, 0.0, 0.0]);
        assert_eq!(r, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(s, [1.0, 1.0, 1.0]);

        let transform = Mat4::from_scale(Vec3::new(2.0, 3.0, 4.0));
        let (_, _, s) = decompose_transform(&transform);
        assert!((s[0] - 2.0).abs() < 0.001);
        assert!((s[1] - 3.0).abs() < 0.001);
        assert!((s[2] - 4.0).abs() < 0.001);
    }
}
