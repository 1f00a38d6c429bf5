//! Format writers, their registry and the export entry point.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use prism_scene::Scene;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bake::{bake, BakeMode};
use crate::error::{ExportError, Result};
use crate::gltf::GltfWriter;
use crate::obj::ObjWriter;
use crate::stl::StlWriter;

/// Trait for format writers.
///
/// Implement this trait to add support for writing a new file format.
pub trait FormatWriter: Send + Sync {
    /// Get the format name (e.g., "glb", "obj").
    fn name(&self) -> &'static str;

    /// Get the file extension (e.g., "glb").
    fn extension(&self) -> &'static str;

    /// Serialize a detached scene.
    fn write(&self, scene: &Scene, options: &WriteOptions) -> Result<Vec<u8>>;
}

/// Options passed through to writers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WriteOptions {
    /// Pretty-print text formats.
    pub pretty: bool,
    /// Emit ASCII instead of binary where the format has both.
    pub ascii: bool,
}

impl WriteOptions {
    /// Create default write options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-print output.
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Prefer ASCII output.
    pub fn ascii(mut self) -> Self {
        self.ascii = true;
        self
    }
}

/// Export target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Glb,
    Gltf,
    Obj,
    Stl,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Glb,
        ExportFormat::Gltf,
        ExportFormat::Obj,
        ExportFormat::Stl,
    ];

    /// Registered writer name; also the file extension.
    pub fn name(self) -> &'static str {
        match self {
            ExportFormat::Glb => "glb",
            ExportFormat::Gltf => "gltf",
            ExportFormat::Obj => "obj",
            ExportFormat::Stl => "stl",
        }
    }

    /// Guess the format from a file path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.name() == lower)
            .ok_or_else(|| ExportError::NoWriter(s.to_string()))
    }
}

/// Everything [`export`] needs to know.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub bake: BakeMode,
    #[serde(flatten)]
    pub write: WriteOptions,
}

impl ExportOptions {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    pub fn with_bake(mut self, bake: BakeMode) -> Self {
        self.bake = bake;
        self
    }

    pub fn with_write_options(mut self, write: WriteOptions) -> Self {
        self.write = write;
        self
    }
}

/// A finished export. Persisting it is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutput {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    pub byte_size: usize,
}

impl ExportOutput {
    /// Write the bytes to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Registry of format writers.
pub struct FormatRegistry {
    writers: IndexMap<String, Box<dyn FormatWriter>>,
    extension_to_writer: IndexMap<String, String>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl FormatRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            writers: IndexMap::new(),
            extension_to_writer: IndexMap::new(),
        }
    }

    /// Create a registry with the GLB, glTF, OBJ and STL writers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_writer(GltfWriter::binary());
        registry.register_writer(GltfWriter::json());
        registry.register_writer(ObjWriter::new());
        registry.register_writer(StlWriter::new());
        registry
    }

    /// Register a format writer.
    pub fn register_writer<W: FormatWriter + 'static>(&mut self, writer: W) {
        let name = writer.name().to_lowercase();
        self.extension_to_writer
            .insert(writer.extension().to_lowercase(), name.clone());
        self.writers.insert(name, Box::new(writer));
    }

    /// Get a writer by format name.
    pub fn get_writer(&self, format: &str) -> Option<&dyn FormatWriter> {
        self.writers.get(&format.to_lowercase()).map(|w| w.as_ref())
    }

    /// Get a writer by file extension.
    pub fn writer_for_extension(&self, ext: &str) -> Option<&dyn FormatWriter> {
        let ext_lower = ext.trim_start_matches('.').to_lowercase();
        let format = self.extension_to_writer.get(&ext_lower)?;
        self.get_writer(format)
    }

    /// List all registered writer format names.
    pub fn writer_formats(&self) -> impl Iterator<Item = &str> {
        self.writers.keys().map(String::as_str)
    }

    /// Bake a detached copy of `scene` and serialize it.
    pub fn export(&self, scene: &Scene, options: &ExportOptions) -> Result<ExportOutput> {
        let writer = self
            .get_writer(options.format.name())
            .ok_or_else(|| ExportError::NoWriter(options.format.name().into()))?;

        let detached = bake(scene, options.bake);
        let bytes = writer.write(&detached, &options.write)?;
        let byte_size = bytes.len();
        info!(
            format = %options.format,
            bake = ?options.bake,
            byte_size,
            "exported scene"
        );
        Ok(ExportOutput {
            format: options.format,
            bytes,
            byte_size,
        })
    }
}

/// Export with the default writers.
pub fn export(scene: &Scene, options: &ExportOptions) -> Result<ExportOutput> {
    FormatRegistry::with_defaults().export(scene, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockWriter;

    impl FormatWriter for MockWriter {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn extension(&self) -> &'static str {
            "mck"
        }

        fn write(&self, scene: &Scene, _options: &WriteOptions) -> Result<Vec<u8>> {
            Ok(scene.name.as_bytes().to_vec())
        }
    }

    #[test]
    fn test_default_writers() {
        let registry = FormatRegistry::with_defaults();
        let formats: Vec<_> = registry.writer_formats().collect();
        assert_eq!(formats, vec!["glb", "gltf", "obj", "stl"]);
        assert!(registry.writer_for_extension(".STL").is_some());
        assert!(registry.get_writer("fbx").is_none());
    }

    #[test]
    fn test_register_custom_writer() {
        let mut registry = FormatRegistry::new();
        registry.register_writer(MockWriter);
        let writer = registry.writer_for_extension("mck").unwrap();
        let bytes = writer
            .write(&Scene::named("demo"), &WriteOptions::new())
            .unwrap();
        assert_eq!(bytes, b"demo");
    }

    #[test]
    fn test_missing_writer_is_an_error() {
        let registry = FormatRegistry::new();
        let err = registry
            .export(&Scene::new(), &ExportOptions::new(ExportFormat::Obj))
            .unwrap_err();
        assert!(matches!(err, ExportError::NoWriter(name) if name == "obj"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("GLB".parse::<ExportFormat>().unwrap(), ExportFormat::Glb);
        assert_eq!(
            ExportFormat::from_path(Path::new("out/model.stl")),
            Some(ExportFormat::Stl)
        );
        assert!("fbx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_export_options_json() {
        let options: ExportOptions =
            serde_json::from_str(r#"{"format":"stl","bake":"preserved","ascii":true}"#).unwrap();
        assert_eq!(options.format, ExportFormat::Stl);
        assert_eq!(options.bake, BakeMode::Preserved);
        assert!(options.write.ascii);
    }
}
