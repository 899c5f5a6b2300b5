use crate::error::{Result, SchematicError};
use crate::universal_schematic::UniversalSchematic;
use tracing::debug;

pub trait SchematicImporter: Send + Sync {
    fn name(&self) -> String;
    fn detect(&self, data: &[u8]) -> bool;
    fn read(&self, data: &[u8]) -> Result<UniversalSchematic>;
}

pub trait SchematicExporter: Send + Sync {
    fn name(&self) -> String;
    fn extensions(&self) -> Vec<String>;
    fn available_versions(&self) -> Vec<String>;
    fn default_version(&self) -> String;
    /// `version` has already been checked against `available_versions`;
    /// `None` means the default.
    fn write(&self, schematic: &UniversalSchematic, version: Option<&str>) -> Result<Vec<u8>>;
}

/// Registry of codecs. Importers are tried in registration order.
#[derive(Default)]
pub struct FormatManager {
    importers: Vec<Box<dyn SchematicImporter>>,
    exporters: Vec<Box<dyn SchematicExporter>>,
}

impl FormatManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// A manager with the built-in JSON codec registered.
    pub fn with_defaults() -> Self {
        let mut manager = Self::new();
        manager.register_importer(crate::formats::json::JsonFormat);
        manager.register_exporter(crate::formats::json::JsonFormat);
        manager
    }

    pub fn register_importer<I: SchematicImporter + 'static>(&mut self, importer: I) {
        self.importers.push(Box::new(importer));
    }

    pub fn register_exporter<E: SchematicExporter + 'static>(&mut self, exporter: E) {
        self.exporters.push(Box::new(exporter));
    }

    pub fn detect_format(&self, data: &[u8]) -> Option<String> {
        self.importers
            .iter()
            .find(|importer| importer.detect(data))
            .map(|importer| importer.name())
    }

    pub fn decode(&self, data: &[u8]) -> Result<UniversalSchematic> {
        let importer = self
            .importers
            .iter()
            .find(|importer| importer.detect(data))
            .ok_or_else(|| {
                SchematicError::Unsupported("Unknown or unsupported schematic format".to_string())
            })?;
        debug!("decoding {} bytes with importer '{}'", data.len(), importer.name());
        importer.read(data)
    }

    pub fn encode(
        &self,
        schematic: &UniversalSchematic,
        format: &str,
        version: Option<&str>,
    ) -> Result<Vec<u8>> {
        let exporter = self
            .find_exporter(format)
            .ok_or_else(|| SchematicError::invalid(format!("Unsupported export format: {}", format)))?;
        Self::write_with(exporter, schematic, version)
    }

    /// Picks the exporter by the extension of `path`.
    pub fn encode_for_path(
        &self,
        schematic: &UniversalSchematic,
        path: &str,
        version: Option<&str>,
    ) -> Result<Vec<u8>> {
        let extension = std::path::Path::new(path)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        let exporter = self
            .exporters
            .iter()
            .find(|exporter| exporter.extensions().contains(&extension))
            .ok_or_else(|| {
                SchematicError::invalid(format!(
                    "Could not determine format from extension: .{}",
                    extension
                ))
            })?;
        Self::write_with(exporter.as_ref(), schematic, version)
    }

    pub fn list_importers(&self) -> Vec<String> {
        self.importers.iter().map(|i| i.name()).collect()
    }

    pub fn list_exporters(&self) -> Vec<String> {
        self.exporters.iter().map(|e| e.name()).collect()
    }

    pub fn get_exporter_versions(&self, format: &str) -> Option<Vec<String>> {
        self.find_exporter(format).map(|e| e.available_versions())
    }

    pub fn get_exporter_default_version(&self, format: &str) -> Option<String> {
        self.find_exporter(format).map(|e| e.default_version())
    }

    fn find_exporter(&self, format: &str) -> Option<&dyn SchematicExporter> {
        self.exporters
            .iter()
            .find(|exporter| exporter.name().eq_ignore_ascii_case(format))
            .map(|exporter| exporter.as_ref())
    }

    fn write_with(
        exporter: &dyn SchematicExporter,
        schematic: &UniversalSchematic,
        version: Option<&str>,
    ) -> Result<Vec<u8>> {
        if let Some(version) = version {
            if !exporter.available_versions().iter().any(|v| v == version) {
                return Err(SchematicError::invalid(format!(
                    "{} does not support version '{}'",
                    exporter.name(),
                    version
                )));
            }
        }
        debug!(
            "encoding {:?} with exporter '{}' version {:?}",
            schematic.metadata.name,
            exporter.name(),
            version
        );
        exporter.write(schematic, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MagicImporter;

    impl SchematicImporter for MagicImporter {
        fn name(&self) -> String {
            "magic".to_string()
        }

        fn detect(&self, data: &[u8]) -> bool {
            data.starts_with(b"MAGIC")
        }

        fn read(&self, _data: &[u8]) -> Result<UniversalSchematic> {
            Ok(UniversalSchematic::new("magic"))
        }
    }

    #[test]
    fn test_registration_and_detection() {
        let mut manager = FormatManager::with_defaults();
        manager.register_importer(MagicImporter);
        assert_eq!(manager.list_importers(), vec!["json", "magic"]);
        assert_eq!(manager.list_exporters(), vec!["json"]);
        assert_eq!(manager.detect_format(b"MAGIC..."), Some("magic".to_string()));
        assert_eq!(manager.detect_format(b"\x00\x01"), None);
        assert_eq!(manager.decode(b"MAGIC").unwrap().metadata.name.as_deref(), Some("magic"));
    }

    #[test]
    fn test_unknown_input_is_unsupported() {
        let manager = FormatManager::with_defaults();
        assert!(matches!(
            manager.decode(b"not a schematic"),
            Err(SchematicError::Unsupported(_))
        ));
    }

    #[test]
    fn test_encode_rejects_unknown_format_and_version() {
        let manager = FormatManager::with_defaults();
        let schematic = UniversalSchematic::new("s");
        assert!(matches!(
            manager.encode(&schematic, "litematic", None),
            Err(SchematicError::InvalidArgument(_))
        ));
        assert!(matches!(
            manager.encode(&schematic, "json", Some("7")),
            Err(SchematicError::InvalidArgument(_))
        ));
        assert!(manager.encode(&schematic, "JSON", Some("1")).is_ok());
        assert!(manager.encode_for_path(&schematic, "out/build.json", None).is_ok());
        assert!(manager.encode_for_path(&schematic, "out/build.nbt", None).is_err());
        assert_eq!(manager.get_exporter_default_version("json"), Some("1".to_string()));
    }
}
