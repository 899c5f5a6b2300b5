use crate::error::{Result, SchematicError};
use crate::formats::manager::{SchematicExporter, SchematicImporter};
use crate::universal_schematic::UniversalSchematic;
use serde::{Deserialize, Serialize};

const FORMAT_TAG: &str = "nucleation-json";
const VERSION: &str = "1";

/// Self-describing JSON document wrapping the serde form of a schematic.
pub struct JsonFormat;

#[derive(Serialize)]
struct Envelope<'a> {
    format: &'a str,
    version: &'a str,
    schematic: &'a UniversalSchematic,
}

#[derive(Deserialize)]
struct OwnedEnvelope {
    format: String,
    version: String,
    schematic: UniversalSchematic,
}

#[derive(Deserialize)]
struct Header {
    format: String,
}

impl SchematicImporter for JsonFormat {
    fn name(&self) -> String {
        "json".to_string()
    }

    fn detect(&self, data: &[u8]) -> bool {
        let starts_object = data
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|&b| b == b'{');
        starts_object
            && serde_json::from_slice::<Header>(data).is_ok_and(|header| header.format == FORMAT_TAG)
    }

    fn read(&self, data: &[u8]) -> Result<UniversalSchematic> {
        from_json(data)
    }
}

impl SchematicExporter for JsonFormat {
    fn name(&self) -> String {
        "json".to_string()
    }

    fn extensions(&self) -> Vec<String> {
        vec!["json".to_string()]
    }

    fn available_versions(&self) -> Vec<String> {
        vec![VERSION.to_string()]
    }

    fn default_version(&self) -> String {
        VERSION.to_string()
    }

    fn write(&self, schematic: &UniversalSchematic, _version: Option<&str>) -> Result<Vec<u8>> {
        to_json(schematic)
    }
}

pub fn to_json(schematic: &UniversalSchematic) -> Result<Vec<u8>> {
    let envelope = Envelope {
        format: FORMAT_TAG,
        version: VERSION,
        schematic,
    };
    serde_json::to_vec(&envelope)
        .map_err(|e| SchematicError::Internal(format!("Failed to serialize schematic: {}", e)))
}

pub fn from_json(data: &[u8]) -> Result<UniversalSchematic> {
    let envelope: OwnedEnvelope = serde_json::from_slice(data)
        .map_err(|e| SchematicError::invalid(format!("Malformed schematic JSON: {}", e)))?;
    if envelope.format != FORMAT_TAG {
        return Err(SchematicError::Unsupported(format!(
            "Unknown document format '{}'",
            envelope.format
        )));
    }
    if envelope.version != VERSION {
        return Err(SchematicError::Unsupported(format!(
            "Unsupported {} version: {}",
            FORMAT_TAG, envelope.version
        )));
    }

    // Grid caches are not serialized.
    let mut schematic = envelope.schematic;
    schematic.rebuild_caches()?;
    Ok(schematic)
}
