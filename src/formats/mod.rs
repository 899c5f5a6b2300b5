//! Codec interface. Binary schematic formats live outside the core and plug
//! in through [`SchematicImporter`] and [`SchematicExporter`].

pub mod json;
pub mod manager;

pub use json::JsonFormat;
pub use manager::{FormatManager, SchematicExporter, SchematicImporter};
