//! In-memory model of Minecraft schematics.
//!
//! A [`UniversalSchematic`] owns palette-compressed voxel grids ([`Region`]),
//! named [`DefinitionRegion`]s marking logical areas on top of them, and the
//! block entities stored alongside. The [`building`] module paints procedural
//! shapes into a schematic and [`formats`] defines the codec interface.

pub mod block_entity;
pub mod block_position;
pub mod block_state;
pub mod bounding_box;
pub mod building;
pub mod chunk;
pub mod definition_region;
pub mod error;
pub mod formats;
pub mod metadata;
pub mod nbt;
pub mod palette;
pub mod region;
pub mod transforms;
pub mod universal_schematic;

pub use block_entity::BlockEntity;
pub use block_position::BlockPosition;
pub use block_state::BlockState;
pub use bounding_box::BoundingBox;
pub use chunk::{Chunk, ChunkBounds, ChunkLoadingStrategy, ChunkOptions};
pub use definition_region::DefinitionRegion;
pub use error::{Result, SchematicError};
pub use metadata::Metadata;
pub use nbt::NbtValue;
pub use palette::Palette;
pub use region::Region;
pub use transforms::Axis;
pub use universal_schematic::UniversalSchematic;
