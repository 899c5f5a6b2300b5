use crate::error::{Result, SchematicError};
use crate::nbt::{compound_to_map, NbtMap, NbtValue};
use quartz_nbt::{NbtCompound, NbtTag};
use serde::{Deserialize, Serialize};

/// Auxiliary payload attached to a single cell (chest contents, sign text, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockEntity {
    pub id: String,
    pub position: (i32, i32, i32),
    pub nbt: NbtMap,
}

impl BlockEntity {
    pub fn new(id: impl Into<String>, position: (i32, i32, i32)) -> Self {
        BlockEntity {
            id: id.into(),
            position,
            nbt: NbtMap::new(),
        }
    }

    pub fn with_nbt_data(mut self, key: impl Into<String>, value: NbtValue) -> Self {
        self.nbt.insert(key.into(), value);
        self
    }

    pub(crate) fn moved_to(&self, position: (i32, i32, i32)) -> Self {
        let mut moved = self.clone();
        moved.position = position;
        moved
    }

    pub fn to_nbt(&self) -> NbtTag {
        let mut compound = NbtCompound::new();
        compound.insert("Id", NbtTag::String(self.id.clone()));
        compound.insert(
            "Pos",
            NbtTag::IntArray(vec![self.position.0, self.position.1, self.position.2]),
        );
        for (key, value) in &self.nbt {
            compound.insert(key, value.to_tag());
        }
        NbtTag::Compound(compound)
    }

    pub fn from_nbt(nbt: &NbtCompound) -> Result<Self> {
        let id = nbt
            .get::<_, &str>("Id")
            .or_else(|_| nbt.get::<_, &str>("id"))
            .map_err(|e| SchematicError::invalid(format!("Failed to get BlockEntity id: {}", e)))?
            .to_string();

        let pos = nbt
            .get::<_, &[i32]>("Pos")
            .map_err(|e| SchematicError::invalid(format!("Failed to get BlockEntity position: {}", e)))?;
        let position = match pos {
            [x, y, z] => (*x, *y, *z),
            _ => return Err(SchematicError::invalid("BlockEntity position needs three components")),
        };

        let mut data = compound_to_map(nbt);
        for key in ["Id", "id", "Pos"] {
            data.remove(key);
        }

        Ok(BlockEntity {
            id,
            position,
            nbt: data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nbt_roundtrip() {
        let be = BlockEntity::new("minecraft:sign", (1, 64, -3))
            .with_nbt_data("Text1", NbtValue::String("hello".into()))
            .with_nbt_data("GlowingText", NbtValue::Byte(0));
        let NbtTag::Compound(compound) = be.to_nbt() else {
            panic!("expected compound");
        };
        assert_eq!(BlockEntity::from_nbt(&compound).unwrap(), be);
    }

    #[test]
    fn test_missing_position_is_rejected() {
        let mut compound = NbtCompound::new();
        compound.insert("Id", "minecraft:chest");
        assert!(matches!(
            BlockEntity::from_nbt(&compound),
            Err(SchematicError::InvalidArgument(_))
        ));
    }
}
