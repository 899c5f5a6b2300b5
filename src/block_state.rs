use crate::error::{Result, SchematicError};
use quartz_nbt::{NbtCompound, NbtTag};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use std::str::FromStr;

pub const AIR: &str = "minecraft:air";

/// Adds the `minecraft:` namespace to a bare block name.
pub(crate) fn qualified_name(name: &str) -> String {
    if name.contains(':') {
        name.to_string()
    } else {
        format!("minecraft:{}", name)
    }
}

/// A block identifier plus its property map.
///
/// Properties are kept sorted by key, so two states built with the same
/// properties in a different order compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BlockStateRepr")]
pub struct BlockState {
    name: SmolStr,
    properties: Vec<(SmolStr, SmolStr)>,
}

#[derive(Deserialize)]
struct BlockStateRepr {
    name: SmolStr,
    #[serde(default)]
    properties: Vec<(SmolStr, SmolStr)>,
}

impl From<BlockStateRepr> for BlockState {
    fn from(repr: BlockStateRepr) -> Self {
        BlockState::new(repr.name).with_properties(repr.properties)
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.properties.is_empty() {
            write!(f, "[")?;
            for (i, (key, value)) in self.properties.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}={}", key, value)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

impl FromStr for BlockState {
    type Err = SchematicError;

    /// Parses `name` or `name[key=value,...]`. Quotes around values are dropped.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, props) = match s.split_once('[') {
            Some((name, rest)) => {
                let inner = rest.strip_suffix(']').ok_or_else(|| {
                    SchematicError::invalid(format!("Missing closing bracket in '{}'", s))
                })?;
                (name.trim(), Some(inner))
            }
            None => (s, None),
        };
        if name.is_empty() {
            return Err(SchematicError::invalid("Block name is empty"));
        }

        let mut state = BlockState::new(name);
        if let Some(props) = props {
            for prop in props.split(',').filter(|p| !p.trim().is_empty()) {
                let (key, value) = prop.split_once('=').ok_or_else(|| {
                    SchematicError::invalid(format!("Property '{}' has no value", prop.trim()))
                })?;
                let value = value.trim().trim_matches(|c| c == '\'' || c == '"');
                state = state.with_property(key.trim(), value);
            }
        }
        Ok(state)
    }
}

impl BlockState {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        BlockState {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn air() -> Self {
        BlockState::new(AIR)
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn is_air(&self) -> bool {
        self.name == AIR && self.properties.is_empty()
    }

    pub fn properties(&self) -> &[(SmolStr, SmolStr)] {
        &self.properties
    }

    pub fn with_property(mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.properties.binary_search_by(|(k, _)| k.cmp(&key)) {
            Ok(i) => self.properties[i].1 = value,
            Err(i) => self.properties.insert(i, (key, value)),
        }
        self
    }

    /// Replaces the whole property set. Later duplicates win.
    pub fn with_properties<K, V>(mut self, properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<SmolStr>,
        V: Into<SmolStr>,
    {
        self.properties.clear();
        for (k, v) in properties {
            self = self.with_property(k, v);
        }
        self
    }

    pub fn without_property(mut self, key: &str) -> Self {
        self.properties.retain(|(k, _)| k != key);
        self
    }

    pub fn get_property(&self, key: &str) -> Option<&SmolStr> {
        self.properties
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|i| &self.properties[i].1)
    }

    pub fn to_nbt(&self) -> NbtTag {
        let mut compound = NbtCompound::new();
        compound.insert("Name", self.name.to_string());

        if !self.properties.is_empty() {
            let mut properties = NbtCompound::new();
            for (key, value) in &self.properties {
                properties.insert(key.to_string(), value.to_string());
            }
            compound.insert("Properties", properties);
        }

        NbtTag::Compound(compound)
    }

    pub fn from_nbt(compound: &NbtCompound) -> Result<Self> {
        let name = compound
            .get::<_, &String>("Name")
            .map_err(|e| SchematicError::invalid(format!("Failed to get Name: {}", e)))?;

        let mut state = BlockState::new(name.as_str());
        if let Ok(props) = compound.get::<_, &NbtCompound>("Properties") {
            for (key, value) in props.inner() {
                if let NbtTag::String(value_str) = value {
                    state = state.with_property(key.as_str(), value_str.as_str());
                }
            }
        }

        Ok(state)
    }
}
