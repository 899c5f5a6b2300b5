use crate::error::{Result, SchematicError};
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Typed property tree used for block entity payloads.
///
/// Text encodings (JSON, SNBT) only appear at the edges through
/// [`NbtValue::to_json`] / [`NbtValue::from_json`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NbtValue {
    String(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Byte(i8),
    Short(i16),
    Boolean(bool),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    ByteArray(Vec<i8>),
    List(Vec<NbtValue>),
    Compound(HashMap<String, NbtValue>),
}

pub type NbtMap = HashMap<String, NbtValue>;

impl NbtValue {
    pub fn from_tag(tag: &NbtTag) -> NbtValue {
        match tag {
            NbtTag::String(s) => NbtValue::String(s.clone()),
            NbtTag::Int(i) => NbtValue::Int(*i),
            NbtTag::Long(l) => NbtValue::Long(*l),
            NbtTag::Float(f) => NbtValue::Float(*f),
            NbtTag::Double(d) => NbtValue::Double(*d),
            NbtTag::Byte(b) => NbtValue::Byte(*b),
            NbtTag::Short(s) => NbtValue::Short(*s),
            NbtTag::IntArray(arr) => NbtValue::IntArray(arr.clone()),
            NbtTag::LongArray(arr) => NbtValue::LongArray(arr.clone()),
            NbtTag::ByteArray(arr) => NbtValue::ByteArray(arr.clone()),
            NbtTag::List(list) => NbtValue::List(list.iter().map(NbtValue::from_tag).collect()),
            NbtTag::Compound(compound) => NbtValue::Compound(
                compound
                    .inner()
                    .iter()
                    .map(|(k, v)| (k.clone(), NbtValue::from_tag(v)))
                    .collect(),
            ),
        }
    }

    pub fn to_tag(&self) -> NbtTag {
        match self {
            NbtValue::String(s) => NbtTag::String(s.clone()),
            NbtValue::Int(i) => NbtTag::Int(*i),
            NbtValue::Long(l) => NbtTag::Long(*l),
            NbtValue::Float(f) => NbtTag::Float(*f),
            NbtValue::Double(d) => NbtTag::Double(*d),
            NbtValue::Byte(b) => NbtTag::Byte(*b),
            NbtValue::Short(s) => NbtTag::Short(*s),
            NbtValue::Boolean(b) => NbtTag::Byte(if *b { 1 } else { 0 }),
            NbtValue::IntArray(arr) => NbtTag::IntArray(arr.clone()),
            NbtValue::LongArray(arr) => NbtTag::LongArray(arr.clone()),
            NbtValue::ByteArray(arr) => NbtTag::ByteArray(arr.clone()),
            NbtValue::List(list) => {
                let tags: Vec<NbtTag> = list.iter().map(NbtValue::to_tag).collect();
                NbtTag::List(NbtList::from(tags))
            }
            NbtValue::Compound(map) => NbtTag::Compound(map_to_compound(map)),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            NbtValue::String(s) => Value::String(s.clone()),
            NbtValue::Int(i) => Value::from(*i),
            NbtValue::Long(l) => Value::from(*l),
            NbtValue::Float(f) => Value::from(*f as f64),
            NbtValue::Double(d) => Value::from(*d),
            NbtValue::Byte(b) => Value::from(*b),
            NbtValue::Short(s) => Value::from(*s),
            NbtValue::Boolean(b) => Value::Bool(*b),
            NbtValue::IntArray(arr) => Value::from(arr.clone()),
            NbtValue::LongArray(arr) => Value::from(arr.clone()),
            NbtValue::ByteArray(arr) => Value::Array(arr.iter().map(|b| Value::from(*b)).collect()),
            NbtValue::List(list) => Value::Array(list.iter().map(NbtValue::to_json).collect()),
            NbtValue::Compound(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Integers become `Int` when they fit, `Long` otherwise; other numbers become `Double`.
    pub fn from_json(value: &serde_json::Value) -> Result<NbtValue> {
        use serde_json::Value;
        Ok(match value {
            Value::Null => return Err(SchematicError::invalid("null has no NBT representation")),
            Value::Bool(b) => NbtValue::Boolean(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(small) => NbtValue::Int(small),
                        Err(_) => NbtValue::Long(i),
                    }
                } else if let Some(f) = n.as_f64() {
                    NbtValue::Double(f)
                } else {
                    return Err(SchematicError::invalid(format!(
                        "Number {} is out of NBT range",
                        n
                    )));
                }
            }
            Value::String(s) => NbtValue::String(s.clone()),
            Value::Array(items) => NbtValue::List(
                items
                    .iter()
                    .map(NbtValue::from_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Object(map) => NbtValue::Compound(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), NbtValue::from_json(v)?)))
                    .collect::<Result<HashMap<_, _>>>()?,
            ),
        })
    }
}

pub(crate) fn map_to_compound(map: &NbtMap) -> NbtCompound {
    let mut compound = NbtCompound::new();
    for (key, value) in map {
        compound.insert(key, value.to_tag());
    }
    compound
}

pub(crate) fn compound_to_map(compound: &NbtCompound) -> NbtMap {
    compound
        .inner()
        .iter()
        .map(|(k, v)| (k.clone(), NbtValue::from_tag(v)))
        .collect()
}
