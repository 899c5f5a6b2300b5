//! Named sets of lattice cells used to mark inputs, outputs and other logical
//! areas of a schematic.
//!
//! A region is stored as disjoint inclusive boxes plus a set of loose cells
//! that no box covers. Set algebra, morphology and connectivity work on that
//! representation directly, so large regions are never enumerated unless an
//! operation has to look at every member cell.

mod algebra;
mod connectivity;

use crate::block_state::qualified_name;
use crate::bounding_box::BoundingBox;
use crate::error::{Result, SchematicError};
use crate::transforms::{self, Axis};
use crate::universal_schematic::UniversalSchematic;
use crate::BlockState;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

type Pos = (i32, i32, i32);

/// Largest member count an operation may enumerate cell by cell.
pub const MAX_ENUMERATION_VOLUME: u64 = 1 << 24;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "DefinitionRegionRepr")]
pub struct DefinitionRegion {
    boxes: Vec<BoundingBox>,
    points: BTreeSet<Pos>,
    pub metadata: HashMap<String, String>,
}

/// Wire shape. Boxes are re-added on load so overlapping input still yields
/// disjoint storage.
#[derive(Deserialize)]
struct DefinitionRegionRepr {
    #[serde(default)]
    boxes: Vec<BoundingBox>,
    #[serde(default)]
    points: Vec<Pos>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl From<DefinitionRegionRepr> for DefinitionRegion {
    fn from(repr: DefinitionRegionRepr) -> Self {
        let mut region = DefinitionRegion::new();
        for b in repr.boxes {
            region.add_bounds(b.min, b.max);
        }
        for (x, y, z) in repr.points {
            region.add_point(x, y, z);
        }
        region.metadata = repr.metadata;
        region
    }
}

impl DefinitionRegion {
    pub fn new() -> Self {
        DefinitionRegion::default()
    }

    pub fn from_bounds(min: Pos, max: Pos) -> Self {
        let mut region = DefinitionRegion::new();
        region.add_bounds(min, max);
        region
    }

    pub fn from_point(x: i32, y: i32, z: i32) -> Self {
        let mut region = DefinitionRegion::new();
        region.add_point(x, y, z);
        region
    }

    /// Builds a canonical region from individual cells. Duplicates are ignored.
    pub fn from_positions(positions: &[Pos]) -> Self {
        let mut region = DefinitionRegion {
            points: positions.iter().copied().collect(),
            ..DefinitionRegion::default()
        };
        region.simplify();
        region
    }

    /// Adds each box in order. Boxes stay as given apart from the parts an
    /// earlier box already covers.
    pub fn from_bounding_boxes(boxes: Vec<(Pos, Pos)>) -> Self {
        let mut region = DefinitionRegion::new();
        for (min, max) in boxes {
            region.add_bounds(min, max);
        }
        region
    }

    /// Adds the box spanned by two corners in any order.
    ///
    /// Only the cells not already covered are stored, and loose cells the box
    /// swallows are dropped, so storage stays disjoint. The result is not
    /// canonicalised; call [`simplify`](Self::simplify) for that.
    pub fn add_bounds(&mut self, min: Pos, max: Pos) -> &mut Self {
        let added = BoundingBox::from_corners(min, max);
        let mut pieces = vec![added];
        for existing in &self.boxes {
            if !existing.intersects(&added) {
                continue;
            }
            pieces = pieces
                .iter()
                .flat_map(|piece| algebra::box_difference(piece, existing))
                .collect();
            if pieces.is_empty() {
                return self;
            }
        }
        self.points.retain(|&p| !added.contains(p));
        self.boxes.extend(pieces);
        self
    }

    pub fn add_point(&mut self, x: i32, y: i32, z: i32) -> &mut Self {
        if !self.contains(x, y, z) {
            self.points.insert((x, y, z));
        }
        self
    }

    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        self.points.contains(&(x, y, z)) || self.boxes.iter().any(|b| b.contains((x, y, z)))
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty() && self.points.is_empty()
    }

    /// Number of member cells.
    pub fn volume(&self) -> u64 {
        self.boxes.iter().map(BoundingBox::volume).sum::<u64>() + self.points.len() as u64
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        let from_boxes = self.boxes.iter().copied().reduce(|acc, b| acc.union(&b));
        self.points.iter().fold(from_boxes, |acc, &p| match acc {
            Some(mut b) => {
                b.include(p);
                Some(b)
            }
            None => Some(BoundingBox::point(p)),
        })
    }

    /// Size of the bounding box, `(0, 0, 0)` when empty.
    pub fn dimensions(&self) -> Pos {
        self.bounds().map_or((0, 0, 0), |b| b.get_dimensions())
    }

    /// Floor of the bounding box midpoint.
    pub fn center(&self) -> Option<Pos> {
        let mid = |lo: i32, hi: i32| (lo as i64 + hi as i64).div_euclid(2) as i32;
        self.bounds().map(|b| {
            (
                mid(b.min.0, b.max.0),
                mid(b.min.1, b.max.1),
                mid(b.min.2, b.max.2),
            )
        })
    }

    /// Centre of the covered volume in continuous space, where cell `x` spans `[x, x + 1)`.
    pub fn center_f32(&self) -> Option<(f32, f32, f32)> {
        self.bounds().map(|b| {
            (
                (b.min.0 as f32 + b.max.0 as f32 + 1.0) / 2.0,
                (b.min.1 as f32 + b.max.1 as f32 + 1.0) / 2.0,
                (b.min.2 as f32 + b.max.2 as f32 + 1.0) / 2.0,
            )
        })
    }

    /// Every member, boxes first. Order across boxes is unspecified.
    pub fn iter_positions(&self) -> impl Iterator<Item = Pos> + '_ {
        self.boxes
            .iter()
            .flat_map(BoundingBox::iter_points)
            .chain(self.points.iter().copied())
    }

    pub fn positions(&self) -> Vec<Pos> {
        self.iter_positions().collect()
    }

    /// Every member in canonical order: x fastest, then y, then z.
    pub fn positions_sorted(&self) -> Vec<Pos> {
        let mut positions = self.positions();
        positions.sort_unstable_by_key(|&(x, y, z)| (z, y, x));
        positions
    }

    pub fn intersects_bounds(&self, min: Pos, max: Pos) -> bool {
        let query = BoundingBox::from_corners(min, max);
        self.boxes.iter().any(|b| b.intersects(&query))
            || self.points.iter().any(|&p| query.contains(p))
    }

    /// Number of stored boxes, loose cells counted as unit boxes.
    pub fn box_count(&self) -> usize {
        self.boxes.len() + self.points.len()
    }

    pub fn get_box(&self, index: usize) -> Option<(Pos, Pos)> {
        match self.boxes.get(index) {
            Some(b) => Some((b.min, b.max)),
            None => self.points.iter().nth(index - self.boxes.len()).map(|&p| (p, p)),
        }
    }

    pub fn get_boxes(&self) -> Vec<(Pos, Pos)> {
        self.as_boxes().into_iter().map(|b| (b.min, b.max)).collect()
    }

    /// Stored boxes, without the loose cells.
    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    /// Loose cells not covered by any box.
    pub fn points(&self) -> &BTreeSet<Pos> {
        &self.points
    }

    pub fn with_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn get_metadata(&self, key: &str) -> Option<&String> {
        self.metadata.get(key)
    }

    pub fn metadata_keys(&self) -> Vec<&String> {
        let mut keys: Vec<&String> = self.metadata.keys().collect();
        keys.sort();
        keys
    }

    /// Stores `color` as `#rrggbb` under the `color` key.
    pub fn set_color(&mut self, color: u32) -> &mut Self {
        self.with_metadata("color", format!("#{:06x}", color & 0x00ff_ffff))
    }

    /// Translates every member. A member that would leave the `i32` range
    /// fails the whole shift and leaves the region untouched.
    pub fn shift(&mut self, dx: i32, dy: i32, dz: i32) -> Result<()> {
        let out_of_range = || {
            SchematicError::invalid(format!(
                "Shifting by ({}, {}, {}) moves the region out of the coordinate range",
                dx, dy, dz
            ))
        };
        let boxes = self
            .boxes
            .iter()
            .map(|b| b.shifted(dx, dy, dz).ok_or_else(out_of_range))
            .collect::<Result<Vec<_>>>()?;
        let points = self
            .points
            .iter()
            .map(|&p| {
                BoundingBox::point(p)
                    .shifted(dx, dy, dz)
                    .map(|b| b.min)
                    .ok_or_else(out_of_range)
            })
            .collect::<Result<BTreeSet<_>>>()?;
        self.boxes = boxes;
        self.points = points;
        self.simplify();
        Ok(())
    }

    pub fn shifted(&self, dx: i32, dy: i32, dz: i32) -> Result<DefinitionRegion> {
        let mut result = self.clone();
        result.shift(dx, dy, dz)?;
        Ok(result)
    }

    /// Mirror image within the region's own bounding box.
    pub fn flipped(&self, axis: Axis) -> DefinitionRegion {
        let Some(pivot) = self.bounds() else {
            return self.clone();
        };
        self.remapped(|b| {
            BoundingBox::from_corners(
                transforms::flip_point(axis, b.min, &pivot),
                transforms::flip_point(axis, b.max, &pivot),
            )
        })
    }

    /// Footprint after `degrees` about `axis`, keeping the bounding box min corner.
    pub fn rotated(&self, axis: Axis, degrees: i32) -> Result<DefinitionRegion> {
        let turns = transforms::quarter_turns(degrees)?;
        let Some(pivot) = self.bounds() else {
            return Ok(self.clone());
        };
        if transforms::rotated_box(axis, turns, &pivot).is_none() {
            return Err(SchematicError::invalid(format!(
                "Rotating {:?} about {} leaves the coordinate range",
                pivot, axis
            )));
        }
        Ok(self.remapped(|b| {
            BoundingBox::from_corners(
                transforms::rotate_point(axis, turns, b.min, &pivot),
                transforms::rotate_point(axis, turns, b.max, &pivot),
            )
        }))
    }

    fn remapped(&self, map_box: impl Fn(&BoundingBox) -> BoundingBox) -> DefinitionRegion {
        let mut result = DefinitionRegion {
            boxes: self.as_boxes().iter().map(map_box).collect(),
            points: BTreeSet::new(),
            metadata: self.metadata.clone(),
        };
        result.simplify();
        result
    }

    fn check_enumerable(&self) -> Result<()> {
        let volume = self.volume();
        if volume > MAX_ENUMERATION_VOLUME {
            return Err(SchematicError::invalid(format!(
                "Region of {} cells exceeds the enumeration limit of {}",
                volume, MAX_ENUMERATION_VOLUME
            )));
        }
        Ok(())
    }

    /// Members whose block in the schematic satisfies `predicate`.
    pub fn filter_by<F>(&self, schematic: &UniversalSchematic, predicate: F) -> Result<DefinitionRegion>
    where
        F: Fn(&BlockState) -> bool,
    {
        self.check_enumerable()?;
        let positions: Vec<Pos> = self
            .iter_positions()
            .filter(|&(x, y, z)| schematic.get_block(x, y, z).map_or(false, &predicate))
            .collect();
        let mut result = DefinitionRegion::from_positions(&positions);
        result.metadata = self.metadata.clone();
        Ok(result)
    }

    /// Members holding exactly `name`. A bare name is read as `minecraft:<name>`.
    pub fn filter_by_block(&self, schematic: &UniversalSchematic, name: &str) -> Result<DefinitionRegion> {
        let name = qualified_name(name);
        self.filter_by(schematic, |block| block.name() == name)
    }

    /// Members not holding `name`.
    pub fn exclude_block(&self, schematic: &UniversalSchematic, name: &str) -> Result<DefinitionRegion> {
        let matching = self.filter_by_block(schematic, name)?;
        Ok(self.subtract(&matching))
    }

    /// Members whose block carries every listed property value.
    pub fn filter_by_properties(
        &self,
        schematic: &UniversalSchematic,
        properties: &HashMap<String, String>,
    ) -> Result<DefinitionRegion> {
        self.filter_by(schematic, |block| {
            properties
                .iter()
                .all(|(key, value)| block.get_property(key).map_or(false, |v| v.as_str() == value.as_str()))
        })
    }

    /// Registers this region in `schematic` under `name`.
    ///
    /// Registering the same membership again is a no-op. A different region
    /// already stored under `name` is a `NameCollision`.
    pub fn sync(&self, schematic: &mut UniversalSchematic, name: &str) -> Result<()> {
        let existing = schematic
            .get_definition_region(name)
            .ok()
            .map(|stored| stored.same_members(self));
        match existing {
            Some(true) => Ok(()),
            Some(false) => Err(SchematicError::collision(format!(
                "Definition region '{}' already holds different cells",
                name
            ))),
            None => schematic.add_definition_region(name, self.clone()),
        }
    }

    /// Stores this region under `name`, replacing whatever was there.
    pub fn sync_update(&self, schematic: &mut UniversalSchematic, name: &str) {
        schematic.update_definition_region(name, self.clone());
    }

    pub fn fetch(schematic: &UniversalSchematic, name: &str) -> Result<DefinitionRegion> {
        schematic.get_definition_region(name).cloned()
    }
}
