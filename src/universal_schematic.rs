use crate::block_entity::BlockEntity;
use crate::block_position::BlockPosition;
use crate::block_state::qualified_name;
use crate::bounding_box::BoundingBox;
use crate::chunk::{Chunk, ChunkOptions};
use crate::definition_region::DefinitionRegion;
use crate::error::{Result, SchematicError};
use crate::metadata::Metadata;
use crate::palette::Palette;
use crate::region::{self, Region};
use crate::transforms::Axis;
use crate::BlockState;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

type Pos = (i32, i32, i32);

pub const DEFAULT_REGION_NAME: &str = "Main";

/// A schematic: a default grid, any number of named format regions, and the
/// named definition regions that mark logical areas on top of them.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UniversalSchematic {
    pub metadata: Metadata,
    pub default_region: Region,
    pub other_regions: HashMap<String, Region>,
    pub default_region_name: String,
    #[serde(default)]
    pub definition_regions: HashMap<String, DefinitionRegion>,
}

impl UniversalSchematic {
    pub fn new(name: impl Into<String>) -> Self {
        UniversalSchematic {
            metadata: Metadata::new(name),
            default_region: Region::new(DEFAULT_REGION_NAME, (0, 0, 0), (1, 1, 1)),
            other_regions: HashMap::new(),
            default_region_name: DEFAULT_REGION_NAME.to_string(),
            definition_regions: HashMap::new(),
        }
    }

    /// Restores derived grid state after deserialization.
    pub fn rebuild_caches(&mut self) -> Result<()> {
        self.default_region.rebuild_caches()?;
        for region in self.other_regions.values_mut() {
            region.rebuild_caches()?;
        }
        Ok(())
    }

    /// Moves a never-written 1x1x1 default grid onto `p`, so the first block
    /// does not force the allocation to span back to the origin. Returns the
    /// replaced grid; unaddressable positions leave the grid where it is.
    fn anchor_default_region(&mut self, p: Pos) -> Option<Region> {
        let current = &self.default_region;
        if current.allocated_dimensions() != (1, 1, 1)
            || !current.is_empty()
            || !current.block_entities().is_empty()
            || current.is_in_region(p.0, p.1, p.2)
            || region::check_coordinates(p).is_err()
        {
            return None;
        }
        let anchored = Region::new(self.default_region_name.clone(), p, (1, 1, 1));
        Some(std::mem::replace(&mut self.default_region, anchored))
    }

    /// Runs a write on the default grid anchored at `p`, restoring the old
    /// anchor if the write fails.
    fn write_anchored<T>(&mut self, p: Pos, write: impl FnOnce(&mut Region) -> Result<T>) -> Result<T> {
        let previous = self.anchor_default_region(p);
        let result = write(&mut self.default_region);
        if let (Err(_), Some(previous)) = (&result, previous) {
            self.default_region = previous;
        }
        result
    }

    /// Every region, default first, the others by name.
    fn regions(&self) -> impl Iterator<Item = &Region> + '_ {
        let mut others: Vec<&Region> = self.other_regions.values().collect();
        others.sort_by(|a, b| a.name.cmp(&b.name));
        std::iter::once(&self.default_region).chain(others)
    }

    /// The block at a position, looking in the default grid first. `None` when
    /// no grid allocates the position.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Option<&BlockState> {
        if self.default_region.is_in_region(x, y, z) {
            return Some(self.default_region.get_block(x, y, z));
        }
        if self.other_regions.is_empty() {
            return None;
        }
        self.regions()
            .find(|region| region.is_in_region(x, y, z))
            .map(|region| region.get_block(x, y, z))
    }

    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: &BlockState) -> Result<()> {
        self.write_anchored((x, y, z), |region| region.set_block(x, y, z, block))
    }

    /// Parses `name[key=value,...]` and writes the result.
    pub fn set_block_str(&mut self, x: i32, y: i32, z: i32, block: &str) -> Result<()> {
        let state: BlockState = block.parse()?;
        self.set_block(x, y, z, &state)
    }

    pub fn set_block_in_region(
        &mut self,
        region_name: &str,
        x: i32,
        y: i32,
        z: i32,
        block: &BlockState,
    ) -> Result<()> {
        self.get_region_mut(region_name)?.set_block(x, y, z, block)
    }

    pub fn get_block_from_region(&self, region_name: &str, x: i32, y: i32, z: i32) -> Result<&BlockState> {
        Ok(self.get_region(region_name)?.get_block(x, y, z))
    }

    pub fn ensure_bounds(&mut self, min: Pos, max: Pos) -> Result<()> {
        let bounds = BoundingBox::from_corners(min, max);
        self.write_anchored(bounds.min, |region| region.ensure_bounds(bounds.min, bounds.max))
    }

    pub fn fill_cuboid(&mut self, min: Pos, max: Pos, block: &BlockState) -> Result<()> {
        let bounds = BoundingBox::from_corners(min, max);
        self.write_anchored(bounds.min, |region| region.fill_cuboid(bounds.min, bounds.max, block))
    }

    pub fn fill_sphere(&mut self, center: Pos, radius: f64, block: &BlockState) -> Result<()> {
        self.write_anchored(center, |region| region.fill_sphere(center, radius, block))
    }

    /// Non-air blocks of every region: the default grid first, then the others by name.
    pub fn iter_blocks(&self) -> impl Iterator<Item = (BlockPosition, &BlockState)> + '_ {
        self.regions().flat_map(|region| region.iter_blocks())
    }

    /// Adds a format region under its own name.
    pub fn add_region(&mut self, region: Region) -> Result<()> {
        if region.name == self.default_region_name || self.other_regions.contains_key(&region.name) {
            return Err(SchematicError::collision(format!(
                "Region '{}' already exists",
                region.name
            )));
        }
        self.other_regions.insert(region.name.clone(), region);
        Ok(())
    }

    pub fn remove_region(&mut self, name: &str) -> Result<Region> {
        self.other_regions
            .remove(name)
            .ok_or_else(|| SchematicError::not_found(format!("Region '{}'", name)))
    }

    /// Looks up a region by name. The default grid answers to its own name.
    pub fn get_region(&self, name: &str) -> Result<&Region> {
        if name == self.default_region_name {
            return Ok(&self.default_region);
        }
        self.other_regions
            .get(name)
            .ok_or_else(|| SchematicError::not_found(format!("Region '{}'", name)))
    }

    pub fn get_region_mut(&mut self, name: &str) -> Result<&mut Region> {
        if name == self.default_region_name {
            return Ok(&mut self.default_region);
        }
        self.other_regions
            .get_mut(name)
            .ok_or_else(|| SchematicError::not_found(format!("Region '{}'", name)))
    }

    /// Default grid name first, then the other regions sorted.
    pub fn region_names(&self) -> Vec<String> {
        self.regions().map(|region| region.name.clone()).collect()
    }

    /// Union of the non-air extent of every region.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.regions()
            .filter_map(Region::tight_bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    /// Size of [`bounding_box`](Self::bounding_box), `(0, 0, 0)` when empty.
    pub fn dimensions(&self) -> Pos {
        self.bounding_box()
            .map_or((0, 0, 0), |b| b.get_dimensions())
    }

    pub fn allocated_dimensions(&self) -> Pos {
        self.default_region.allocated_dimensions()
    }

    pub fn tight_bounds(&self) -> Option<BoundingBox> {
        self.default_region.tight_bounds()
    }

    pub fn region_tight_bounds(&self, name: &str) -> Result<Option<BoundingBox>> {
        Ok(self.get_region(name)?.tight_bounds())
    }

    /// Non-air blocks across every region.
    pub fn block_count(&self) -> usize {
        self.regions().map(Region::count_non_air_blocks).sum()
    }

    pub fn count_block_types(&self) -> HashMap<BlockState, usize> {
        let mut counts: HashMap<BlockState, usize> = HashMap::new();
        for region in self.regions() {
            for (state, count) in region.count_block_types() {
                *counts.entry(state).or_insert(0) += count;
            }
        }
        counts
    }

    pub fn palette(&self) -> &Palette {
        self.default_region.palette()
    }

    /// Palette of a named region. `"default"` and `"Default"` name the default grid.
    pub fn region_palette(&self, name: &str) -> Result<&Palette> {
        match name {
            "default" | "Default" => Ok(self.default_region.palette()),
            _ => self.get_region(name).map(|region| region.palette()),
        }
    }

    pub fn all_palettes(&self) -> Vec<(&str, &Palette)> {
        self.regions()
            .map(|region| (region.name.as_str(), region.palette()))
            .collect()
    }

    pub fn set_block_entity(&mut self, block_entity: BlockEntity) -> Result<()> {
        self.default_region.set_block_entity(block_entity)
    }

    pub fn get_block_entity(&self, position: Pos) -> Option<&BlockEntity> {
        self.default_region.get_block_entity(position)
    }

    pub fn remove_block_entity(&mut self, position: Pos) -> Option<BlockEntity> {
        self.default_region.remove_block_entity(position)
    }

    /// Block entities of every region.
    pub fn block_entities(&self) -> Vec<&BlockEntity> {
        self.regions().flat_map(Region::block_entities).collect()
    }

    pub fn flip(&mut self, axis: Axis) {
        self.default_region.flip(axis);
    }

    pub fn rotate(&mut self, axis: Axis, degrees: i32) -> Result<()> {
        self.default_region.rotate(axis, degrees)
    }

    pub fn flip_region(&mut self, name: &str, axis: Axis) -> Result<()> {
        self.get_region_mut(name)?.flip(axis);
        Ok(())
    }

    pub fn rotate_region(&mut self, name: &str, axis: Axis, degrees: i32) -> Result<()> {
        self.get_region_mut(name)?.rotate(axis, degrees)
    }

    pub fn create_definition_region(&mut self, name: &str) -> Result<()> {
        self.add_definition_region(name, DefinitionRegion::new())
    }

    pub fn create_definition_region_from_bounds(&mut self, name: &str, min: Pos, max: Pos) -> Result<()> {
        self.add_definition_region(name, DefinitionRegion::from_bounds(min, max))
    }

    pub fn create_definition_region_from_point(&mut self, name: &str, x: i32, y: i32, z: i32) -> Result<()> {
        self.add_definition_region(name, DefinitionRegion::from_point(x, y, z))
    }

    pub fn add_definition_region(&mut self, name: &str, region: DefinitionRegion) -> Result<()> {
        if self.definition_regions.contains_key(name) {
            return Err(SchematicError::collision(format!(
                "Definition region '{}' already exists",
                name
            )));
        }
        self.definition_regions.insert(name.to_string(), region);
        Ok(())
    }

    /// Stores `region` under `name`, replacing any previous entry.
    pub fn update_definition_region(&mut self, name: &str, region: DefinitionRegion) {
        self.definition_regions.insert(name.to_string(), region);
    }

    pub fn get_definition_region(&self, name: &str) -> Result<&DefinitionRegion> {
        self.definition_regions
            .get(name)
            .ok_or_else(|| SchematicError::not_found(format!("Definition region '{}'", name)))
    }

    pub fn get_definition_region_mut(&mut self, name: &str) -> Result<&mut DefinitionRegion> {
        self.definition_regions
            .get_mut(name)
            .ok_or_else(|| SchematicError::not_found(format!("Definition region '{}'", name)))
    }

    pub fn remove_definition_region(&mut self, name: &str) -> Result<DefinitionRegion> {
        self.definition_regions
            .remove(name)
            .ok_or_else(|| SchematicError::not_found(format!("Definition region '{}'", name)))
    }

    pub fn definition_region_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.definition_regions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn definition_region_add_bounds(&mut self, name: &str, min: Pos, max: Pos) -> Result<()> {
        self.get_definition_region_mut(name)?.add_bounds(min, max);
        Ok(())
    }

    pub fn definition_region_add_point(&mut self, name: &str, x: i32, y: i32, z: i32) -> Result<()> {
        self.get_definition_region_mut(name)?.add_point(x, y, z);
        Ok(())
    }

    pub fn definition_region_set_metadata(
        &mut self,
        name: &str,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.get_definition_region_mut(name)?.set_metadata(key, value);
        Ok(())
    }

    pub fn definition_region_shift(&mut self, name: &str, dx: i32, dy: i32, dz: i32) -> Result<()> {
        self.get_definition_region_mut(name)?.shift(dx, dy, dz)
    }

    /// Writes `block` into every member cell of a definition region.
    pub fn fill_definition_region(&mut self, name: &str, block: &BlockState) -> Result<()> {
        let region = self.get_definition_region(name)?;
        let Some(bounds) = region.bounds() else {
            return Ok(());
        };
        let boxes = region.get_boxes();
        self.ensure_bounds(bounds.min, bounds.max)?;
        for (min, max) in boxes {
            self.default_region.fill_cuboid(min, max, block)?;
        }
        Ok(())
    }

    /// Mirrors the cells of a definition region in the default grid and stores
    /// the mirrored footprint under the same name.
    pub fn flip_definition_region(&mut self, name: &str, axis: Axis) -> Result<()> {
        let scope = self.get_definition_region(name)?.clone();
        self.default_region.flip_within(&scope, axis)?;
        self.update_definition_region(name, scope.flipped(axis));
        Ok(())
    }

    /// Rotates the cells of a definition region in the default grid and stores
    /// the rotated footprint under the same name.
    pub fn rotate_definition_region(&mut self, name: &str, axis: Axis, degrees: i32) -> Result<()> {
        let scope = self.get_definition_region(name)?.clone();
        let footprint = scope.rotated(axis, degrees)?;
        self.default_region.rotate_within(&scope, axis, degrees)?;
        self.update_definition_region(name, footprint);
        Ok(())
    }

    /// Writes pre-read cells into the default grid. The grid is grown to
    /// `target_bounds` before any cell changes.
    fn write_cells(
        &mut self,
        target_bounds: BoundingBox,
        cells: Vec<(Pos, BlockState, Option<BlockEntity>)>,
    ) -> Result<()> {
        self.ensure_bounds(target_bounds.min, target_bounds.max)?;
        debug!(
            cells = cells.len(),
            target = ?target_bounds,
            "Copying cells into default region"
        );
        for ((x, y, z), state, entity) in cells {
            self.default_region.set_block(x, y, z, &state)?;
            self.default_region.remove_block_entity((x, y, z));
            if let Some(entity) = entity {
                self.default_region.set_block_entity(entity)?;
            }
        }
        Ok(())
    }

    /// Reads every cell of `bounds` from `source`, translated so `bounds.min`
    /// lands on `target`. Cells holding an excluded block name are left out.
    fn read_cells(
        source: &UniversalSchematic,
        bounds: &BoundingBox,
        target: Pos,
        excluded: &[&str],
    ) -> Result<(BoundingBox, Vec<(Pos, BlockState, Option<BlockEntity>)>)> {
        let offset = (
            target.0 as i64 - bounds.min.0 as i64,
            target.1 as i64 - bounds.min.1 as i64,
            target.2 as i64 - bounds.min.2 as i64,
        );
        let translate = |(x, y, z): Pos| -> Result<Pos> {
            let moved = (x as i64 + offset.0, y as i64 + offset.1, z as i64 + offset.2);
            match (
                i32::try_from(moved.0),
                i32::try_from(moved.1),
                i32::try_from(moved.2),
            ) {
                (Ok(x), Ok(y), Ok(z)) => Ok((x, y, z)),
                _ => Err(SchematicError::invalid(format!(
                    "Copy target {:?} is out of range",
                    moved
                ))),
            }
        };
        let target_bounds = BoundingBox::new(translate(bounds.min)?, translate(bounds.max)?);

        let excluded: HashSet<String> = excluded.iter().map(|name| qualified_name(name)).collect();
        let air = BlockState::air();
        let mut cells = Vec::new();
        for p in bounds.iter_points() {
            let state = source.get_block(p.0, p.1, p.2).unwrap_or(&air);
            if excluded.contains(state.name()) {
                continue;
            }
            let dest = translate(p)?;
            let entity = source
                .get_block_entity(p)
                .map(|be| be.moved_to(dest));
            cells.push((dest, state.clone(), entity));
        }
        Ok((target_bounds, cells))
    }

    /// Copies every cell of `bounds` in `from`, air included, so that
    /// `bounds.min` lands on `target` in this schematic's default grid.
    ///
    /// Source cells whose block name is in `excluded` are skipped and the
    /// destination keeps its block there. Block entities travel with their cells.
    pub fn copy_region(
        &mut self,
        from: &UniversalSchematic,
        bounds: &BoundingBox,
        target: Pos,
        excluded: &[&str],
    ) -> Result<()> {
        let (target_bounds, cells) = Self::read_cells(from, bounds, target, excluded)?;
        self.write_cells(target_bounds, cells)
    }

    /// [`copy_region`](Self::copy_region) with this schematic as the source.
    /// Every source cell is read before any destination is written, so
    /// overlapping ranges copy cleanly.
    pub fn copy_region_within(&mut self, bounds: &BoundingBox, target: Pos, excluded: &[&str]) -> Result<()> {
        let (target_bounds, cells) = Self::read_cells(self, bounds, target, excluded)?;
        self.write_cells(target_bounds, cells)
    }

    /// A new schematic holding the non-air content of `bounds`, moved so that
    /// `bounds.min` sits at the origin. Definition regions are clipped and moved
    /// along; those left empty are dropped.
    pub fn extract(&self, bounds: &BoundingBox) -> Result<UniversalSchematic> {
        let mut extracted = UniversalSchematic::new(self.metadata.name.clone().unwrap_or_default());
        extracted.metadata.author = self.metadata.author.clone();
        extracted.metadata.description = self.metadata.description.clone();
        extracted.metadata.mc_version = self.metadata.mc_version;
        extracted.metadata.we_version = self.metadata.we_version;
        extracted.metadata.lm_version = self.metadata.lm_version;

        let (_, cells) = Self::read_cells(self, bounds, (0, 0, 0), &[])?;
        let content: Vec<_> = cells
            .into_iter()
            .filter(|(_, state, entity)| !state.is_air() || entity.is_some())
            .collect();
        if let Some(first) = content.first() {
            let extent = content
                .iter()
                .fold(BoundingBox::point(first.0), |mut acc, (p, _, _)| {
                    acc.include(*p);
                    acc
                });
            extracted.write_cells(extent, content)?;
        }

        let back = |c: i32| {
            c.checked_neg()
                .ok_or_else(|| SchematicError::invalid("Extraction bounds start at the i32 minimum"))
        };
        let (dx, dy, dz) = (back(bounds.min.0)?, back(bounds.min.1)?, back(bounds.min.2)?);
        let clip = DefinitionRegion::from_bounds(bounds.min, bounds.max);
        for (name, region) in &self.definition_regions {
            let mut clipped = region.intersect(&clip);
            if clipped.is_empty() {
                continue;
            }
            clipped.shift(dx, dy, dz)?;
            extracted.definition_regions.insert(name.clone(), clipped);
        }
        Ok(extracted)
    }

    pub fn chunks(&self, options: &ChunkOptions) -> Result<Vec<Chunk>> {
        self.default_region.chunks(options)
    }

    pub fn iter_chunks(&self, options: &ChunkOptions) -> Result<impl Iterator<Item = Chunk>> {
        Ok(self.chunks(options)?.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nbt::NbtValue;

    fn stone() -> BlockState {
        BlockState::new("minecraft:stone")
    }

    #[test]
    fn test_default_region_anchors_at_first_block() {
        let mut schematic = UniversalSchematic::new("Test");
        schematic.set_block(1000, 64, -1000, &stone()).unwrap();
        assert_eq!(schematic.allocated_dimensions(), (1, 1, 1));
        assert_eq!(schematic.get_block(1000, 64, -1000), Some(&stone()));
        assert_eq!(schematic.get_block(0, 0, 0), None);
        assert_eq!(schematic.block_count(), 1);
    }

    #[test]
    fn test_rejected_write_keeps_default_anchor() {
        let mut schematic = UniversalSchematic::new("Test");
        assert!(schematic.set_block(5, 40_000_000, 5, &stone()).is_err());
        assert_eq!(schematic.default_region.position(), (0, 0, 0));

        assert!(schematic.fill_sphere((900, 10, 900), -1.0, &stone()).is_err());
        assert_eq!(schematic.default_region.position(), (0, 0, 0));
        assert_eq!(schematic.allocated_dimensions(), (1, 1, 1));

        schematic.set_block(-7, 3, 2, &stone()).unwrap();
        assert_eq!(schematic.default_region.position(), (-7, 3, 2));
        assert_eq!(schematic.allocated_dimensions(), (1, 1, 1));
    }

    #[test]
    fn test_set_block_str() {
        let mut schematic = UniversalSchematic::new("Test");
        schematic
            .set_block_str(0, 0, 0, "minecraft:lever[facing=north,powered=true]")
            .unwrap();
        let block = schematic.get_block(0, 0, 0).unwrap();
        assert_eq!(block.name(), "minecraft:lever");
        assert_eq!(block.get_property("powered").map(|v| v.as_str()), Some("true"));
    }

    #[test]
    fn test_named_regions() {
        let mut schematic = UniversalSchematic::new("Test");
        schematic
            .add_region(Region::new("Extra", (10, 0, 0), (2, 2, 2)))
            .unwrap();
        let err = schematic
            .add_region(Region::new("Extra", (0, 0, 0), (1, 1, 1)))
            .unwrap_err();
        assert!(matches!(err, SchematicError::NameCollision(_)));

        schematic
            .set_block_in_region("Extra", 10, 0, 0, &stone())
            .unwrap();
        assert_eq!(
            schematic.get_block_from_region("Extra", 10, 0, 0).unwrap(),
            &stone()
        );
        assert!(matches!(
            schematic.set_block_in_region("Missing", 0, 0, 0, &stone()),
            Err(SchematicError::NotFound(_))
        ));
        assert_eq!(schematic.region_names(), vec!["Main".to_string(), "Extra".to_string()]);
        assert_eq!(schematic.region_palette("default").unwrap().len(), 1);
        assert_eq!(schematic.region_palette("Extra").unwrap().len(), 2);
        assert_eq!(schematic.all_palettes().len(), 2);

        schematic.remove_region("Extra").unwrap();
        assert!(schematic.remove_region("Extra").is_err());
    }

    #[test]
    fn test_bounding_box_spans_regions() {
        let mut schematic = UniversalSchematic::new("Test");
        schematic.set_block(0, 0, 0, &stone()).unwrap();
        let mut extra = Region::new("Extra", (5, 5, 5), (1, 1, 1));
        extra.set_block(5, 5, 5, &stone()).unwrap();
        schematic.add_region(extra).unwrap();

        assert_eq!(
            schematic.bounding_box(),
            Some(BoundingBox::new((0, 0, 0), (5, 5, 5)))
        );
        assert_eq!(schematic.dimensions(), (6, 6, 6));
        assert_eq!(schematic.count_block_types().get(&stone()), Some(&2));
        assert_eq!(schematic.tight_bounds(), Some(BoundingBox::point((0, 0, 0))));
    }

    #[test]
    fn test_definition_region_crud() {
        let mut schematic = UniversalSchematic::new("Test");
        schematic.create_definition_region("a").unwrap();
        schematic
            .create_definition_region_from_bounds("b", (0, 0, 0), (1, 1, 1))
            .unwrap();
        assert!(matches!(
            schematic.create_definition_region_from_point("a", 0, 0, 0),
            Err(SchematicError::NameCollision(_))
        ));

        schematic.definition_region_add_point("a", 3, 3, 3).unwrap();
        schematic
            .definition_region_set_metadata("a", "color", "#ff0000")
            .unwrap();
        schematic.definition_region_shift("a", 1, 0, 0).unwrap();
        let a = schematic.get_definition_region("a").unwrap();
        assert!(a.contains(4, 3, 3));
        assert_eq!(a.get_metadata("color"), Some(&"#ff0000".to_string()));

        assert_eq!(schematic.definition_region_names(), vec!["a", "b"]);
        assert!(matches!(
            schematic.definition_region_add_bounds("zzz", (0, 0, 0), (1, 1, 1)),
            Err(SchematicError::NotFound(_))
        ));
        schematic.remove_definition_region("b").unwrap();
        assert!(schematic.get_definition_region("b").is_err());
    }

    #[test]
    fn test_fill_definition_region() {
        let mut schematic = UniversalSchematic::new("Test");
        let mut region = DefinitionRegion::from_bounds((0, 0, 0), (2, 0, 0));
        region.add_point(5, 5, 5);
        schematic.add_definition_region("io", region).unwrap();

        schematic.fill_definition_region("io", &stone()).unwrap();
        assert_eq!(schematic.block_count(), 4);
        assert_eq!(schematic.get_block(5, 5, 5), Some(&stone()));
        assert!(schematic.get_block(3, 0, 0).map_or(true, BlockState::is_air));
    }

    #[test]
    fn test_rotate_definition_region_replaces_footprint() {
        let mut schematic = UniversalSchematic::new("Test");
        schematic.fill_cuboid((0, 0, 0), (2, 0, 0), &stone()).unwrap();
        schematic
            .create_definition_region_from_bounds("bar", (0, 0, 0), (2, 0, 0))
            .unwrap();

        schematic
            .rotate_definition_region("bar", Axis::Y, 90)
            .unwrap();
        let footprint = schematic.get_definition_region("bar").unwrap();
        assert_eq!(footprint.dimensions(), (1, 1, 3));
        for (x, y, z) in footprint.positions() {
            assert_eq!(schematic.get_block(x, y, z), Some(&stone()));
        }
        assert!(schematic.get_block(2, 0, 0).unwrap().is_air());
    }

    #[test]
    fn test_copy_region_with_exclusions() {
        let mut source = UniversalSchematic::new("Source");
        source.set_block(0, 0, 0, &stone()).unwrap();
        source
            .set_block(1, 0, 0, &BlockState::new("minecraft:dirt"))
            .unwrap();
        source
            .set_block_entity(
                BlockEntity::new("minecraft:chest", (0, 0, 0))
                    .with_nbt_data("CustomName", NbtValue::String("box".into())),
            )
            .unwrap();

        let mut target = UniversalSchematic::new("Target");
        let gold = BlockState::new("minecraft:gold_block");
        target.fill_cuboid((10, 0, 0), (12, 0, 0), &gold).unwrap();

        target
            .copy_region(
                &source,
                &BoundingBox::new((0, 0, 0), (2, 0, 0)),
                (10, 0, 0),
                &["dirt"],
            )
            .unwrap();

        assert_eq!(target.get_block(10, 0, 0), Some(&stone()));
        assert_eq!(target.get_block(11, 0, 0), Some(&gold));
        // Air in the source overwrites.
        assert!(target.get_block(12, 0, 0).unwrap().is_air());
        let chest = target.get_block_entity((10, 0, 0)).unwrap();
        assert_eq!(chest.id, "minecraft:chest");
        assert_eq!(chest.position, (10, 0, 0));
    }

    #[test]
    fn test_copy_region_within_overlapping() {
        let mut schematic = UniversalSchematic::new("Test");
        for x in 0..3 {
            schematic
                .set_block(x, 0, 0, &BlockState::new(format!("minecraft:wool_{}", x)))
                .unwrap();
        }
        schematic
            .copy_region_within(&BoundingBox::new((0, 0, 0), (2, 0, 0)), (1, 0, 0), &[])
            .unwrap();
        let names: Vec<String> = (0..4)
            .map(|x| schematic.get_block(x, 0, 0).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "minecraft:wool_0",
                "minecraft:wool_0",
                "minecraft:wool_1",
                "minecraft:wool_2"
            ]
        );
    }

    #[test]
    fn test_extract_normalises_to_origin() {
        let mut schematic = UniversalSchematic::new("Test");
        schematic.fill_cuboid((10, 10, 10), (12, 11, 10), &stone()).unwrap();
        schematic.set_block(40, 40, 40, &stone()).unwrap();
        schematic
            .create_definition_region_from_bounds("io", (11, 10, 10), (20, 10, 10))
            .unwrap();

        let extracted = schematic
            .extract(&BoundingBox::new((10, 10, 10), (15, 15, 15)))
            .unwrap();
        assert_eq!(extracted.block_count(), 6);
        assert_eq!(
            extracted.bounding_box(),
            Some(BoundingBox::new((0, 0, 0), (2, 1, 0)))
        );
        let io = extracted.get_definition_region("io").unwrap();
        assert_eq!(io.bounds(), Some(BoundingBox::new((1, 0, 0), (5, 0, 0))));
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut schematic = UniversalSchematic::new("Test");
        schematic.fill_cuboid((0, 0, 0), (3, 3, 3), &stone()).unwrap();
        schematic
            .create_definition_region_from_bounds("io", (0, 0, 0), (1, 0, 0))
            .unwrap();

        let json = serde_json::to_string(&schematic).unwrap();
        let mut back: UniversalSchematic = serde_json::from_str(&json).unwrap();
        back.rebuild_caches().unwrap();
        assert_eq!(back.block_count(), 64);
        assert_eq!(back.bounding_box(), schematic.bounding_box());
        assert!(back
            .get_definition_region("io")
            .unwrap()
            .same_members(schematic.get_definition_region("io").unwrap()));
    }
}
