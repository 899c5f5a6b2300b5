use crate::block_entity::BlockEntity;
use crate::block_position::BlockPosition;
use crate::bounding_box::BoundingBox;
use crate::chunk::{self, Chunk, ChunkOptions};
use crate::definition_region::DefinitionRegion;
use crate::error::{Result, SchematicError};
use crate::palette::{Palette, AIR_INDEX};
use crate::transforms::{self, Axis};
use crate::BlockState;
use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Largest absolute coordinate a cell may have.
pub const MAX_COORDINATE: i32 = 30_000_000;
/// Largest number of cells a single grid may allocate.
pub const MAX_ALLOCATED_VOLUME: u64 = 1 << 30;

type Pos = (i32, i32, i32);

/// Dense voxel grid: one palette index per cell of the allocated box.
///
/// Cells are laid out x fastest, then z, then y. The allocation grows on
/// demand and may be larger than the content; `tight_bounds` tracks the
/// non-air extent separately.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Region {
    pub name: String,
    position: Pos,
    size: Pos,
    blocks: Vec<usize>,
    palette: Palette,
    #[serde(
        serialize_with = "serialize_block_entities",
        deserialize_with = "deserialize_block_entities"
    )]
    block_entities: HashMap<Pos, BlockEntity>,

    #[serde(skip)]
    bbox: BoundingBox,
    #[serde(skip)]
    tight_bounds: Option<BoundingBox>,

    // Hot-path caches, rebuilt whenever the allocation changes.
    #[serde(skip)]
    cached_width: usize,
    #[serde(skip)]
    cached_length: usize,
    #[serde(skip)]
    cached_width_x_length: usize,
    #[serde(skip)]
    non_air_count: usize,
}

fn serialize_block_entities<S>(
    block_entities: &HashMap<Pos, BlockEntity>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut list: Vec<&BlockEntity> = block_entities.values().collect();
    list.sort_by_key(|be| BlockPosition::from(be.position).canonical_key());
    list.serialize(serializer)
}

fn deserialize_block_entities<'de, D>(
    deserializer: D,
) -> std::result::Result<HashMap<Pos, BlockEntity>, D::Error>
where
    D: Deserializer<'de>,
{
    let list: Vec<BlockEntity> = Vec::deserialize(deserializer)?;
    Ok(list.into_iter().map(|be| (be.position, be)).collect())
}

pub(crate) fn check_coordinates(p: Pos) -> Result<()> {
    let in_range = |c: i32| (-MAX_COORDINATE..=MAX_COORDINATE).contains(&c);
    if in_range(p.0) && in_range(p.1) && in_range(p.2) {
        Ok(())
    } else {
        Err(SchematicError::invalid(format!(
            "Coordinates {:?} are outside the addressable range of +/-{}",
            p, MAX_COORDINATE
        )))
    }
}

/// Clips a box to the addressable space. `None` when nothing is left.
fn clip_to_world(b: BoundingBox) -> Option<BoundingBox> {
    let world = BoundingBox::new(
        (-MAX_COORDINATE, -MAX_COORDINATE, -MAX_COORDINATE),
        (MAX_COORDINATE, MAX_COORDINATE, MAX_COORDINATE),
    );
    b.intersection(&world)
}

/// Allocates an all-air cell array, reporting allocation failure instead of aborting.
fn allocate_cells(volume: u64) -> Result<Vec<usize>> {
    if volume > MAX_ALLOCATED_VOLUME {
        return Err(SchematicError::invalid(format!(
            "A grid of {} cells exceeds the limit of {}",
            volume, MAX_ALLOCATED_VOLUME
        )));
    }
    let mut cells = Vec::new();
    cells.try_reserve_exact(volume as usize).map_err(|e| {
        SchematicError::Internal(format!("Failed to allocate {} cells: {}", volume, e))
    })?;
    cells.resize(volume as usize, AIR_INDEX);
    Ok(cells)
}

impl Region {
    /// Empty grid allocated over `position + [0, size)`. Size components below 1
    /// become 1, and the far corner saturates at the `i32` limit.
    pub fn new(name: impl Into<String>, position: Pos, size: Pos) -> Self {
        let far = |p: i32, s: i32| p.saturating_add(s.max(1) - 1);
        let bounding_box = BoundingBox::new(
            position,
            (far(position.0, size.0), far(position.1, size.1), far(position.2, size.2)),
        );
        let (position, size) = bounding_box.to_position_and_size();

        let mut region = Region {
            name: name.into(),
            position,
            size,
            blocks: vec![AIR_INDEX; bounding_box.volume() as usize],
            palette: Palette::new(),
            block_entities: HashMap::new(),
            bbox: bounding_box,
            tight_bounds: None,
            cached_width: 0,
            cached_length: 0,
            cached_width_x_length: 0,
            non_air_count: 0,
        };
        region.rebuild_bbox();
        region
    }

    /// Refreshes the derived box and stride caches. `position` and `size` must
    /// describe a valid allocation.
    #[inline(always)]
    fn rebuild_bbox(&mut self) {
        let (p, s) = (self.position, self.size);
        self.bbox = BoundingBox::new(p, (p.0 + s.0 - 1, p.1 + s.1 - 1, p.2 + s.2 - 1));
        let (w, _, l) = self.bbox.get_dimensions();
        self.cached_width = w as usize;
        self.cached_length = l as usize;
        self.cached_width_x_length = w as usize * l as usize;
    }

    /// Restores every derived field after deserialization and checks the cell array
    /// against the declared size and palette.
    pub fn rebuild_caches(&mut self) -> Result<()> {
        self.check_layout()?;
        self.rebuild_bbox();
        let expected = self.bbox.volume();
        if self.blocks.len() as u64 != expected {
            return Err(SchematicError::invalid(format!(
                "Region '{}' holds {} cells but its size {:?} needs {}",
                self.name,
                self.blocks.len(),
                self.size,
                expected
            )));
        }
        let palette_len = self.palette.len();
        if let Some(bad) = self.blocks.iter().find(|&&b| b >= palette_len) {
            return Err(SchematicError::invalid(format!(
                "Region '{}' references palette index {} but the palette has {} entries",
                self.name, bad, palette_len
            )));
        }
        self.rebuild_non_air_count();
        self.rebuild_tight_bounds();
        Ok(())
    }

    /// Rejects a declared position and size that no grid could have produced.
    fn check_layout(&self) -> Result<()> {
        check_coordinates(self.position)?;
        let bbox = BoundingBox::from_position_and_size(self.position, self.size).ok_or_else(|| {
            SchematicError::invalid(format!(
                "Region '{}' has an invalid size {:?} at {:?}",
                self.name, self.size, self.position
            ))
        })?;
        check_coordinates(bbox.max)?;
        if bbox.volume() > MAX_ALLOCATED_VOLUME {
            return Err(SchematicError::invalid(format!(
                "Region '{}' declares {} cells, above the limit of {}",
                self.name,
                bbox.volume(),
                MAX_ALLOCATED_VOLUME
            )));
        }
        Ok(())
    }

    fn rebuild_non_air_count(&mut self) {
        self.non_air_count = self.blocks.iter().filter(|&&b| b != AIR_INDEX).count();
    }

    /// Recomputes the tight bounds by scanning every cell.
    pub fn rebuild_tight_bounds(&mut self) {
        self.tight_bounds = None;
        for index in 0..self.blocks.len() {
            if self.blocks[index] != AIR_INDEX {
                let p = self.index_to_coords(index);
                self.update_tight_bounds(p);
            }
        }
    }

    fn update_tight_bounds(&mut self, p: Pos) {
        match &mut self.tight_bounds {
            Some(bounds) => bounds.include(p),
            None => self.tight_bounds = Some(BoundingBox::point(p)),
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Raw palette indices in storage order.
    pub fn blocks(&self) -> &[usize] {
        &self.blocks
    }

    pub fn position(&self) -> Pos {
        self.position
    }

    pub fn is_empty(&self) -> bool {
        self.non_air_count == 0
    }

    pub fn count_non_air_blocks(&self) -> usize {
        self.non_air_count
    }

    pub fn volume(&self) -> usize {
        self.blocks.len()
    }

    #[inline(always)]
    pub fn coords_to_index(&self, x: i32, y: i32, z: i32) -> usize {
        let dx = (x - self.bbox.min.0) as usize;
        let dy = (y - self.bbox.min.1) as usize;
        let dz = (z - self.bbox.min.2) as usize;
        dx + dz * self.cached_width + dy * self.cached_width_x_length
    }

    #[inline(always)]
    pub fn index_to_coords(&self, index: usize) -> Pos {
        let dx = (index % self.cached_width) as i32;
        let dz = ((index / self.cached_width) % self.cached_length) as i32;
        let dy = (index / self.cached_width_x_length) as i32;
        (
            dx + self.bbox.min.0,
            dy + self.bbox.min.1,
            dz + self.bbox.min.2,
        )
    }

    #[inline(always)]
    pub fn is_in_region(&self, x: i32, y: i32, z: i32) -> bool {
        self.bbox.contains((x, y, z))
    }

    #[inline]
    fn cell_index(&self, (x, y, z): Pos) -> Option<usize> {
        self.is_in_region(x, y, z)
            .then(|| self.coords_to_index(x, y, z))
    }

    /// The allocated box.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    pub fn allocated_dimensions(&self) -> Pos {
        self.size
    }

    /// Extent of the non-air content, `None` when the grid holds only air.
    pub fn tight_bounds(&self) -> Option<BoundingBox> {
        self.tight_bounds
    }

    /// Size of the non-air content, `(0, 0, 0)` when empty.
    pub fn dimensions(&self) -> Pos {
        self.tight_bounds
            .map(|bounds| bounds.get_dimensions())
            .unwrap_or((0, 0, 0))
    }

    /// Block at a position. Anything outside the allocation reads as air.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> &BlockState {
        self.get_block_index(x, y, z)
            .and_then(|i| self.palette.get(i))
            .unwrap_or_else(|| self.palette.air())
    }

    pub fn get_block_index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        self.cell_index((x, y, z)).map(|i| self.blocks[i])
    }

    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: &BlockState) -> Result<()> {
        if !self.is_in_region(x, y, z) {
            self.expand_to_fit(x, y, z)?;
        }
        let palette_index = self.palette.get_or_insert(block);
        let index = self.coords_to_index(x, y, z);
        self.write_cell(index, palette_index, (x, y, z));
        Ok(())
    }

    /// Writes an index into an allocated cell and keeps the counters current.
    #[inline]
    fn write_cell(&mut self, index: usize, palette_index: usize, p: Pos) {
        let old = std::mem::replace(&mut self.blocks[index], palette_index);
        let old_is_air = old == AIR_INDEX;
        let new_is_air = palette_index == AIR_INDEX;
        if old_is_air && !new_is_air {
            self.non_air_count += 1;
        } else if !old_is_air && new_is_air {
            self.non_air_count -= 1;
            if self.non_air_count == 0 {
                self.tight_bounds = None;
            }
        }
        if !new_is_air {
            self.update_tight_bounds(p);
        }
    }

    /// Grows the allocation so it holds `(x, y, z)`, padding the grown axes.
    pub fn expand_to_fit(&mut self, x: i32, y: i32, z: i32) -> Result<()> {
        check_coordinates((x, y, z))?;
        let current = self.bbox;
        if current.contains((x, y, z)) {
            return Ok(());
        }

        let current_volume = current.volume();
        let current_size = current.get_dimensions();
        let padding = if current_volume < 1000 {
            (64, 64, 64)
        } else if current_volume < 100_000 {
            (current_size.0 / 2, current_size.1 / 2, current_size.2 / 2)
        } else {
            (128, 128, 128)
        };

        let grow = |c: i32, lo: i32, hi: i32, pad: i32| {
            let lo = if c < lo { (c - pad).max(-MAX_COORDINATE) } else { lo };
            let hi = if c > hi { (c + pad).min(MAX_COORDINATE) } else { hi };
            (lo, hi)
        };
        let (min_x, max_x) = grow(x, current.min.0, current.max.0, padding.0);
        let (min_y, max_y) = grow(y, current.min.1, current.max.1, padding.1);
        let (min_z, max_z) = grow(z, current.min.2, current.max.2, padding.2);
        let padded = BoundingBox::new((min_x, min_y, min_z), (max_x, max_y, max_z));

        let mut exact = current;
        exact.include((x, y, z));

        let target = if padded.volume() > MAX_ALLOCATED_VOLUME && exact.volume() <= MAX_ALLOCATED_VOLUME {
            exact
        } else {
            padded
        };
        self.expand_to_bounding_box(target)
    }

    /// Ensures the allocation covers `min..=max` with a single reallocation.
    pub fn ensure_bounds(&mut self, min: Pos, max: Pos) -> Result<()> {
        check_coordinates(min)?;
        check_coordinates(max)?;
        let requested = BoundingBox::from_corners(min, max);
        if self.bbox.contains_box(&requested) {
            return Ok(());
        }
        self.expand_to_bounding_box(self.bbox.union(&requested))
    }

    fn expand_to_bounding_box(&mut self, new_bounding_box: BoundingBox) -> Result<()> {
        if new_bounding_box == self.bbox {
            return Ok(());
        }
        let volume = new_bounding_box.volume();
        let mut new_blocks = allocate_cells(volume)?;
        debug!(
            region = %self.name,
            old = ?self.bbox,
            new = ?new_bounding_box,
            volume,
            "Reallocating region grid"
        );

        // Row-level copy of the old content into its place in the new box.
        let old_w = self.cached_width;
        let old_l = self.cached_length;
        let old_h = self.size.1 as usize;
        let (new_w, _, new_l) = new_bounding_box.get_dimensions();
        let new_w = new_w as usize;
        let new_l = new_l as usize;

        let x_off = (self.bbox.min.0 - new_bounding_box.min.0) as usize;
        let y_off = (self.bbox.min.1 - new_bounding_box.min.1) as usize;
        let z_off = (self.bbox.min.2 - new_bounding_box.min.2) as usize;

        for dy in 0..old_h {
            for dz in 0..old_l {
                let src_start = dy * old_w * old_l + dz * old_w;
                let dst_start = (dy + y_off) * new_w * new_l + (dz + z_off) * new_w + x_off;
                new_blocks[dst_start..dst_start + old_w]
                    .copy_from_slice(&self.blocks[src_start..src_start + old_w]);
            }
        }

        let (position, size) = new_bounding_box.to_position_and_size();
        self.position = position;
        self.size = size;
        self.blocks = new_blocks;
        self.rebuild_bbox();
        Ok(())
    }

    /// Sets every cell of `min..=max` (corners in any order) to `block`.
    pub fn fill_cuboid(&mut self, min: Pos, max: Pos, block: &BlockState) -> Result<()> {
        let Some(target) = clip_to_world(BoundingBox::from_corners(min, max)) else {
            return Ok(());
        };
        self.ensure_bounds(target.min, target.max)?;
        let palette_index = self.palette.get_or_insert(block);
        self.fill_uniform(target, palette_index);
        Ok(())
    }

    fn fill_uniform(&mut self, target: BoundingBox, palette_index: usize) {
        let new_is_air = palette_index == AIR_INDEX;
        let w = self.cached_width;
        let wl = self.cached_width_x_length;
        let dx_min = (target.min.0 - self.bbox.min.0) as usize;
        let row_len = target.get_dimensions().0 as usize;

        let mut air_replaced = 0usize;
        let mut solid_replaced = 0usize;
        for y in target.min.1..=target.max.1 {
            let dy = (y - self.bbox.min.1) as usize;
            for z in target.min.2..=target.max.2 {
                let dz = (z - self.bbox.min.2) as usize;
                let row_start = dx_min + dz * w + dy * wl;
                let row = &mut self.blocks[row_start..row_start + row_len];
                let air = row.iter().filter(|&&b| b == AIR_INDEX).count();
                air_replaced += air;
                solid_replaced += row_len - air;
                row.fill(palette_index);
            }
        }

        if new_is_air {
            self.non_air_count -= solid_replaced;
            if self.non_air_count == 0 {
                self.tight_bounds = None;
            }
        } else {
            self.non_air_count += air_replaced;
            self.update_tight_bounds(target.min);
            self.update_tight_bounds(target.max);
        }
    }

    /// Sets every cell whose centre lies within `radius` of `center`'s centre.
    pub fn fill_sphere(&mut self, center: Pos, radius: f64, block: &BlockState) -> Result<()> {
        if !(radius >= 0.0) || !radius.is_finite() {
            return Err(SchematicError::invalid(format!(
                "Sphere radius must be a finite non-negative number, got {}",
                radius
            )));
        }
        let r = radius.floor().min(MAX_COORDINATE as f64 * 2.0) as i32;
        let reach = BoundingBox::new(
            (
                center.0.saturating_sub(r),
                center.1.saturating_sub(r),
                center.2.saturating_sub(r),
            ),
            (
                center.0.saturating_add(r),
                center.1.saturating_add(r),
                center.2.saturating_add(r),
            ),
        );
        let Some(target) = clip_to_world(reach) else {
            return Ok(());
        };
        self.ensure_bounds(target.min, target.max)?;

        let palette_index = self.palette.get_or_insert(block);
        let r2 = radius * radius;
        for p in target.iter_points() {
            let dx = (p.0 - center.0) as i64;
            let dy = (p.1 - center.1) as i64;
            let dz = (p.2 - center.2) as i64;
            if (dx * dx + dy * dy + dz * dz) as f64 <= r2 {
                let index = self.coords_to_index(p.0, p.1, p.2);
                self.write_cell(index, palette_index, p);
            }
        }
        Ok(())
    }

    /// Counts non-air cells per block state.
    pub fn count_block_types(&self) -> HashMap<BlockState, usize> {
        let mut per_index = vec![0usize; self.palette.len()];
        for &b in &self.blocks {
            if let Some(count) = per_index.get_mut(b) {
                *count += 1;
            }
        }
        let mut counts = HashMap::new();
        for (index, count) in per_index.into_iter().enumerate() {
            if index == AIR_INDEX || count == 0 {
                continue;
            }
            if let Some(state) = self.palette.get(index) {
                *counts.entry(state.clone()).or_insert(0) += count;
            }
        }
        counts
    }

    /// Non-air cells in canonical order (x fastest, then y, then z).
    pub fn iter_blocks(&self) -> impl Iterator<Item = (BlockPosition, &BlockState)> + '_ {
        self.tight_bounds
            .into_iter()
            .flat_map(|bounds| bounds.iter_points())
            .filter_map(move |(x, y, z)| {
                let index = self.blocks[self.coords_to_index(x, y, z)];
                if index == AIR_INDEX {
                    return None;
                }
                self.palette
                    .get(index)
                    .map(|state| (BlockPosition::new(x, y, z), state))
            })
    }

    pub fn chunks(&self, options: &ChunkOptions) -> Result<Vec<Chunk>> {
        chunk::partition(self, options)
    }

    pub fn set_block_entity(&mut self, block_entity: BlockEntity) -> Result<()> {
        check_coordinates(block_entity.position)?;
        self.block_entities
            .insert(block_entity.position, block_entity);
        Ok(())
    }

    pub fn get_block_entity(&self, position: Pos) -> Option<&BlockEntity> {
        self.block_entities.get(&position)
    }

    pub fn remove_block_entity(&mut self, position: Pos) -> Option<BlockEntity> {
        self.block_entities.remove(&position)
    }

    /// Block entities in canonical position order.
    pub fn block_entities(&self) -> Vec<&BlockEntity> {
        let mut list: Vec<&BlockEntity> = self.block_entities.values().collect();
        list.sort_by_key(|be| BlockPosition::from(be.position).canonical_key());
        list
    }

    fn remap_block_entities(&mut self, f: impl Fn(Pos) -> Pos) {
        self.block_entities = self
            .block_entities
            .drain()
            .map(|(pos, mut be)| {
                let moved = f(pos);
                be.position = moved;
                (moved, be)
            })
            .collect();
    }

    /// Copies `other` into this grid. Air in `other` never overwrites.
    pub fn merge(&mut self, other: &Region) -> Result<()> {
        let combined = self.bbox.union(&other.bbox);
        let mut new_blocks = allocate_cells(combined.volume())?;
        let (new_w, _, new_l) = combined.get_dimensions();
        let new_w = new_w as usize;
        let new_l = new_l as usize;

        {
            let old_w = self.cached_width;
            let old_l = self.cached_length;
            let old_h = self.size.1 as usize;
            let x_off = (self.bbox.min.0 - combined.min.0) as usize;
            let y_off = (self.bbox.min.1 - combined.min.1) as usize;
            let z_off = (self.bbox.min.2 - combined.min.2) as usize;

            for dy in 0..old_h {
                for dz in 0..old_l {
                    let src_start = dy * old_w * old_l + dz * old_w;
                    let dst_start = (dy + y_off) * new_w * new_l + (dz + z_off) * new_w + x_off;
                    new_blocks[dst_start..dst_start + old_w]
                        .copy_from_slice(&self.blocks[src_start..src_start + old_w]);
                }
            }
        }

        let other_remap: Vec<usize> = other
            .palette
            .iter()
            .map(|state| self.palette.get_or_insert(state))
            .collect();

        {
            let other_w = other.cached_width;
            let other_l = other.cached_length;
            let other_h = other.size.1 as usize;
            let x_off = (other.bbox.min.0 - combined.min.0) as usize;
            let y_off = (other.bbox.min.1 - combined.min.1) as usize;
            let z_off = (other.bbox.min.2 - combined.min.2) as usize;

            for dy in 0..other_h {
                for dz in 0..other_l {
                    let src_start = dy * other_w * other_l + dz * other_w;
                    let dst_start = (dy + y_off) * new_w * new_l + (dz + z_off) * new_w + x_off;
                    for dx in 0..other_w {
                        let src = other.blocks[src_start + dx];
                        if src == AIR_INDEX {
                            continue;
                        }
                        new_blocks[dst_start + dx] = other_remap[src];
                    }
                }
            }
        }

        let (position, size) = combined.to_position_and_size();
        self.position = position;
        self.size = size;
        self.blocks = new_blocks;
        self.rebuild_bbox();
        self.rebuild_non_air_count();
        self.tight_bounds = match (self.tight_bounds, other.tight_bounds) {
            (Some(a), Some(b)) => Some(a.union(&b)),
            (a, b) => a.or(b),
        };

        self.block_entities.extend(
            other
                .block_entities
                .iter()
                .map(|(&pos, be)| (pos, be.clone())),
        );
        Ok(())
    }

    /// A copy cropped to the tight bounds. An empty grid yields a 1x1x1 air region
    /// that keeps the palette.
    pub fn to_compact(&self) -> Region {
        let Some(tight_bounds) = self.tight_bounds else {
            let mut empty = Region::new(self.name.clone(), (0, 0, 0), (1, 1, 1));
            empty.palette = self.palette.clone();
            return empty;
        };

        let (tight_pos, tight_dims) = tight_bounds.to_position_and_size();
        let mut compact = Region::new(self.name.clone(), tight_pos, tight_dims);
        compact.palette = self.palette.clone();

        let old_w = self.cached_width;
        let old_l = self.cached_length;
        let compact_w = compact.cached_width;
        let compact_l = compact.cached_length;
        let x_off_src = (tight_bounds.min.0 - self.bbox.min.0) as usize;
        let src_blocks = &self.blocks;
        let bbox_min_y = self.bbox.min.1;
        let bbox_min_z = self.bbox.min.2;

        // Each chunk of `compact_w * compact_l` cells is one y layer of the result.
        compact
            .blocks
            .par_chunks_mut(compact_w * compact_l)
            .enumerate()
            .for_each(|(dy_dst, layer)| {
                let dy_src = (tight_bounds.min.1 + dy_dst as i32 - bbox_min_y) as usize;
                for dz_dst in 0..compact_l {
                    let dz_src = (tight_bounds.min.2 + dz_dst as i32 - bbox_min_z) as usize;
                    let src_start = dy_src * old_w * old_l + dz_src * old_w + x_off_src;
                    let dst_start = dz_dst * compact_w;
                    layer[dst_start..dst_start + compact_w]
                        .copy_from_slice(&src_blocks[src_start..src_start + compact_w]);
                }
            });

        compact.rebuild_non_air_count();
        compact.tight_bounds = Some(tight_bounds);
        for (&pos, be) in &self.block_entities {
            if tight_bounds.contains(pos) {
                compact.block_entities.insert(pos, be.clone());
            }
        }
        compact
    }

    /// Drops unused palette entries, merges duplicates and rewrites every cell.
    pub fn compact_palette(&mut self) {
        let mut used = vec![false; self.palette.len()];
        for &b in &self.blocks {
            if let Some(flag) = used.get_mut(b) {
                *flag = true;
            }
        }
        let before = self.palette.len();
        let (palette, remap) = self.palette.compacted(&used);
        self.blocks
            .par_iter_mut()
            .for_each(|b| *b = remap.get(*b).copied().unwrap_or(AIR_INDEX));
        self.palette = palette;
        debug!(
            region = %self.name,
            before,
            after = self.palette.len(),
            "Compacted palette"
        );
    }

    /// Mirrors the whole allocation across its centre plane perpendicular to `axis`.
    pub fn flip(&mut self, axis: Axis) {
        let w = self.cached_width;
        let l = self.cached_length;
        let wl = self.cached_width_x_length;
        let h = self.size.1 as usize;

        match axis {
            Axis::X => self
                .blocks
                .par_chunks_mut(w)
                .for_each(|row| row.reverse()),
            Axis::Y => {
                for dy in 0..h / 2 {
                    let mirror = h - 1 - dy;
                    let (lower, upper) = self.blocks.split_at_mut(mirror * wl);
                    lower[dy * wl..(dy + 1) * wl].swap_with_slice(&mut upper[..wl]);
                }
            }
            Axis::Z => {
                for layer in self.blocks.chunks_exact_mut(wl) {
                    for dz in 0..l / 2 {
                        let mirror = l - 1 - dz;
                        let (front, back) = layer.split_at_mut(mirror * w);
                        front[dz * w..(dz + 1) * w].swap_with_slice(&mut back[..w]);
                    }
                }
            }
        }

        self.palette
            .map_in_place(|state| transforms::transform_block_state_flip(state, axis));

        let pivot = self.bbox;
        self.remap_block_entities(|p| transforms::flip_point(axis, p, &pivot));
        self.tight_bounds = self.tight_bounds.map(|b| {
            BoundingBox::from_corners(
                transforms::flip_point(axis, b.min, &pivot),
                transforms::flip_point(axis, b.max, &pivot),
            )
        });
    }

    pub fn flip_x(&mut self) {
        self.flip(Axis::X)
    }

    pub fn flip_y(&mut self) {
        self.flip(Axis::Y)
    }

    pub fn flip_z(&mut self) {
        self.flip(Axis::Z)
    }

    /// Rotates the allocation about `axis`, keeping its min corner in place.
    pub fn rotate(&mut self, axis: Axis, degrees: i32) -> Result<()> {
        let turns = transforms::quarter_turns(degrees)?;
        if turns == 0 {
            return Ok(());
        }

        let old_bbox = self.bbox;
        let new_bbox = transforms::rotated_box(axis, turns, &old_bbox)
            .ok_or_else(|| SchematicError::invalid("Rotated grid leaves the coordinate range"))?;
        check_coordinates(new_bbox.max)?;
        let mut new_blocks = allocate_cells(new_bbox.volume())?;

        for (index, &block) in self.blocks.iter().enumerate() {
            if block == AIR_INDEX {
                continue;
            }
            let p = old_bbox.index_to_coords(index);
            let (x, y, z) = transforms::rotate_point(axis, turns, p, &old_bbox);
            new_blocks[new_bbox.coords_to_index(x, y, z)] = block;
        }

        let (position, size) = new_bbox.to_position_and_size();
        self.position = position;
        self.size = size;
        self.blocks = new_blocks;
        self.rebuild_bbox();

        self.palette
            .map_in_place(|state| transforms::transform_block_state_rotate(state, axis, degrees));
        self.remap_block_entities(|p| transforms::rotate_point(axis, turns, p, &old_bbox));
        self.tight_bounds = self.tight_bounds.map(|b| {
            BoundingBox::from_corners(
                transforms::rotate_point(axis, turns, b.min, &old_bbox),
                transforms::rotate_point(axis, turns, b.max, &old_bbox),
            )
        });
        Ok(())
    }

    pub fn rotate_x(&mut self, degrees: i32) -> Result<()> {
        self.rotate(Axis::X, degrees)
    }

    pub fn rotate_y(&mut self, degrees: i32) -> Result<()> {
        self.rotate(Axis::Y, degrees)
    }

    pub fn rotate_z(&mut self, degrees: i32) -> Result<()> {
        self.rotate(Axis::Z, degrees)
    }

    /// Mirrors only the cells of `scope`, pivoting on the scope's bounding box.
    pub fn flip_within(&mut self, scope: &DefinitionRegion, axis: Axis) -> Result<()> {
        let Some(pivot) = scope.bounds() else {
            return Ok(());
        };
        self.transform_within(
            scope,
            pivot,
            |p| transforms::flip_point(axis, p, &pivot),
            |state| transforms::transform_block_state_flip(state, axis),
        )
    }

    /// Rotates only the cells of `scope` about the min corner of its bounding box.
    pub fn rotate_within(&mut self, scope: &DefinitionRegion, axis: Axis, degrees: i32) -> Result<()> {
        let turns = transforms::quarter_turns(degrees)?;
        let Some(pivot) = scope.bounds() else {
            return Ok(());
        };
        if turns == 0 {
            return Ok(());
        }
        let footprint = transforms::rotated_box(axis, turns, &pivot)
            .ok_or_else(|| SchematicError::invalid("Rotated scope leaves the coordinate range"))?;
        self.transform_within(
            scope,
            footprint,
            |p| transforms::rotate_point(axis, turns, p, &pivot),
            |state| transforms::transform_block_state_rotate(state, axis, degrees),
        )
    }

    /// Moves every member cell of `scope` through `map_pos`. All members are read
    /// and cleared before any destination is written.
    fn transform_within(
        &mut self,
        scope: &DefinitionRegion,
        footprint: BoundingBox,
        map_pos: impl Fn(Pos) -> Pos,
        map_state: impl Fn(&BlockState) -> BlockState,
    ) -> Result<()> {
        self.ensure_bounds(footprint.min, footprint.max)?;

        let mut snapshot: Vec<(Pos, usize, Option<BlockEntity>)> = Vec::new();
        for p in scope.iter_positions() {
            let entity = self.block_entities.remove(&p);
            let block = match self.cell_index(p) {
                Some(index) => {
                    let block = self.blocks[index];
                    self.write_cell(index, AIR_INDEX, p);
                    block
                }
                None => AIR_INDEX,
            };
            snapshot.push((p, block, entity));
        }
        debug!(
            region = %self.name,
            cells = snapshot.len(),
            footprint = ?footprint,
            "Transforming cells within definition region"
        );

        let mut remapped: HashMap<usize, usize> = HashMap::new();
        for (p, block, entity) in snapshot {
            let target = map_pos(p);
            let new_block = if block == AIR_INDEX {
                AIR_INDEX
            } else if let Some(&cached) = remapped.get(&block) {
                cached
            } else {
                let state = self.palette.get(block).cloned().unwrap_or_else(BlockState::air);
                let index = self.palette.get_or_insert(&map_state(&state));
                remapped.insert(block, index);
                index
            };

            let index = self.cell_index(target).ok_or_else(|| {
                SchematicError::Internal(format!(
                    "Transformed cell {:?} fell outside the grown grid",
                    target
                ))
            })?;
            trace!(from = ?p, to = ?target, "Moving cell");
            self.write_cell(index, new_block, target);
            self.block_entities.remove(&target);
            if let Some(mut be) = entity {
                be.position = target;
                self.block_entities.insert(target, be);
            }
        }
        Ok(())
    }
}
