pub mod brushes;
pub mod color;
pub mod enums;
pub mod shapes;

pub use brushes::*;
pub use color::{InterpolationSpace, Oklab, Rgb};
pub use enums::{BrushEnum, ShapeEnum};
pub use shapes::*;

use crate::error::Result;
use crate::universal_schematic::UniversalSchematic;
use crate::BlockState;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Paints shapes into a schematic's default grid.
pub struct BuildingTool<'a> {
    schematic: &'a mut UniversalSchematic,
    resolver: Option<&'a dyn ColorResolver>,
}

impl<'a> BuildingTool<'a> {
    /// Colours resolve against the shared default block palette.
    pub fn new(schematic: &'a mut UniversalSchematic) -> Self {
        Self {
            schematic,
            resolver: None,
        }
    }

    pub fn with_resolver(schematic: &'a mut UniversalSchematic, resolver: &'a dyn ColorResolver) -> Self {
        Self {
            schematic,
            resolver: Some(resolver),
        }
    }

    /// Writes `brush` over every cell of `shape` and returns the number of
    /// cells written. Cells the brush leaves unpainted, or whose colour has no
    /// matching block, are skipped. The grid grows once to the shape bounds,
    /// so an `Err` leaves the schematic untouched.
    pub fn fill(&mut self, shape: &impl Shape, brush: &impl Brush) -> Result<usize> {
        let Some(bounds) = shape.bounds() else {
            return Ok(0);
        };
        self.schematic.ensure_bounds(bounds.min, bounds.max)?;

        let mut resolver = self.resolver;
        let mut resolved: FxHashMap<Rgb, Option<BlockState>> = FxHashMap::default();
        let mut written = 0;

        for (x, y, z) in bounds.iter_points() {
            if !shape.contains(x, y, z) {
                continue;
            }
            let normal = shape.normal_at(x, y, z);
            let block = match brush.paint(x, y, z, normal) {
                Some(Paint::Block(block)) => block,
                Some(Paint::Color(color)) => {
                    let resolver = *resolver.get_or_insert_with(|| default_palette() as &dyn ColorResolver);
                    let entry = resolved
                        .entry(color)
                        .or_insert_with(|| resolver.resolve(color));
                    match entry {
                        Some(block) => block.clone(),
                        None => continue,
                    }
                }
                None => continue,
            };
            self.schematic.set_block(x, y, z, &block)?;
            written += 1;
        }

        debug!(
            "fill wrote {} cells in {:?}..{:?} ({} colours resolved)",
            written,
            bounds.min,
            bounds.max,
            resolved.len()
        );
        Ok(written)
    }
}
