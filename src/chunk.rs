use crate::block_position::BlockPosition;
use crate::bounding_box::BoundingBox;
use crate::error::{Result, SchematicError};
use crate::palette::AIR_INDEX;
use crate::region::Region;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// One cell of a chunk partition, holding palette indices into the owning grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_x: i32,
    pub chunk_y: i32,
    pub chunk_z: i32,
    /// World position of the chunk's min corner.
    pub origin: (i32, i32, i32),
    pub size: (i32, i32, i32),
    pub blocks: Vec<(BlockPosition, usize)>,
}

impl Chunk {
    pub fn bounds(&self) -> BoundingBox {
        let far = |o: i32, s: i32| o.saturating_add(s.max(1) - 1);
        BoundingBox::new(
            self.origin,
            (
                far(self.origin.0, self.size.0),
                far(self.origin.1, self.size.1),
                far(self.origin.2, self.size.2),
            ),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    fn center(&self) -> (f32, f32, f32) {
        (
            self.origin.0 as f32 + self.size.0 as f32 / 2.0,
            self.origin.1 as f32 + self.size.1 as f32 / 2.0,
            self.origin.2 as f32 + self.size.2 as f32 / 2.0,
        )
    }
}

/// Which volume of a grid gets partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChunkBounds {
    /// Only the extent of the non-air content.
    #[default]
    Tight,
    /// The whole allocated box.
    Allocated,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ChunkLoadingStrategy {
    /// Canonical order: x fastest, then y, then z.
    #[default]
    Default,
    DistanceToCamera(f32, f32, f32), // Camera position
    TopDown,
    BottomUp,
    CenterOutward,
    /// Seeded shuffle, reproducible for a given seed.
    Random(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkOptions {
    pub size: (i32, i32, i32),
    pub bounds: ChunkBounds,
    pub include_air: bool,
    pub strategy: ChunkLoadingStrategy,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        ChunkOptions {
            size: (16, 16, 16),
            bounds: ChunkBounds::Tight,
            include_air: false,
            strategy: ChunkLoadingStrategy::Default,
        }
    }
}

impl ChunkOptions {
    pub fn with_size(mut self, width: i32, height: i32, length: i32) -> Self {
        self.size = (width, height, length);
        self
    }

    pub fn with_bounds(mut self, bounds: ChunkBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_air(mut self, include_air: bool) -> Self {
        self.include_air = include_air;
        self
    }

    pub fn with_strategy(mut self, strategy: ChunkLoadingStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

fn distance_sq(a: (f32, f32, f32), b: (f32, f32, f32)) -> f32 {
    (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2) + (a.2 - b.2).powi(2)
}

/// Splits a grid into chunks and orders them by the requested strategy.
pub(crate) fn partition(region: &Region, options: &ChunkOptions) -> Result<Vec<Chunk>> {
    let (sx, sy, sz) = options.size;
    if sx <= 0 || sy <= 0 || sz <= 0 {
        return Err(SchematicError::invalid(format!(
            "Chunk size must be positive on every axis, got {:?}",
            options.size
        )));
    }

    let volume = match options.bounds {
        ChunkBounds::Tight => region.tight_bounds(),
        ChunkBounds::Allocated => Some(region.bounding_box()),
    };
    let Some(volume) = volume else {
        return Ok(Vec::new());
    };

    let lo = (
        volume.min.0.div_euclid(sx),
        volume.min.1.div_euclid(sy),
        volume.min.2.div_euclid(sz),
    );
    let hi = (
        volume.max.0.div_euclid(sx),
        volume.max.1.div_euclid(sy),
        volume.max.2.div_euclid(sz),
    );

    let mut chunks = Vec::new();
    for chunk_z in lo.2..=hi.2 {
        for chunk_y in lo.1..=hi.1 {
            for chunk_x in lo.0..=hi.0 {
                let origin = (chunk_x * sx, chunk_y * sy, chunk_z * sz);
                let Some(covered) = BoundingBox::from_position_and_size(origin, options.size)
                    .and_then(|cell_box| cell_box.intersection(&volume))
                else {
                    continue;
                };

                let blocks: Vec<(BlockPosition, usize)> = covered
                    .iter_points()
                    .filter_map(|(x, y, z)| {
                        let index = region.get_block_index(x, y, z).unwrap_or(AIR_INDEX);
                        (options.include_air || index != AIR_INDEX)
                            .then(|| (BlockPosition::new(x, y, z), index))
                    })
                    .collect();
                if blocks.is_empty() {
                    continue;
                }

                chunks.push(Chunk {
                    chunk_x,
                    chunk_y,
                    chunk_z,
                    origin,
                    size: options.size,
                    blocks,
                });
            }
        }
    }

    order_chunks(&mut chunks, options.strategy, &volume);
    Ok(chunks)
}

/// Reorders chunks that arrive in canonical order. Every sort is stable, so ties
/// keep canonical order.
fn order_chunks(chunks: &mut [Chunk], strategy: ChunkLoadingStrategy, volume: &BoundingBox) {
    match strategy {
        ChunkLoadingStrategy::Default => {}
        ChunkLoadingStrategy::DistanceToCamera(cam_x, cam_y, cam_z) => {
            let camera = (cam_x, cam_y, cam_z);
            chunks.sort_by(|a, b| {
                distance_sq(a.center(), camera).total_cmp(&distance_sq(b.center(), camera))
            });
        }
        ChunkLoadingStrategy::TopDown => {
            chunks.sort_by(|a, b| b.chunk_y.cmp(&a.chunk_y));
        }
        ChunkLoadingStrategy::BottomUp => {
            chunks.sort_by(|a, b| a.chunk_y.cmp(&b.chunk_y));
        }
        ChunkLoadingStrategy::CenterOutward => {
            let center = (
                (volume.min.0 as f32 + volume.max.0 as f32 + 1.0) / 2.0,
                (volume.min.1 as f32 + volume.max.1 as f32 + 1.0) / 2.0,
                (volume.min.2 as f32 + volume.max.2 as f32 + 1.0) / 2.0,
            );
            chunks.sort_by(|a, b| {
                distance_sq(a.center(), center).total_cmp(&distance_sq(b.center(), center))
            });
        }
        ChunkLoadingStrategy::Random(seed) => {
            let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
            chunks.shuffle(&mut rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockState;

    fn keys(chunks: &[Chunk]) -> Vec<(i32, i32, i32)> {
        chunks
            .iter()
            .map(|c| (c.chunk_x, c.chunk_y, c.chunk_z))
            .collect()
    }

    fn filled_region() -> Region {
        let mut region = Region::new("Test", (0, 0, 0), (1, 1, 1));
        let stone = BlockState::new("minecraft:stone");
        region.fill_cuboid((0, 0, 0), (3, 3, 3), &stone).unwrap();
        region
    }

    #[test]
    fn test_canonical_order() {
        let region = filled_region();
        let options = ChunkOptions::default().with_size(2, 2, 2);
        let chunks = region.chunks(&options).unwrap();
        assert_eq!(chunks.len(), 8);
        assert_eq!(
            keys(&chunks),
            vec![
                (0, 0, 0),
                (1, 0, 0),
                (0, 1, 0),
                (1, 1, 0),
                (0, 0, 1),
                (1, 0, 1),
                (0, 1, 1),
                (1, 1, 1)
            ]
        );
        let first: Vec<_> = chunks[0].blocks.iter().map(|(p, _)| (p.x, p.y, p.z)).collect();
        assert_eq!(first[..3], [(0, 0, 0), (1, 0, 0), (0, 1, 0)]);
        assert_eq!(chunks.iter().map(Chunk::len).sum::<usize>(), 64);
    }

    #[test]
    fn test_negative_coordinates_use_floor_division() {
        let mut region = Region::new("Test", (0, 0, 0), (1, 1, 1));
        region.set_block(-1, 0, 0, &BlockState::new("minecraft:stone")).unwrap();
        let chunks = region.chunks(&ChunkOptions::default()).unwrap();
        assert_eq!(keys(&chunks), vec![(-1, 0, 0)]);
        assert_eq!(chunks[0].origin, (-16, 0, 0));
    }

    #[test]
    fn test_air_and_empty_chunks() {
        let mut region = Region::new("Test", (0, 0, 0), (1, 1, 1));
        let stone = BlockState::new("minecraft:stone");
        region.set_block(0, 0, 0, &stone).unwrap();
        region.set_block(3, 0, 0, &stone).unwrap();

        let sparse = region
            .chunks(&ChunkOptions::default().with_size(1, 1, 1))
            .unwrap();
        assert_eq!(keys(&sparse), vec![(0, 0, 0), (3, 0, 0)]);

        let dense = region
            .chunks(&ChunkOptions::default().with_size(1, 1, 1).with_air(true))
            .unwrap();
        assert_eq!(dense.len(), 4);
        assert_eq!(dense[1].blocks, vec![(BlockPosition::new(1, 0, 0), AIR_INDEX)]);
    }

    #[test]
    fn test_allocated_bounds() {
        let mut region = Region::new("Test", (0, 0, 0), (4, 4, 4));
        region.set_block(0, 0, 0, &BlockState::new("minecraft:stone")).unwrap();
        let options = ChunkOptions::default()
            .with_size(2, 2, 2)
            .with_bounds(ChunkBounds::Allocated)
            .with_air(true);
        let chunks = region.chunks(&options).unwrap();
        assert_eq!(chunks.len(), 8);
        assert!(chunks.iter().all(|c| c.len() == 8));
    }

    #[test]
    fn test_strategies() {
        let region = filled_region();
        let base = ChunkOptions::default().with_size(2, 2, 2);

        let top = region
            .chunks(&base.with_strategy(ChunkLoadingStrategy::TopDown))
            .unwrap();
        assert_eq!(keys(&top)[..4], [(0, 1, 0), (1, 1, 0), (0, 1, 1), (1, 1, 1)]);

        let bottom = region
            .chunks(&base.with_strategy(ChunkLoadingStrategy::BottomUp))
            .unwrap();
        assert_eq!(keys(&bottom)[..4], [(0, 0, 0), (1, 0, 0), (0, 0, 1), (1, 0, 1)]);

        let camera = region
            .chunks(&base.with_strategy(ChunkLoadingStrategy::DistanceToCamera(10.0, 10.0, 10.0)))
            .unwrap();
        assert_eq!(keys(&camera)[0], (1, 1, 1));
        assert_eq!(keys(&camera)[7], (0, 0, 0));

        // Every chunk is equidistant from the centre, so canonical order survives.
        let centre = region
            .chunks(&base.with_strategy(ChunkLoadingStrategy::CenterOutward))
            .unwrap();
        assert_eq!(keys(&centre), keys(&region.chunks(&base).unwrap()));
    }

    #[test]
    fn test_random_is_reproducible() {
        let region = filled_region();
        let options = ChunkOptions::default()
            .with_size(1, 1, 1)
            .with_strategy(ChunkLoadingStrategy::Random(42));
        let a = keys(&region.chunks(&options).unwrap());
        let b = keys(&region.chunks(&options).unwrap());
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_invalid_size() {
        let region = filled_region();
        let err = region
            .chunks(&ChunkOptions::default().with_size(0, 16, 16))
            .unwrap_err();
        assert!(matches!(err, SchematicError::InvalidArgument(_)));
    }
}
