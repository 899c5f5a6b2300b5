use serde::{Deserialize, Serialize};

/// Inclusive axis-aligned box over lattice coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: (i32, i32, i32),
    pub max: (i32, i32, i32),
}

impl BoundingBox {
    pub fn new(min: (i32, i32, i32), max: (i32, i32, i32)) -> Self {
        BoundingBox { min, max }
    }

    /// Builds a box from two arbitrary corners.
    pub fn from_corners(a: (i32, i32, i32), b: (i32, i32, i32)) -> Self {
        BoundingBox {
            min: (a.0.min(b.0), a.1.min(b.1), a.2.min(b.2)),
            max: (a.0.max(b.0), a.1.max(b.1), a.2.max(b.2)),
        }
    }

    /// Box of `size` cells starting at `position`. `None` when a size component is
    /// not positive or the far corner leaves the `i32` range.
    pub fn from_position_and_size(position: (i32, i32, i32), size: (i32, i32, i32)) -> Option<Self> {
        let far = |p: i32, s: i32| if s >= 1 { p.checked_add(s - 1) } else { None };
        Some(BoundingBox {
            min: position,
            max: (
                far(position.0, size.0)?,
                far(position.1, size.1)?,
                far(position.2, size.2)?,
            ),
        })
    }

    pub fn point(p: (i32, i32, i32)) -> Self {
        BoundingBox { min: p, max: p }
    }

    pub fn to_position_and_size(&self) -> ((i32, i32, i32), (i32, i32, i32)) {
        (self.min, self.get_dimensions())
    }

    pub fn is_valid(&self) -> bool {
        self.min.0 <= self.max.0 && self.min.1 <= self.max.1 && self.min.2 <= self.max.2
    }

    pub fn is_unit(&self) -> bool {
        self.min == self.max
    }

    pub fn get_dimensions(&self) -> (i32, i32, i32) {
        (
            self.max.0 - self.min.0 + 1,
            self.max.1 - self.min.1 + 1,
            self.max.2 - self.min.2 + 1,
        )
    }

    pub fn volume(&self) -> u64 {
        if !self.is_valid() {
            return 0;
        }
        let (w, h, l) = self.get_dimensions();
        w as u64 * h as u64 * l as u64
    }

    #[inline]
    pub fn contains(&self, (x, y, z): (i32, i32, i32)) -> bool {
        x >= self.min.0
            && x <= self.max.0
            && y >= self.min.1
            && y <= self.max.1
            && z >= self.min.2
            && z <= self.max.2
    }

    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.0 <= other.max.0
            && self.max.0 >= other.min.0
            && self.min.1 <= other.max.1
            && self.max.1 >= other.min.1
            && self.min.2 <= other.max.2
            && self.max.2 >= other.min.2
    }

    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let result = BoundingBox {
            min: (
                self.min.0.max(other.min.0),
                self.min.1.max(other.min.1),
                self.min.2.max(other.min.2),
            ),
            max: (
                self.max.0.min(other.max.0),
                self.max.1.min(other.max.1),
                self.max.2.min(other.max.2),
            ),
        };
        result.is_valid().then_some(result)
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: (
                self.min.0.min(other.min.0),
                self.min.1.min(other.min.1),
                self.min.2.min(other.min.2),
            ),
            max: (
                self.max.0.max(other.max.0),
                self.max.1.max(other.max.1),
                self.max.2.max(other.max.2),
            ),
        }
    }

    pub fn include(&mut self, p: (i32, i32, i32)) {
        self.min = (self.min.0.min(p.0), self.min.1.min(p.1), self.min.2.min(p.2));
        self.max = (self.max.0.max(p.0), self.max.1.max(p.1), self.max.2.max(p.2));
    }

    /// Translated copy, or `None` if a corner would leave the `i32` range.
    pub fn shifted(&self, dx: i32, dy: i32, dz: i32) -> Option<BoundingBox> {
        let shift = |(x, y, z): (i32, i32, i32)| {
            Some((x.checked_add(dx)?, y.checked_add(dy)?, z.checked_add(dz)?))
        };
        Some(BoundingBox {
            min: shift(self.min)?,
            max: shift(self.max)?,
        })
    }

    #[inline]
    pub fn coords_to_index(&self, x: i32, y: i32, z: i32) -> usize {
        let (w, _, l) = self.get_dimensions();
        let dx = x - self.min.0;
        let dy = y - self.min.1;
        let dz = z - self.min.2;
        (dx as usize) + (dz as usize) * (w as usize) + (dy as usize) * (w as usize) * (l as usize)
    }

    #[inline]
    pub fn index_to_coords(&self, index: usize) -> (i32, i32, i32) {
        let (w, _, l) = self.get_dimensions();
        let w = w as usize;
        let l = l as usize;
        let dx = (index % w) as i32;
        let dz = ((index / w) % l) as i32;
        let dy = (index / (w * l)) as i32;
        (self.min.0 + dx, self.min.1 + dy, self.min.2 + dz)
    }

    /// Every lattice point of the box in canonical order (x fastest, then y, then z).
    pub fn iter_points(&self) -> impl Iterator<Item = (i32, i32, i32)> {
        let b = *self;
        (b.min.2..=b.max.2).flat_map(move |z| {
            (b.min.1..=b.max.1).flat_map(move |y| (b.min.0..=b.max.0).map(move |x| (x, y, z)))
        })
    }
}
