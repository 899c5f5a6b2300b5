use super::Shape;
use crate::bounding_box::BoundingBox;

#[derive(Debug, Clone)]
pub struct Cuboid {
    pub min: (i32, i32, i32),
    pub max: (i32, i32, i32),
}

impl Cuboid {
    pub fn new(p1: (i32, i32, i32), p2: (i32, i32, i32)) -> Self {
        let b = BoundingBox::from_corners(p1, p2);
        Self { min: b.min, max: b.max }
    }
}

impl Shape for Cuboid {
    fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= self.min.0
            && x <= self.max.0
            && y >= self.min.1
            && y <= self.max.1
            && z >= self.min.2
            && z <= self.max.2
    }

    fn bounds(&self) -> Option<BoundingBox> {
        Some(BoundingBox::new(self.min, self.max))
    }

    /// Outward normal of the nearest face. Ties go +y, -y, +x, -x, +z, -z.
    fn normal_at(&self, x: i32, y: i32, z: i32) -> (f64, f64, f64) {
        let faces = [
            (self.max.1 as i64 - y as i64, (0.0, 1.0, 0.0)),
            (y as i64 - self.min.1 as i64, (0.0, -1.0, 0.0)),
            (self.max.0 as i64 - x as i64, (1.0, 0.0, 0.0)),
            (x as i64 - self.min.0 as i64, (-1.0, 0.0, 0.0)),
            (self.max.2 as i64 - z as i64, (0.0, 0.0, 1.0)),
            (z as i64 - self.min.2 as i64, (0.0, 0.0, -1.0)),
        ];
        let mut best = faces[0];
        for face in &faces[1..] {
            if face.0 < best.0 {
                best = *face;
            }
        }
        best.1
    }
}
