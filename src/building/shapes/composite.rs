use super::Shape;
use crate::bounding_box::BoundingBox;
use crate::building::enums::ShapeEnum;

#[derive(Debug, Clone)]
pub struct Union {
    pub a: Box<ShapeEnum>,
    pub b: Box<ShapeEnum>,
}

impl Union {
    pub fn new(a: ShapeEnum, b: ShapeEnum) -> Self {
        Self {
            a: Box::new(a),
            b: Box::new(b),
        }
    }
}

impl Shape for Union {
    fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        self.a.contains(x, y, z) || self.b.contains(x, y, z)
    }

    fn bounds(&self) -> Option<BoundingBox> {
        match (self.a.bounds(), self.b.bounds()) {
            (Some(a), Some(b)) => Some(a.union(&b)),
            (a, b) => a.or(b),
        }
    }

    fn normal_at(&self, x: i32, y: i32, z: i32) -> (f64, f64, f64) {
        if self.a.contains(x, y, z) {
            self.a.normal_at(x, y, z)
        } else {
            self.b.normal_at(x, y, z)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Intersection {
    pub a: Box<ShapeEnum>,
    pub b: Box<ShapeEnum>,
}

impl Intersection {
    pub fn new(a: ShapeEnum, b: ShapeEnum) -> Self {
        Self {
            a: Box::new(a),
            b: Box::new(b),
        }
    }
}

impl Shape for Intersection {
    fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        self.a.contains(x, y, z) && self.b.contains(x, y, z)
    }

    fn bounds(&self) -> Option<BoundingBox> {
        self.a.bounds()?.intersection(&self.b.bounds()?)
    }

    fn normal_at(&self, x: i32, y: i32, z: i32) -> (f64, f64, f64) {
        self.a.normal_at(x, y, z)
    }
}

/// Cells of `a` that are not in `b`.
#[derive(Debug, Clone)]
pub struct Difference {
    pub a: Box<ShapeEnum>,
    pub b: Box<ShapeEnum>,
}

impl Difference {
    pub fn new(a: ShapeEnum, b: ShapeEnum) -> Self {
        Self {
            a: Box::new(a),
            b: Box::new(b),
        }
    }
}

impl Shape for Difference {
    fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        self.a.contains(x, y, z) && !self.b.contains(x, y, z)
    }

    fn bounds(&self) -> Option<BoundingBox> {
        self.a.bounds()
    }

    fn normal_at(&self, x: i32, y: i32, z: i32) -> (f64, f64, f64) {
        // Faces carved by `b` point back into it.
        let (nx, ny, nz) = self.b.normal_at(x, y, z);
        let touches_b = [(1, 0, 0), (-1, 0, 0), (0, 1, 0), (0, -1, 0), (0, 0, 1), (0, 0, -1)]
            .iter()
            .any(|&(dx, dy, dz)| {
                self.b
                    .contains(x.saturating_add(dx), y.saturating_add(dy), z.saturating_add(dz))
            });
        if touches_b {
            (-nx, -ny, -nz)
        } else {
            self.a.normal_at(x, y, z)
        }
    }
}
