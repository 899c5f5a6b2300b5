use super::Shape;
use crate::bounding_box::BoundingBox;
use crate::building::enums::ShapeEnum;

/// The shell of `inner`: member cells with some face-direction neighbour
/// within `thickness` steps lying outside the shape.
#[derive(Debug, Clone)]
pub struct Hollow {
    pub inner: Box<ShapeEnum>,
    pub thickness: u32,
}

impl Hollow {
    pub fn new(inner: ShapeEnum, thickness: u32) -> Self {
        Self {
            inner: Box::new(inner),
            thickness,
        }
    }
}

impl Shape for Hollow {
    fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        if !self.inner.contains(x, y, z) {
            return false;
        }
        let t = self.thickness.min(i32::MAX as u32) as i32;
        for d in 1..=t {
            if !self.inner.contains(x.saturating_add(d), y, z)
                || !self.inner.contains(x.saturating_sub(d), y, z)
                || !self.inner.contains(x, y.saturating_add(d), z)
                || !self.inner.contains(x, y.saturating_sub(d), z)
                || !self.inner.contains(x, y, z.saturating_add(d))
                || !self.inner.contains(x, y, z.saturating_sub(d))
            {
                return true;
            }
        }
        false
    }

    fn bounds(&self) -> Option<BoundingBox> {
        if self.thickness == 0 {
            return None;
        }
        self.inner.bounds()
    }

    fn normal_at(&self, x: i32, y: i32, z: i32) -> (f64, f64, f64) {
        self.inner.normal_at(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::shapes::Cuboid;

    #[test]
    fn test_hollow_cuboid() {
        let shell = Hollow::new(ShapeEnum::Cuboid(Cuboid::new((0, 0, 0), (4, 4, 4))), 1);
        assert_eq!(shell.points().len(), 125 - 27);
        assert!(!shell.contains(2, 2, 2));
        assert!(shell.contains(0, 2, 2));

        let thick = Hollow::new(ShapeEnum::Cuboid(Cuboid::new((0, 0, 0), (4, 4, 4))), 2);
        assert_eq!(thick.points().len(), 125 - 1);

        let empty = Hollow::new(ShapeEnum::Cuboid(Cuboid::new((0, 0, 0), (4, 4, 4))), 0);
        assert!(empty.bounds().is_none());
        assert!(empty.points().is_empty());
    }
}
