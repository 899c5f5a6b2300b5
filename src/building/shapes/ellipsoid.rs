use super::{lattice_bounds, normalized, Shape};
use crate::bounding_box::BoundingBox;
use crate::error::{Result, SchematicError};

#[derive(Debug, Clone)]
pub struct Ellipsoid {
    pub center: (i32, i32, i32),
    pub radii: (f64, f64, f64),
}

impl Ellipsoid {
    pub fn new(center: (i32, i32, i32), radii: (f64, f64, f64)) -> Result<Self> {
        let valid = |r: f64| r > 0.0 && r.is_finite();
        if !(valid(radii.0) && valid(radii.1) && valid(radii.2)) {
            return Err(SchematicError::invalid(format!("ellipsoid radii must be positive, got {:?}", radii)));
        }
        Ok(Self { center, radii })
    }

    fn offset(&self, x: i32, y: i32, z: i32) -> (f64, f64, f64) {
        (
            x as f64 - self.center.0 as f64,
            y as f64 - self.center.1 as f64,
            z as f64 - self.center.2 as f64,
        )
    }
}

impl Shape for Ellipsoid {
    fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        let (dx, dy, dz) = self.offset(x, y, z);
        let (nx, ny, nz) = (dx / self.radii.0, dy / self.radii.1, dz / self.radii.2);
        nx * nx + ny * ny + nz * nz <= 1.0
    }

    fn bounds(&self) -> Option<BoundingBox> {
        let c = (self.center.0 as f64, self.center.1 as f64, self.center.2 as f64);
        let (rx, ry, rz) = (self.radii.0.floor(), self.radii.1.floor(), self.radii.2.floor());
        lattice_bounds((c.0 - rx, c.1 - ry, c.2 - rz), (c.0 + rx, c.1 + ry, c.2 + rz))
    }

    fn normal_at(&self, x: i32, y: i32, z: i32) -> (f64, f64, f64) {
        let (dx, dy, dz) = self.offset(x, y, z);
        let gradient = (
            dx / (self.radii.0 * self.radii.0),
            dy / (self.radii.1 * self.radii.1),
            dz / (self.radii.2 * self.radii.2),
        );
        normalized(gradient).unwrap_or((0.0, 1.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipsoid() {
        let e = Ellipsoid::new((0, 0, 0), (3.0, 1.0, 1.0)).unwrap();
        assert!(e.contains(3, 0, 0));
        assert!(!e.contains(0, 2, 0));
        assert!(!e.contains(3, 1, 0));
        let b = e.bounds().unwrap();
        assert_eq!((b.min, b.max), ((-3, -1, -1), (3, 1, 1)));
        assert_eq!(e.normal_at(0, 1, 0), (0.0, 1.0, 0.0));
        assert_eq!(e.normal_at(-3, 0, 0), (-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_degenerate_radii() {
        assert!(Ellipsoid::new((0, 0, 0), (0.0, 1.0, 1.0)).is_err());
        assert!(Ellipsoid::new((0, 0, 0), (1.0, -2.0, 1.0)).is_err());
        assert!(Ellipsoid::new((0, 0, 0), (1.0, 1.0, f64::NAN)).is_err());
    }
}
